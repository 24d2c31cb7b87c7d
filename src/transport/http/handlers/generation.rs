use crate::transport::http::handlers::common::json_422;
use crate::transport::http::types::{
    AppState, ErrorResponse, FilePathRequest, GenerateQuestionsResponse, SuccessResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/generate-questions",
    request_body = FilePathRequest,
    responses(
        (status = 200, description = "Book flagged as processing; worker handshake returned", body = GenerateQuestionsResponse),
        (status = 400, description = "File path is required", body = ErrorResponse),
        (status = 404, description = "Book metadata or processing progress not found", body = ErrorResponse),
        (status = 409, description = "Book already completed", body = ErrorResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn generate_questions_handler(
    State(state): State<AppState>,
    request: Result<Json<FilePathRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"filePath\": \"...\"}"),
    };
    let file_path = request.file_path.unwrap_or_default();

    match state.book_service.start_generation(&file_path).await {
        Ok(ticket) => (
            StatusCode::OK,
            Json(GenerateQuestionsResponse {
                success: true,
                message: "Question generation started".to_string(),
                book_id: ticket.book_id,
                start_page: ticket.start_page,
                difficulty_level: ticket.difficulty_code.to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/cancel",
    request_body = FilePathRequest,
    responses(
        (status = 200, description = "Status reset to not_started", body = SuccessResponse),
        (status = 400, description = "File path is required", body = ErrorResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn cancel_handler(
    State(state): State<AppState>,
    request: Result<Json<FilePathRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"filePath\": \"...\"}"),
    };
    let file_path = request.file_path.unwrap_or_default();

    match state.book_service.cancel(&file_path).await {
        Ok(()) => (StatusCode::OK, Json(SuccessResponse { success: true })).into_response(),
        Err(e) => e.into_response(),
    }
}
