use crate::app::ProgressReport;
use crate::transport::http::handlers::common::json_422;
use crate::transport::http::types::{AppState, ErrorResponse, ProgressReportRequest, ProgressResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Worker callback. Rejected with 409 once the book has left `processing`.
#[utoipa::path(
    post,
    path = "/api/progress/report",
    request_body = ProgressReportRequest,
    responses(
        (status = 200, description = "Questions stored and counters advanced", body = ProgressResponse),
        (status = 400, description = "Missing file path or page went backwards", body = ErrorResponse),
        (status = 404, description = "Book metadata or processing progress not found", body = ErrorResponse),
        (status = 409, description = "Book is not being processed", body = ErrorResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn report_progress_handler(
    State(state): State<AppState>,
    request: Result<Json<ProgressReportRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(
                e,
                "{\"filePath\": \"...\", \"lastProcessedPage\": 0, \"questions\": [{\"questionNumber\": 1, ...}], \"completed\": false}",
            )
        }
    };

    let report = ProgressReport {
        file_path: request.file_path,
        last_processed_page: request.last_processed_page,
        questions: request.questions.into_iter().map(Into::into).collect(),
        completed: request.completed,
    };

    match state.book_service.report_progress(report).await {
        Ok(progress) => (
            StatusCode::OK,
            Json(ProgressResponse {
                success: true,
                progress,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
