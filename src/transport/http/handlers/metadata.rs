use crate::transport::http::handlers::common::json_422;
use crate::transport::http::types::{AppState, ErrorResponse, ExtractMetadataResponse, FilePathRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/extract-metadata",
    request_body = FilePathRequest,
    responses(
        (status = 200, description = "Metadata inferred and stored", body = ExtractMetadataResponse),
        (status = 400, description = "File path is required", body = ErrorResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ErrorResponse),
        (status = 500, description = "Download, language model or database failure", body = ErrorResponse),
        (status = 502, description = "Model reply unusable (strict parsing only)", body = ErrorResponse)
    )
)]
pub async fn extract_metadata_handler(
    State(state): State<AppState>,
    request: Result<Json<FilePathRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"filePath\": \"...\"}"),
    };
    let file_path = request.file_path.unwrap_or_default();

    match state.book_service.extract_metadata(&file_path).await {
        Ok(metadata) => (
            StatusCode::OK,
            Json(ExtractMetadataResponse {
                success: true,
                metadata,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
