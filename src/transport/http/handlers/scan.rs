use crate::transport::http::types::{AppState, ErrorResponse, ScanResponse};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/scan",
    responses(
        (status = 200, description = "Storage reconciled with the metadata table", body = ScanResponse),
        (status = 500, description = "Storage or database failure", body = ErrorResponse)
    )
)]
pub async fn scan_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.book_service.scan().await {
        Ok(report) => (
            StatusCode::OK,
            Json(ScanResponse {
                success: true,
                message: "Basic scan completed".to_string(),
                new_books_count: report.new_books,
                total_books_count: report.total_books,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
