use crate::transport::http::types::{AppState, ErrorResponse, ExportResponse};
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/books/{id}/export",
    params(
        ("id" = i64, Path, description = "Book id")
    ),
    responses(
        (status = 200, description = "CSV written to the output bucket", body = ExportResponse),
        (status = 400, description = "Book id is not an integer", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Database or storage failure", body = ErrorResponse)
    )
)]
pub async fn export_questions_handler(
    State(state): State<AppState>,
    book_id: Result<Path<i64>, PathRejection>,
) -> impl IntoResponse {
    let Path(book_id) = match book_id {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    success: false,
                    error: format!("Invalid book id: {}", e),
                    details: None,
                }),
            )
                .into_response();
        }
    };

    match state.book_service.export_csv(book_id).await {
        Ok(file_name) => (
            StatusCode::OK,
            Json(ExportResponse {
                success: true,
                file_name,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/exports/{file_name}",
    params(
        ("file_name" = String, Path, description = "Export file name, e.g. Grade3_Math_Semester01_Questions.csv")
    ),
    responses(
        (status = 200, description = "CSV contents", content_type = "text/csv", body = String),
        (status = 400, description = "Invalid file name", body = ErrorResponse),
        (status = 404, description = "Export not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
pub async fn download_export_handler(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> impl IntoResponse {
    match state.book_service.download_export(&file_name).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
