use crate::transport::http::types::{
    AppState, BookEntry, BooksResponse, ErrorResponse, UploadQuery, UploadResponse,
};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "All books, newest first, with progress and derived status", body = BooksResponse),
        (status = 500, description = "Database failure", body = ErrorResponse)
    )
)]
pub async fn list_books_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.book_service.list_books().await {
        Ok(books) => (
            StatusCode::OK,
            Json(BooksResponse {
                success: true,
                books: books.into_iter().map(BookEntry::from).collect(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/books/upload",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/pdf", description = "Raw PDF bytes"),
    responses(
        (status = 200, description = "Stored in the books bucket and registered", body = UploadResponse),
        (status = 400, description = "Missing or non-PDF file name", body = ErrorResponse),
        (status = 413, description = "Body exceeds the books bucket limit", body = ErrorResponse),
        (status = 500, description = "Storage or database failure", body = ErrorResponse)
    )
)]
pub async fn upload_book_handler(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    body: Result<Bytes, BytesRejection>,
) -> impl IntoResponse {
    // The body limit layer surfaces as a rejection here (413).
    let body = match body {
        Ok(b) => b,
        Err(e) => {
            let status = e.status();
            warn!(status = status.as_u16(), error = %e, "rejected upload body");
            return (
                status,
                Json(ErrorResponse {
                    success: false,
                    error: e.body_text(),
                    details: None,
                }),
            )
                .into_response();
        }
    };
    let name = query.name.unwrap_or_default();

    match state.book_service.upload_book(&name, &body).await {
        Ok(file_path) => (
            StatusCode::OK,
            Json(UploadResponse {
                success: true,
                file_path,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
