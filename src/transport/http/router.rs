use crate::domain::model::{
    Book, BookMetadata, DerivedStatus, DifficultyLevel, ProcessingProgress, ProgressStatus,
};
use crate::storage::objects::Bucket;
use crate::transport::http::handlers::{books, export, generation, health, metadata, progress, scan};
use crate::transport::http::types::{
    AppState, BookEntry, BooksResponse, ErrorResponse, ExportResponse, ExtractMetadataResponse,
    FilePathRequest, GenerateQuestionsResponse, HealthResponse, ProgressReportRequest,
    ProgressResponse, ReportedQuestion, ScanResponse, SuccessResponse, UploadResponse,
};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        scan::scan_handler,
        metadata::extract_metadata_handler,
        generation::generate_questions_handler,
        generation::cancel_handler,
        progress::report_progress_handler,
        books::list_books_handler,
        books::upload_book_handler,
        export::export_questions_handler,
        export::download_export_handler
    ),
    components(schemas(
        Book,
        BookMetadata,
        ProcessingProgress,
        ProgressStatus,
        DerivedStatus,
        ReportedQuestion,
        DifficultyLevel,
        FilePathRequest,
        ProgressReportRequest,
        ErrorResponse,
        ScanResponse,
        ExtractMetadataResponse,
        GenerateQuestionsResponse,
        SuccessResponse,
        ExportResponse,
        UploadResponse,
        ProgressResponse,
        BookEntry,
        BooksResponse,
        HealthResponse
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/scan", post(scan::scan_handler))
        .route("/api/extract-metadata", post(metadata::extract_metadata_handler))
        .route("/api/generate-questions", post(generation::generate_questions_handler))
        .route("/api/cancel", post(generation::cancel_handler))
        .route("/api/progress/report", post(progress::report_progress_handler))
        .route("/api/books", get(books::list_books_handler))
        .route(
            "/api/books/upload",
            post(books::upload_book_handler)
                .layer(DefaultBodyLimit::max(Bucket::Books.size_limit())),
        )
        .route("/api/books/:id/export", post(export::export_questions_handler))
        .route("/api/exports/:file_name", get(export::download_export_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
