use crate::app::{BookOverview, BookService};
use crate::domain::model::{
    Book, BookMetadata, DerivedStatus, DifficultyLevel, NewQuestion, ProcessingProgress,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Clone)]
pub struct AppState {
    pub book_service: Arc<BookService>,
}

/// Body shared by the extract, generate and cancel endpoints.
#[derive(Deserialize, Debug, ToSchema)]
pub struct FilePathRequest {
    /// Object name inside the `books` bucket.
    #[serde(rename = "filePath", default)]
    pub file_path: Option<String>,
}

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadQuery {
    /// Original file name; must end in `.pdf`.
    #[serde(default)]
    pub name: Option<String>,
}

/// One generated question as the worker sends it.
#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportedQuestion {
    pub question_number: i32,
    pub question_text: String,
    #[serde(rename = "choice1")]
    pub choice_1: String,
    #[serde(rename = "choice2")]
    pub choice_2: String,
    #[serde(rename = "choice3")]
    pub choice_3: String,
    #[serde(rename = "choice4")]
    pub choice_4: String,
    pub correct_choice: String,
    pub category: String,
    pub difficulty_level: DifficultyLevel,
}

impl From<ReportedQuestion> for NewQuestion {
    fn from(q: ReportedQuestion) -> Self {
        NewQuestion {
            question_number: q.question_number,
            question_text: q.question_text,
            choice_1: q.choice_1,
            choice_2: q.choice_2,
            choice_3: q.choice_3,
            choice_4: q.choice_4,
            correct_choice: q.correct_choice,
            category: q.category,
            difficulty_level: q.difficulty_level,
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReportRequest {
    pub file_path: String,
    pub last_processed_page: i32,
    /// Questions generated since the previous report.
    #[serde(default)]
    pub questions: Vec<ReportedQuestion>,
    /// Marks the book as fully processed.
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub success: bool,
    pub message: String,
    pub new_books_count: usize,
    pub total_books_count: usize,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ExtractMetadataResponse {
    pub success: bool,
    pub metadata: BookMetadata,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsResponse {
    pub success: bool,
    pub message: String,
    pub book_id: i64,
    pub start_page: i32,
    /// Two-digit difficulty code derived from the book's grade.
    pub difficulty_level: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub success: bool,
    pub file_name: String,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub file_path: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ProgressResponse {
    pub success: bool,
    pub progress: ProcessingProgress,
}

/// A book row with its progress and dashboard status.
#[derive(Serialize, Debug, ToSchema)]
pub struct BookEntry {
    #[serde(flatten)]
    pub book: Book,
    pub progress: Option<ProcessingProgress>,
    pub status: DerivedStatus,
    #[serde(rename = "hasMetadata")]
    pub has_metadata: bool,
}

impl From<BookOverview> for BookEntry {
    fn from(overview: BookOverview) -> Self {
        let has_metadata = overview.book.has_metadata();
        Self {
            book: overview.book,
            progress: overview.progress,
            status: overview.status,
            has_metadata,
        }
    }
}

#[derive(Serialize, Debug, ToSchema)]
pub struct BooksResponse {
    pub success: bool,
    pub books: Vec<BookEntry>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub status: String,
}
