//! Catalog tables: `books_metadata`, `processing_progress`, `questions`.
//!
//! The tables are linked by value (`file_path`, `book_id`) without foreign keys, and
//! nothing couples them transactionally to the object store.

use crate::domain::model::{Book, BookMetadata, NewQuestion, ProcessingProgress, ProgressStatus, Question};
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCatalog;
pub use postgres::PgCatalog;

/// A worker report applied atomically to progress and questions.
#[derive(Debug, Clone)]
pub struct ReportUpdate<'a> {
    pub file_path: &'a str,
    pub book_id: i64,
    pub last_processed_page: i32,
    pub questions: &'a [NewQuestion],
    pub completed: bool,
}

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Cheap connectivity check.
    async fn ping(&self) -> anyhow::Result<()>;

    /// All books, newest first.
    async fn list_books(&self) -> anyhow::Result<Vec<Book>>;

    async fn list_file_paths(&self) -> anyhow::Result<Vec<String>>;

    /// Registers books with empty metadata, in the given order. The batch is
    /// all-or-nothing.
    async fn insert_books(&self, file_paths: &[String]) -> anyhow::Result<Vec<Book>>;

    async fn book_by_path(&self, file_path: &str) -> anyhow::Result<Option<Book>>;

    async fn book_by_id(&self, id: i64) -> anyhow::Result<Option<Book>>;

    /// Writes the metadata triple, registering the book first if it is unknown.
    async fn save_metadata(&self, file_path: &str, metadata: &BookMetadata) -> anyhow::Result<Book>;

    async fn list_progress(&self) -> anyhow::Result<Vec<ProcessingProgress>>;

    async fn progress_by_path(&self, file_path: &str) -> anyhow::Result<Option<ProcessingProgress>>;

    /// Returns the progress row, creating a `not_started` one if absent.
    async fn ensure_progress(&self, file_path: &str) -> anyhow::Result<ProcessingProgress>;

    /// Unconditionally sets the status. Returns the number of rows touched.
    async fn set_status(&self, file_path: &str, status: ProgressStatus) -> anyhow::Result<u64>;

    /// Applies a worker report only while the row is `processing`.
    ///
    /// Returns `Ok(None)` (and writes nothing) if the status changed underneath,
    /// e.g. a cancel landed between the caller's read and this write.
    async fn apply_report(&self, update: ReportUpdate<'_>) -> anyhow::Result<Option<ProcessingProgress>>;

    /// Questions of one book ordered by question number.
    async fn questions_for_book(&self, book_id: i64) -> anyhow::Result<Vec<Question>>;
}
