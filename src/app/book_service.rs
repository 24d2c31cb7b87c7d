//! The book pipeline service.
//!
//! Sits between the HTTP handlers and the backends and runs each operation as a
//! straight sequence of awaited calls:
//! 1.  Reconciling the `books` bucket against the metadata table (scan).
//! 2.  Extracting grade/subject/semester through the language model.
//! 3.  The generation handshake, cancel, and worker progress reports.
//! 4.  Rendering and storing CSV exports.
//!
//! There is no locking across calls; the catalog's per-statement atomicity is all
//! the coordination there is.

use crate::domain::difficulty::difficulty_code_for;
use crate::domain::export::{export_file_name, render_questions_csv};
use crate::domain::metadata::{excerpt_or_placeholder, fallback_metadata, parse_metadata_reply, SYSTEM_PROMPT};
use crate::domain::model::{
    Book, BookMetadata, DerivedStatus, NewQuestion, ProcessingProgress, ProgressStatus, MAX_PAGE,
};
use crate::error::{PipelineError, PipelineResult};
use crate::infra::config::ExtractionOptions;
use crate::infra::llm::ChatModel;
use crate::storage::catalog::{Catalog, ReportUpdate};
use crate::storage::objects::{is_valid_object_name, Bucket, ObjectStore};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub new_books: usize,
    pub total_books: usize,
}

/// What the external worker needs to start generating questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub book_id: i64,
    pub start_page: i32,
    pub difficulty_code: &'static str,
}

/// A book joined with its progress row.
#[derive(Debug, Clone)]
pub struct BookOverview {
    pub book: Book,
    pub progress: Option<ProcessingProgress>,
    pub status: DerivedStatus,
}

/// A worker's progress report.
#[derive(Debug, Clone)]
pub struct ProgressReport {
    pub file_path: String,
    pub last_processed_page: i32,
    pub questions: Vec<NewQuestion>,
    pub completed: bool,
}

pub struct BookService {
    catalog: Arc<dyn Catalog>,
    objects: Arc<dyn ObjectStore>,
    llm: Option<Arc<dyn ChatModel>>,
    extraction: ExtractionOptions,
}

impl BookService {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        objects: Arc<dyn ObjectStore>,
        llm: Option<Arc<dyn ChatModel>>,
        extraction: ExtractionOptions,
    ) -> Self {
        Self {
            catalog,
            objects,
            llm,
            extraction,
        }
    }

    /// Creates both buckets; existing buckets count as success.
    pub async fn ensure_buckets(&self) -> PipelineResult<()> {
        for bucket in Bucket::ALL {
            self.objects
                .ensure_bucket(bucket)
                .await
                .map_err(PipelineError::upstream(format!(
                    "Failed to create bucket '{}'",
                    bucket.name()
                )))?;
        }
        Ok(())
    }

    /// Registers every PDF in the `books` bucket that the metadata table does not know.
    pub async fn scan(&self) -> PipelineResult<ScanReport> {
        self.ensure_buckets().await?;

        let stored = self
            .objects
            .list(Bucket::Books)
            .await
            .map_err(PipelineError::upstream("Failed to list storage files"))?;

        let existing = self
            .catalog
            .list_file_paths()
            .await
            .map_err(PipelineError::upstream("Failed to get existing books"))?;

        let known: HashSet<&str> = existing.iter().map(String::as_str).collect();
        let new_paths: Vec<String> = stored
            .into_iter()
            .filter(|name| name.to_lowercase().ends_with(".pdf"))
            .filter(|name| !known.contains(name.as_str()))
            .collect();

        if new_paths.is_empty() {
            debug!("scan: no new books");
        } else {
            self.catalog
                .insert_books(&new_paths)
                .await
                .map_err(PipelineError::upstream("Failed to insert new books"))?;
            info!(new_books = new_paths.len(), "scan: registered new books");
        }

        Ok(ScanReport {
            new_books: new_paths.len(),
            total_books: existing.len() + new_paths.len(),
        })
    }

    /// Infers grade/subject/semester for a stored PDF and writes them to its book row.
    pub async fn extract_metadata(&self, file_path: &str) -> PipelineResult<BookMetadata> {
        let file_path = require_file_path(file_path)?;

        let pdf = self
            .objects
            .get(Bucket::Books, file_path)
            .await
            .map_err(PipelineError::upstream("Failed to download file"))?
            .ok_or_else(|| PipelineError::Upstream {
                context: "Failed to download file".to_string(),
                source: anyhow::anyhow!("object '{}' not found in bucket 'books'", file_path),
            })?;

        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| PipelineError::Config("OpenAI API key not configured".to_string()))?;

        let pages = self.extraction.excerpt_pages;
        let max_chars = self.extraction.excerpt_max_chars;
        let excerpt = tokio::task::spawn_blocking(move || excerpt_or_placeholder(&pdf, pages, max_chars))
            .await
            .map_err(|e| PipelineError::Upstream {
                context: "Failed to read PDF text".to_string(),
                source: e.into(),
            })?;

        let reply = llm
            .complete(SYSTEM_PROMPT, &excerpt)
            .await
            .map_err(PipelineError::upstream("Failed to extract metadata from OpenAI"))?;

        let metadata = match parse_metadata_reply(&reply) {
            Ok(m) => m,
            Err(reason) if self.extraction.strict_parse => {
                return Err(PipelineError::Parse(format!(
                    "Model reply is not valid metadata: {}",
                    reason
                )));
            }
            Err(reason) => {
                warn!(file_path, %reason, "metadata reply unparsable, storing fallback metadata");
                fallback_metadata()
            }
        };

        self.catalog
            .save_metadata(file_path, &metadata)
            .await
            .map_err(PipelineError::upstream("Failed to update metadata"))?;

        self.catalog
            .ensure_progress(file_path)
            .await
            .map_err(PipelineError::upstream("Failed to initialize processing progress"))?;

        info!(
            file_path,
            grade = %metadata.grade,
            subject = %metadata.subject,
            semester = %metadata.semester,
            "metadata extracted"
        );
        Ok(metadata)
    }

    /// Flags a book as `processing` and returns the worker handshake.
    ///
    /// Nothing is generated here; an external worker picks up from `start_page`.
    pub async fn start_generation(&self, file_path: &str) -> PipelineResult<GenerationTicket> {
        let file_path = require_file_path(file_path)?;

        let book = self
            .catalog
            .book_by_path(file_path)
            .await
            .map_err(PipelineError::upstream("Failed to get book metadata"))?
            .ok_or_else(|| PipelineError::NotFound("Book metadata not found".to_string()))?;

        let progress = self
            .catalog
            .progress_by_path(file_path)
            .await
            .map_err(PipelineError::upstream("Failed to get processing progress"))?
            .ok_or_else(|| PipelineError::NotFound("Processing progress not found".to_string()))?;

        if !progress.status.can_start() {
            return Err(PipelineError::Conflict(format!(
                "Question generation already {} for '{}'",
                progress.status, file_path
            )));
        }

        let start_page = progress.next_page().ok_or_else(|| {
            PipelineError::Conflict(format!(
                "Book '{}' has no page left after {}",
                file_path, progress.last_processed_page
            ))
        })?;

        self.catalog
            .set_status(file_path, ProgressStatus::Processing)
            .await
            .map_err(PipelineError::upstream("Failed to update processing status"))?;

        let ticket = GenerationTicket {
            book_id: book.id,
            start_page,
            difficulty_code: difficulty_code_for(book.grade.as_deref()),
        };
        info!(
            file_path,
            book_id = ticket.book_id,
            start_page = ticket.start_page,
            difficulty = ticket.difficulty_code,
            "question generation started"
        );
        Ok(ticket)
    }

    /// Resets status to `not_started`, whatever it was.
    ///
    /// A running worker is not stopped; its next report is rejected instead.
    pub async fn cancel(&self, file_path: &str) -> PipelineResult<()> {
        let file_path = require_file_path(file_path)?;
        let touched = self
            .catalog
            .set_status(file_path, ProgressStatus::NotStarted)
            .await
            .map_err(PipelineError::upstream("Failed to cancel processing"))?;
        info!(file_path, rows = touched, "processing cancelled");
        Ok(())
    }

    /// Records a worker report: new questions plus advanced counters.
    pub async fn report_progress(&self, report: ProgressReport) -> PipelineResult<ProcessingProgress> {
        let file_path = require_file_path(&report.file_path)?;
        if !(0..=MAX_PAGE).contains(&report.last_processed_page) {
            return Err(PipelineError::Validation(format!(
                "lastProcessedPage must be between 0 and {}",
                MAX_PAGE
            )));
        }

        let book = self
            .catalog
            .book_by_path(file_path)
            .await
            .map_err(PipelineError::upstream("Failed to get book metadata"))?
            .ok_or_else(|| PipelineError::NotFound("Book metadata not found".to_string()))?;

        let progress = self
            .catalog
            .progress_by_path(file_path)
            .await
            .map_err(PipelineError::upstream("Failed to get processing progress"))?
            .ok_or_else(|| PipelineError::NotFound("Processing progress not found".to_string()))?;

        if !progress.status.accepts_reports() {
            return Err(not_processing(file_path, progress.status));
        }
        if report.last_processed_page < progress.last_processed_page {
            return Err(PipelineError::Validation(format!(
                "lastProcessedPage {} is behind the recorded page {}",
                report.last_processed_page, progress.last_processed_page
            )));
        }

        let updated = self
            .catalog
            .apply_report(ReportUpdate {
                file_path,
                book_id: book.id,
                last_processed_page: report.last_processed_page,
                questions: &report.questions,
                completed: report.completed,
            })
            .await
            .map_err(PipelineError::upstream("Failed to record progress"))?;

        // Status moved between the read above and the conditional write.
        let updated = updated.ok_or_else(|| {
            PipelineError::Conflict(format!(
                "Book '{}' stopped processing before the report was recorded",
                file_path
            ))
        })?;

        info!(
            file_path,
            page = updated.last_processed_page,
            questions = updated.questions_generated,
            status = %updated.status,
            "progress recorded"
        );
        Ok(updated)
    }

    /// Renders a book's questions to CSV and stores it in `output`. Returns the file name.
    pub async fn export_csv(&self, book_id: i64) -> PipelineResult<String> {
        let book = self
            .catalog
            .book_by_id(book_id)
            .await
            .map_err(PipelineError::upstream("Failed to fetch book metadata"))?
            .ok_or_else(|| PipelineError::NotFound(format!("Book {} not found", book_id)))?;

        let questions = self
            .catalog
            .questions_for_book(book_id)
            .await
            .map_err(PipelineError::upstream("Failed to fetch questions"))?;

        let csv = render_questions_csv(&questions)
            .map_err(PipelineError::upstream("Failed to render CSV"))?;
        let file_name = export_file_name(
            book.grade.as_deref(),
            book.subject.as_deref(),
            book.semester.as_deref(),
        );

        check_size(Bucket::Output, csv.len())?;
        self.objects
            .ensure_bucket(Bucket::Output)
            .await
            .map_err(PipelineError::upstream("Failed to create bucket 'output'"))?;
        self.objects
            .put(Bucket::Output, &file_name, csv.as_bytes())
            .await
            .map_err(PipelineError::upstream("Failed to upload CSV"))?;

        info!(book_id, file_name = %file_name, questions = questions.len(), "questions exported");
        Ok(file_name)
    }

    /// Reads back a stored export.
    pub async fn download_export(&self, file_name: &str) -> PipelineResult<Vec<u8>> {
        if !is_valid_object_name(file_name) {
            return Err(PipelineError::Validation(format!(
                "Invalid export file name '{}'",
                file_name
            )));
        }
        self.objects
            .get(Bucket::Output, file_name)
            .await
            .map_err(PipelineError::upstream("Failed to download export"))?
            .ok_or_else(|| PipelineError::NotFound(format!("Export '{}' not found", file_name)))
    }

    /// Stores an uploaded PDF as `{unix_millis}_{name}` and registers it.
    pub async fn upload_book(&self, name: &str, data: &[u8]) -> PipelineResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PipelineError::Validation("File name is required".to_string()));
        }
        if !name.to_lowercase().ends_with(".pdf") {
            return Err(PipelineError::Validation("Only PDF files can be uploaded".to_string()));
        }
        if !is_valid_object_name(name) {
            return Err(PipelineError::Validation(format!("Invalid file name '{}'", name)));
        }
        check_size(Bucket::Books, data.len())?;

        let file_path = format!("{}_{}", Utc::now().timestamp_millis(), name);

        self.ensure_buckets().await?;
        self.objects
            .put(Bucket::Books, &file_path, data)
            .await
            .map_err(PipelineError::upstream("Failed to upload book"))?;
        self.catalog
            .insert_books(std::slice::from_ref(&file_path))
            .await
            .map_err(PipelineError::upstream("Failed to register uploaded book"))?;

        info!(file_path = %file_path, size = data.len(), "book uploaded");
        Ok(file_path)
    }

    /// Every book, newest first, with its progress and dashboard status.
    pub async fn list_books(&self) -> PipelineResult<Vec<BookOverview>> {
        let books = self
            .catalog
            .list_books()
            .await
            .map_err(PipelineError::upstream("Failed to fetch books"))?;
        let progress = self
            .catalog
            .list_progress()
            .await
            .map_err(PipelineError::upstream("Failed to fetch progress"))?;

        Ok(books
            .into_iter()
            .map(|book| {
                let progress = progress.iter().find(|p| p.file_path == book.file_path).cloned();
                let status = DerivedStatus::from_progress(progress.as_ref());
                BookOverview {
                    book,
                    progress,
                    status,
                }
            })
            .collect())
    }

    /// Pings the catalog and the object store.
    pub async fn health(&self) -> anyhow::Result<()> {
        self.catalog.ping().await?;
        self.objects.list(Bucket::Books).await?;
        Ok(())
    }
}

fn require_file_path(file_path: &str) -> PipelineResult<&str> {
    let trimmed = file_path.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::Validation("File path is required".to_string()));
    }
    Ok(trimmed)
}

fn check_size(bucket: Bucket, size: usize) -> PipelineResult<()> {
    if size > bucket.size_limit() {
        return Err(PipelineError::PayloadTooLarge {
            bucket: bucket.name(),
            limit: bucket.size_limit(),
            size,
        });
    }
    Ok(())
}

fn not_processing(file_path: &str, status: ProgressStatus) -> PipelineError {
    PipelineError::Conflict(format!(
        "Book '{}' is not being processed (status: {})",
        file_path, status
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DifficultyLevel;
    use crate::storage::catalog::MemoryCatalog;
    use crate::storage::objects::MemoryObjectStore;
    use async_trait::async_trait;

    struct CannedModel(&'static str);

    #[async_trait]
    impl ChatModel for CannedModel {
        async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Fixture {
        service: BookService,
        catalog: Arc<MemoryCatalog>,
        objects: Arc<MemoryObjectStore>,
    }

    fn fixture(reply: Option<&'static str>, strict_parse: bool) -> Fixture {
        let catalog = Arc::new(MemoryCatalog::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let llm = reply.map(|r| Arc::new(CannedModel(r)) as Arc<dyn ChatModel>);
        let service = BookService::new(
            catalog.clone(),
            objects.clone(),
            llm,
            ExtractionOptions {
                strict_parse,
                ..ExtractionOptions::default()
            },
        );
        Fixture {
            service,
            catalog,
            objects,
        }
    }

    /// Object store whose listing always fails.
    struct BrokenListing;

    #[async_trait]
    impl ObjectStore for BrokenListing {
        async fn ensure_bucket(&self, _bucket: Bucket) -> anyhow::Result<()> {
            Ok(())
        }

        async fn list(&self, bucket: Bucket) -> anyhow::Result<Vec<String>> {
            Err(anyhow::anyhow!("bucket '{}' unreachable", bucket.name()))
        }

        async fn get(&self, _bucket: Bucket, _name: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn put(&self, _bucket: Bucket, _name: &str, _data: &[u8]) -> anyhow::Result<()> {
            Ok(())
        }
    }

    /// Memory catalog that refuses every batch insert.
    struct RejectingInserts(MemoryCatalog);

    #[async_trait]
    impl Catalog for RejectingInserts {
        async fn ping(&self) -> anyhow::Result<()> {
            self.0.ping().await
        }

        async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
            self.0.list_books().await
        }

        async fn list_file_paths(&self) -> anyhow::Result<Vec<String>> {
            self.0.list_file_paths().await
        }

        async fn insert_books(&self, _file_paths: &[String]) -> anyhow::Result<Vec<Book>> {
            Err(anyhow::anyhow!("connection reset by peer"))
        }

        async fn book_by_path(&self, file_path: &str) -> anyhow::Result<Option<Book>> {
            self.0.book_by_path(file_path).await
        }

        async fn book_by_id(&self, id: i64) -> anyhow::Result<Option<Book>> {
            self.0.book_by_id(id).await
        }

        async fn save_metadata(&self, file_path: &str, metadata: &BookMetadata) -> anyhow::Result<Book> {
            self.0.save_metadata(file_path, metadata).await
        }

        async fn list_progress(&self) -> anyhow::Result<Vec<ProcessingProgress>> {
            self.0.list_progress().await
        }

        async fn progress_by_path(&self, file_path: &str) -> anyhow::Result<Option<ProcessingProgress>> {
            self.0.progress_by_path(file_path).await
        }

        async fn ensure_progress(&self, file_path: &str) -> anyhow::Result<ProcessingProgress> {
            self.0.ensure_progress(file_path).await
        }

        async fn set_status(&self, file_path: &str, status: ProgressStatus) -> anyhow::Result<u64> {
            self.0.set_status(file_path, status).await
        }

        async fn apply_report(&self, update: ReportUpdate<'_>) -> anyhow::Result<Option<ProcessingProgress>> {
            self.0.apply_report(update).await
        }

        async fn questions_for_book(&self, book_id: i64) -> anyhow::Result<Vec<crate::domain::model::Question>> {
            self.0.questions_for_book(book_id).await
        }
    }

    fn question(number: i32) -> NewQuestion {
        NewQuestion {
            question_number: number,
            question_text: format!("What is {} + {}?", number, number),
            choice_1: "1".into(),
            choice_2: "2".into(),
            choice_3: "3".into(),
            choice_4: "4".into(),
            correct_choice: "2".into(),
            category: "Arithmetic".into(),
            difficulty_level: DifficultyLevel::Easy,
        }
    }

    #[tokio::test]
    async fn scan_registers_only_new_pdfs_in_name_order() {
        let f = fixture(None, false);
        f.objects.put(Bucket::Books, "b.pdf", b"%PDF").await.unwrap();
        f.objects.put(Bucket::Books, "a.PDF", b"%PDF").await.unwrap();
        f.objects.put(Bucket::Books, "notes.txt", b"x").await.unwrap();

        let first = f.service.scan().await.unwrap();
        assert_eq!(first, ScanReport { new_books: 2, total_books: 2 });

        let mut books = f.catalog.list_books().await.unwrap();
        books.sort_by_key(|b| b.id);
        let paths: Vec<&str> = books.iter().map(|b| b.file_path.as_str()).collect();
        assert_eq!(paths, vec!["a.PDF", "b.pdf"]);
        assert!(books.iter().all(|b| !b.has_metadata()));

        let second = f.service.scan().await.unwrap();
        assert_eq!(second, ScanReport { new_books: 0, total_books: 2 });
    }

    #[tokio::test]
    async fn extraction_writes_metadata_and_initializes_progress() {
        let f = fixture(Some(r#"{"grade": 9, "subject": "Biology", "semester": "2"}"#), false);
        f.objects.put(Bucket::Books, "bio.pdf", b"not really a pdf").await.unwrap();

        let meta = f.service.extract_metadata("bio.pdf").await.unwrap();
        assert_eq!(meta.grade, "9");

        let book = f.catalog.book_by_path("bio.pdf").await.unwrap().unwrap();
        assert_eq!(book.subject.as_deref(), Some("Biology"));
        let progress = f.catalog.progress_by_path("bio.pdf").await.unwrap().unwrap();
        assert_eq!(progress.status, ProgressStatus::NotStarted);
        assert_eq!(progress.last_processed_page, 0);
    }

    #[tokio::test]
    async fn unparsable_reply_falls_back_unless_strict() {
        let lenient = fixture(Some("I could not find it"), false);
        lenient.objects.put(Bucket::Books, "x.pdf", b"x").await.unwrap();
        assert_eq!(
            lenient.service.extract_metadata("x.pdf").await.unwrap(),
            fallback_metadata()
        );

        let strict = fixture(Some("I could not find it"), true);
        strict.objects.put(Bucket::Books, "x.pdf", b"x").await.unwrap();
        let err = strict.service.extract_metadata("x.pdf").await.unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
        assert!(strict.catalog.book_by_path("x.pdf").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn extraction_errors() {
        let f = fixture(None, false);
        assert!(matches!(
            f.service.extract_metadata("  ").await,
            Err(PipelineError::Validation(_))
        ));
        assert!(matches!(
            f.service.extract_metadata("missing.pdf").await,
            Err(PipelineError::Upstream { .. })
        ));

        f.objects.put(Bucket::Books, "a.pdf", b"x").await.unwrap();
        assert!(matches!(
            f.service.extract_metadata("a.pdf").await,
            Err(PipelineError::Config(_))
        ));
    }

    #[tokio::test]
    async fn start_generation_without_metadata_row_mutates_nothing() {
        let f = fixture(None, false);
        f.catalog.ensure_progress("ghost.pdf").await.unwrap();

        let err = f.service.start_generation("ghost.pdf").await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
        let progress = f.catalog.progress_by_path("ghost.pdf").await.unwrap().unwrap();
        assert_eq!(progress.status, ProgressStatus::NotStarted);
    }

    #[tokio::test]
    async fn start_generation_hands_out_page_and_difficulty() {
        let f = fixture(None, false);
        let meta = BookMetadata {
            grade: "11".into(),
            subject: "Chemistry".into(),
            semester: "1".into(),
        };
        f.catalog.save_metadata("chem.pdf", &meta).await.unwrap();

        // Book row present, progress row absent.
        assert!(matches!(
            f.service.start_generation("chem.pdf").await,
            Err(PipelineError::NotFound(_))
        ));

        f.catalog.ensure_progress("chem.pdf").await.unwrap();
        let ticket = f.service.start_generation("chem.pdf").await.unwrap();
        assert_eq!(ticket.start_page, 1);
        assert_eq!(ticket.difficulty_code, "07");
        assert_eq!(
            f.catalog.progress_by_path("chem.pdf").await.unwrap().unwrap().status,
            ProgressStatus::Processing
        );
    }

    #[tokio::test]
    async fn cancel_always_resets_and_succeeds() {
        let f = fixture(None, false);
        f.catalog.ensure_progress("a.pdf").await.unwrap();

        f.service.cancel("a.pdf").await.unwrap();
        f.catalog.set_status("a.pdf", ProgressStatus::Completed).await.unwrap();
        f.service.cancel("a.pdf").await.unwrap();
        assert_eq!(
            f.catalog.progress_by_path("a.pdf").await.unwrap().unwrap().status,
            ProgressStatus::NotStarted
        );

        f.service.cancel("unknown.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn reports_advance_progress_until_cancelled() {
        let f = fixture(None, false);
        let meta = BookMetadata {
            grade: "4".into(),
            subject: "Math".into(),
            semester: "1".into(),
        };
        f.catalog.save_metadata("math.pdf", &meta).await.unwrap();
        f.catalog.ensure_progress("math.pdf").await.unwrap();
        f.service.start_generation("math.pdf").await.unwrap();

        let updated = f
            .service
            .report_progress(ProgressReport {
                file_path: "math.pdf".into(),
                last_processed_page: 2,
                questions: vec![question(1), question(2)],
                completed: false,
            })
            .await
            .unwrap();
        assert_eq!(updated.questions_generated, 2);
        assert_eq!(updated.last_processed_page, 2);

        let backwards = f
            .service
            .report_progress(ProgressReport {
                file_path: "math.pdf".into(),
                last_processed_page: 1,
                questions: vec![],
                completed: false,
            })
            .await;
        assert!(matches!(backwards, Err(PipelineError::Validation(_))));

        f.service.cancel("math.pdf").await.unwrap();
        let late = f
            .service
            .report_progress(ProgressReport {
                file_path: "math.pdf".into(),
                last_processed_page: 3,
                questions: vec![question(3)],
                completed: true,
            })
            .await;
        assert!(matches!(late, Err(PipelineError::Conflict(_))));
        assert_eq!(f.catalog.questions_for_book(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn completed_books_reject_a_new_start() {
        let f = fixture(None, false);
        let meta = BookMetadata {
            grade: "6".into(),
            subject: "Art".into(),
            semester: "2".into(),
        };
        f.catalog.save_metadata("art.pdf", &meta).await.unwrap();
        f.catalog.ensure_progress("art.pdf").await.unwrap();
        f.service.start_generation("art.pdf").await.unwrap();
        f.service
            .report_progress(ProgressReport {
                file_path: "art.pdf".into(),
                last_processed_page: 10,
                questions: vec![question(1)],
                completed: true,
            })
            .await
            .unwrap();

        assert!(matches!(
            f.service.start_generation("art.pdf").await,
            Err(PipelineError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn export_writes_named_csv_and_overwrites() {
        let f = fixture(None, false);
        let meta = BookMetadata {
            grade: "3rd".into(),
            subject: "Math!".into(),
            semester: "1/2".into(),
        };
        let book = f.catalog.save_metadata("m.pdf", &meta).await.unwrap();

        let name = f.service.export_csv(book.id).await.unwrap();
        assert_eq!(name, "Grade3rd_Math_Semester12_Questions.csv");
        let header_only = f.service.download_export(&name).await.unwrap();
        assert_eq!(String::from_utf8(header_only).unwrap().lines().count(), 1);

        f.catalog.ensure_progress("m.pdf").await.unwrap();
        f.catalog.set_status("m.pdf", ProgressStatus::Processing).await.unwrap();
        f.service
            .report_progress(ProgressReport {
                file_path: "m.pdf".into(),
                last_processed_page: 1,
                questions: vec![question(1)],
                completed: false,
            })
            .await
            .unwrap();

        assert_eq!(f.service.export_csv(book.id).await.unwrap(), name);
        let body = String::from_utf8(f.service.download_export(&name).await.unwrap()).unwrap();
        assert_eq!(body.lines().count(), 2);
        assert_eq!(f.objects.list(Bucket::Output).await.unwrap(), vec![name]);
    }

    #[tokio::test]
    async fn export_of_unknown_book_is_not_found() {
        let f = fixture(None, false);
        assert!(matches!(
            f.service.export_csv(42).await,
            Err(PipelineError::NotFound(_))
        ));
        assert!(f.objects.list(Bucket::Output).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_validates_and_registers() {
        let f = fixture(None, false);
        assert!(matches!(
            f.service.upload_book("notes.txt", b"x").await,
            Err(PipelineError::Validation(_))
        ));
        assert!(matches!(
            f.service.upload_book("../book.pdf", b"x").await,
            Err(PipelineError::Validation(_))
        ));

        let path = f.service.upload_book("Science Grade 5.pdf", b"%PDF").await.unwrap();
        assert!(path.ends_with("_Science Grade 5.pdf"));
        assert!(f.catalog.book_by_path(&path).await.unwrap().is_some());
        assert_eq!(f.objects.list(Bucket::Books).await.unwrap(), vec![path]);

        // Already registered at upload time, so scan finds nothing new.
        assert_eq!(f.service.scan().await.unwrap().new_books, 0);
    }

    #[tokio::test]
    async fn oversized_uploads_are_rejected() {
        let f = fixture(None, false);
        let big = vec![0u8; Bucket::Books.size_limit() + 1];
        assert!(matches!(
            f.service.upload_book("big.pdf", &big).await,
            Err(PipelineError::PayloadTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn listing_joins_progress() {
        let f = fixture(None, false);
        f.catalog
            .insert_books(&["one.pdf".to_string(), "two.pdf".to_string()])
            .await
            .unwrap();
        f.catalog.ensure_progress("two.pdf").await.unwrap();
        f.catalog.set_status("two.pdf", ProgressStatus::Processing).await.unwrap();

        let listing = f.service.list_books().await.unwrap();
        assert_eq!(listing.len(), 2);
        let one = listing.iter().find(|o| o.book.file_path == "one.pdf").unwrap();
        assert!(one.progress.is_none());
        assert_eq!(one.status.label, "Not started");
        let two = listing.iter().find(|o| o.book.file_path == "two.pdf").unwrap();
        assert_eq!(two.status.state, ProgressStatus::Processing);
    }

    #[tokio::test]
    async fn scan_aborts_when_listing_fails() {
        let catalog = Arc::new(MemoryCatalog::new());
        let service = BookService::new(
            catalog.clone(),
            Arc::new(BrokenListing),
            None,
            ExtractionOptions::default(),
        );

        let err = service.scan().await.unwrap_err();
        match &err {
            PipelineError::Upstream { context, .. } => assert_eq!(context, "Failed to list storage files"),
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert!(err.details().unwrap().contains("unreachable"));
        assert!(catalog.list_books().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scan_aborts_when_insert_fails() {
        let catalog = Arc::new(RejectingInserts(MemoryCatalog::new()));
        let objects = Arc::new(MemoryObjectStore::new());
        objects.put(Bucket::Books, "a.pdf", b"%PDF").await.unwrap();
        let service = BookService::new(catalog.clone(), objects, None, ExtractionOptions::default());

        let err = service.scan().await.unwrap_err();
        match &err {
            PipelineError::Upstream { context, .. } => assert_eq!(context, "Failed to insert new books"),
            other => panic!("expected upstream error, got {:?}", other),
        }
        assert!(catalog.list_file_paths().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_past_the_page_cap_are_rejected() {
        let f = fixture(None, false);
        let meta = BookMetadata {
            grade: "7".into(),
            subject: "History".into(),
            semester: "1".into(),
        };
        f.catalog.save_metadata("h.pdf", &meta).await.unwrap();
        f.catalog.ensure_progress("h.pdf").await.unwrap();
        f.service.start_generation("h.pdf").await.unwrap();

        let too_far = f
            .service
            .report_progress(ProgressReport {
                file_path: "h.pdf".into(),
                last_processed_page: i32::MAX,
                questions: vec![],
                completed: false,
            })
            .await;
        assert!(matches!(too_far, Err(PipelineError::Validation(_))));

        f.service
            .report_progress(ProgressReport {
                file_path: "h.pdf".into(),
                last_processed_page: MAX_PAGE,
                questions: vec![],
                completed: false,
            })
            .await
            .unwrap();
        f.service.cancel("h.pdf").await.unwrap();
        let ticket = f.service.start_generation("h.pdf").await.unwrap();
        assert_eq!(ticket.start_page, MAX_PAGE + 1);
    }

    #[tokio::test]
    async fn exhausted_page_counter_blocks_restart_without_mutation() {
        let f = fixture(None, false);
        let book = f
            .catalog
            .save_metadata(
                "long.pdf",
                &BookMetadata {
                    grade: "8".into(),
                    subject: "Geography".into(),
                    semester: "2".into(),
                },
            )
            .await
            .unwrap();
        f.catalog.ensure_progress("long.pdf").await.unwrap();
        f.catalog.set_status("long.pdf", ProgressStatus::Processing).await.unwrap();
        // Written straight to the catalog, as a row left by an older deployment would be.
        f.catalog
            .apply_report(ReportUpdate {
                file_path: "long.pdf",
                book_id: book.id,
                last_processed_page: i32::MAX,
                questions: &[],
                completed: false,
            })
            .await
            .unwrap();
        f.service.cancel("long.pdf").await.unwrap();

        let err = f.service.start_generation("long.pdf").await.unwrap_err();
        assert!(matches!(err, PipelineError::Conflict(_)));
        assert_eq!(
            f.catalog.progress_by_path("long.pdf").await.unwrap().unwrap().status,
            ProgressStatus::NotStarted
        );
    }
}
