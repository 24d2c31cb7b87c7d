//! In-process catalog used by development runs and tests.

use crate::domain::model::{Book, BookMetadata, ProcessingProgress, ProgressStatus, Question};
use crate::storage::catalog::{Catalog, ReportUpdate};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    books: Vec<Book>,
    progress: Vec<ProcessingProgress>,
    questions: Vec<Question>,
    next_book_id: i64,
    next_progress_id: i64,
    next_question_id: i64,
}

impl Tables {
    fn insert_book(&mut self, file_path: &str) -> anyhow::Result<Book> {
        if file_path.is_empty() {
            return Err(anyhow::anyhow!("file_path must not be empty"));
        }
        if self.books.iter().any(|b| b.file_path == file_path) {
            return Err(anyhow::anyhow!(
                "duplicate key value violates unique constraint (file_path)=({})",
                file_path
            ));
        }
        self.next_book_id += 1;
        let book = Book {
            id: self.next_book_id,
            file_path: file_path.to_string(),
            grade: None,
            subject: None,
            semester: None,
            created_at: Utc::now(),
        };
        self.books.push(book.clone());
        Ok(book)
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    tables: Mutex<Tables>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_books(&self) -> anyhow::Result<Vec<Book>> {
        let tables = self.tables.lock().await;
        let mut books = tables.books.clone();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(books)
    }

    async fn list_file_paths(&self) -> anyhow::Result<Vec<String>> {
        let tables = self.tables.lock().await;
        Ok(tables.books.iter().map(|b| b.file_path.clone()).collect())
    }

    async fn insert_books(&self, file_paths: &[String]) -> anyhow::Result<Vec<Book>> {
        let mut tables = self.tables.lock().await;

        // Validate the whole batch before touching the table.
        for (idx, path) in file_paths.iter().enumerate() {
            if path.is_empty() {
                return Err(anyhow::anyhow!("file_path must not be empty"));
            }
            let repeated = file_paths[..idx].contains(path);
            if repeated || tables.books.iter().any(|b| &b.file_path == path) {
                return Err(anyhow::anyhow!(
                    "duplicate key value violates unique constraint (file_path)=({})",
                    path
                ));
            }
        }

        let mut inserted = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            inserted.push(tables.insert_book(path)?);
        }
        Ok(inserted)
    }

    async fn book_by_path(&self, file_path: &str) -> anyhow::Result<Option<Book>> {
        let tables = self.tables.lock().await;
        Ok(tables.books.iter().find(|b| b.file_path == file_path).cloned())
    }

    async fn book_by_id(&self, id: i64) -> anyhow::Result<Option<Book>> {
        let tables = self.tables.lock().await;
        Ok(tables.books.iter().find(|b| b.id == id).cloned())
    }

    async fn save_metadata(&self, file_path: &str, metadata: &BookMetadata) -> anyhow::Result<Book> {
        let mut tables = self.tables.lock().await;
        if !tables.books.iter().any(|b| b.file_path == file_path) {
            tables.insert_book(file_path)?;
        }
        let book = tables
            .books
            .iter_mut()
            .find(|b| b.file_path == file_path)
            .ok_or_else(|| anyhow::anyhow!("book '{}' vanished during update", file_path))?;
        book.grade = Some(metadata.grade.clone());
        book.subject = Some(metadata.subject.clone());
        book.semester = Some(metadata.semester.clone());
        Ok(book.clone())
    }

    async fn list_progress(&self) -> anyhow::Result<Vec<ProcessingProgress>> {
        Ok(self.tables.lock().await.progress.clone())
    }

    async fn progress_by_path(&self, file_path: &str) -> anyhow::Result<Option<ProcessingProgress>> {
        let tables = self.tables.lock().await;
        Ok(tables.progress.iter().find(|p| p.file_path == file_path).cloned())
    }

    async fn ensure_progress(&self, file_path: &str) -> anyhow::Result<ProcessingProgress> {
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables.progress.iter().find(|p| p.file_path == file_path) {
            return Ok(existing.clone());
        }
        tables.next_progress_id += 1;
        let row = ProcessingProgress {
            id: tables.next_progress_id,
            file_path: file_path.to_string(),
            status: ProgressStatus::NotStarted,
            last_processed_page: 0,
            questions_generated: 0,
            created_at: Utc::now(),
        };
        tables.progress.push(row.clone());
        Ok(row)
    }

    async fn set_status(&self, file_path: &str, status: ProgressStatus) -> anyhow::Result<u64> {
        let mut tables = self.tables.lock().await;
        let mut touched = 0;
        for row in tables.progress.iter_mut().filter(|p| p.file_path == file_path) {
            row.status = status;
            touched += 1;
        }
        Ok(touched)
    }

    async fn apply_report(&self, update: ReportUpdate<'_>) -> anyhow::Result<Option<ProcessingProgress>> {
        let mut guard = self.tables.lock().await;
        let tables = &mut *guard;

        let Some(row) = tables
            .progress
            .iter_mut()
            .find(|p| p.file_path == update.file_path && p.status.accepts_reports())
        else {
            return Ok(None);
        };

        let added = i32::try_from(update.questions.len())?;
        let questions_generated = row
            .questions_generated
            .checked_add(added)
            .ok_or_else(|| anyhow::anyhow!("questions_generated out of range for '{}'", update.file_path))?;

        row.last_processed_page = update.last_processed_page;
        row.questions_generated = questions_generated;
        if update.completed {
            row.status = ProgressStatus::Completed;
        }
        let updated = row.clone();

        let now = Utc::now();
        for q in update.questions {
            tables.next_question_id += 1;
            tables
                .questions
                .push(q.clone().into_question(tables.next_question_id, update.book_id, now));
        }

        Ok(Some(updated))
    }

    async fn questions_for_book(&self, book_id: i64) -> anyhow::Result<Vec<Question>> {
        let tables = self.tables.lock().await;
        let mut questions: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.book_id == book_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.question_number, q.id));
        Ok(questions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DifficultyLevel, NewQuestion};

    fn new_question(number: i32) -> NewQuestion {
        NewQuestion {
            question_number: number,
            question_text: format!("Question {}", number),
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
    async fn duplicate_batches_insert_nothing() {
        let catalog = MemoryCatalog::new();
        catalog.insert_books(&["a.pdf".to_string()]).await.unwrap();

        let err = catalog
            .insert_books(&["b.pdf".to_string(), "a.pdf".to_string()])
            .await;
        assert!(err.is_err());
        assert_eq!(catalog.list_file_paths().await.unwrap(), vec!["a.pdf"]);
    }

    #[tokio::test]
    async fn save_metadata_registers_unknown_books() {
        let catalog = MemoryCatalog::new();
        let meta = BookMetadata {
            grade: "5".into(),
            subject: "Art".into(),
            semester: "02".into(),
        };
        let book = catalog.save_metadata("art.pdf", &meta).await.unwrap();
        assert_eq!(book.metadata(), Some(meta));
        assert_eq!(catalog.list_books().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ensure_progress_is_idempotent() {
        let catalog = MemoryCatalog::new();
        let first = catalog.ensure_progress("a.pdf").await.unwrap();
        catalog.set_status("a.pdf", ProgressStatus::Processing).await.unwrap();
        let second = catalog.ensure_progress("a.pdf").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, ProgressStatus::Processing);
        assert_eq!(catalog.list_progress().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reports_require_processing_status() {
        let catalog = MemoryCatalog::new();
        catalog.ensure_progress("a.pdf").await.unwrap();
        let questions = vec![new_question(2), new_question(1)];

        let update = ReportUpdate {
            file_path: "a.pdf",
            book_id: 1,
            last_processed_page: 3,
            questions: &questions,
            completed: false,
        };
        assert!(catalog.apply_report(update.clone()).await.unwrap().is_none());
        assert!(catalog.questions_for_book(1).await.unwrap().is_empty());

        catalog.set_status("a.pdf", ProgressStatus::Processing).await.unwrap();
        let progress = catalog.apply_report(update).await.unwrap().unwrap();
        assert_eq!(progress.last_processed_page, 3);
        assert_eq!(progress.questions_generated, 2);

        let numbers: Vec<i32> = catalog
            .questions_for_book(1)
            .await
            .unwrap()
            .iter()
            .map(|q| q.question_number)
            .collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
