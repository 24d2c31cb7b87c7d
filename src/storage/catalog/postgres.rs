//! Postgres-backed catalog.

use crate::domain::model::{Book, BookMetadata, ProcessingProgress, ProgressStatus, Question};
use crate::storage::catalog::{Catalog, ReportUpdate};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::info;

const BOOK_COLUMNS: &str = "id, file_path, grade, subject, semester, created_at";
const PROGRESS_COLUMNS: &str =
    "id, file_path, status, last_processed_page, questions_generated, created_at";
const QUESTION_COLUMNS: &str = "id, book_id, question_number, question_text, choice_1, choice_2, \
     choice_3, choice_4, correct_choice, category, difficulty_level, created_at";

#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Connects and makes sure the catalog tables exist.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let catalog = Self { pool };
        catalog.create_tables().await?;
        Ok(catalog)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS books_metadata (
                id BIGSERIAL PRIMARY KEY,
                file_path TEXT NOT NULL UNIQUE CHECK (file_path <> ''),
                grade TEXT,
                subject TEXT,
                semester TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS processing_progress (
                id BIGSERIAL PRIMARY KEY,
                file_path TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'not_started'
                    CHECK (status IN ('not_started', 'processing', 'completed')),
                last_processed_page INTEGER NOT NULL DEFAULT 0 CHECK (last_processed_page >= 0),
                questions_generated INTEGER NOT NULL DEFAULT 0 CHECK (questions_generated >= 0),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS questions (
                id BIGSERIAL PRIMARY KEY,
                book_id BIGINT NOT NULL,
                question_number INTEGER NOT NULL,
                question_text TEXT NOT NULL,
                choice_1 TEXT NOT NULL,
                choice_2 TEXT NOT NULL,
                choice_3 TEXT NOT NULL,
                choice_4 TEXT NOT NULL,
                correct_choice TEXT NOT NULL,
                category TEXT NOT NULL,
                difficulty_level TEXT NOT NULL
                    CHECK (difficulty_level IN ('easy', 'medium', 'hard')),
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS questions_book_id_idx ON questions (book_id)")
            .execute(&self.pool)
            .await?;

        info!("catalog tables ready");
        Ok(())
    }
}

fn book_from_row(row: &PgRow) -> Result<Book> {
    Ok(Book {
        id: row.try_get("id")?,
        file_path: row.try_get("file_path")?,
        grade: row.try_get("grade")?,
        subject: row.try_get("subject")?,
        semester: row.try_get("semester")?,
        created_at: row.try_get("created_at")?,
    })
}

fn progress_from_row(row: &PgRow) -> Result<ProcessingProgress> {
    let status: String = row.try_get("status")?;
    Ok(ProcessingProgress {
        id: row.try_get("id")?,
        file_path: row.try_get("file_path")?,
        status: status.parse()?,
        last_processed_page: row.try_get("last_processed_page")?,
        questions_generated: row.try_get("questions_generated")?,
        created_at: row.try_get("created_at")?,
    })
}

fn question_from_row(row: &PgRow) -> Result<Question> {
    let difficulty: String = row.try_get("difficulty_level")?;
    Ok(Question {
        id: row.try_get("id")?,
        book_id: row.try_get("book_id")?,
        question_number: row.try_get("question_number")?,
        question_text: row.try_get("question_text")?,
        choice_1: row.try_get("choice_1")?,
        choice_2: row.try_get("choice_2")?,
        choice_3: row.try_get("choice_3")?,
        choice_4: row.try_get("choice_4")?,
        correct_choice: row.try_get("correct_choice")?,
        category: row.try_get("category")?,
        difficulty_level: difficulty.parse()?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl Catalog for PgCatalog {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        let sql = format!(
            "SELECT {} FROM books_metadata ORDER BY created_at DESC, id DESC",
            BOOK_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(book_from_row).collect()
    }

    async fn list_file_paths(&self) -> Result<Vec<String>> {
        let paths: Vec<String> = sqlx::query_scalar("SELECT file_path FROM books_metadata")
            .fetch_all(&self.pool)
            .await?;
        Ok(paths)
    }

    async fn insert_books(&self, file_paths: &[String]) -> Result<Vec<Book>> {
        let sql = format!(
            "INSERT INTO books_metadata (file_path, grade, subject, semester)
             VALUES ($1, NULL, NULL, NULL)
             RETURNING {}",
            BOOK_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(file_paths.len());
        for path in file_paths {
            let row = sqlx::query(&sql).bind(path).fetch_one(&mut *tx).await?;
            inserted.push(book_from_row(&row)?);
        }
        tx.commit().await?;
        Ok(inserted)
    }

    async fn book_by_path(&self, file_path: &str) -> Result<Option<Book>> {
        let sql = format!("SELECT {} FROM books_metadata WHERE file_path = $1", BOOK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(book_from_row).transpose()
    }

    async fn book_by_id(&self, id: i64) -> Result<Option<Book>> {
        let sql = format!("SELECT {} FROM books_metadata WHERE id = $1", BOOK_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(book_from_row).transpose()
    }

    async fn save_metadata(&self, file_path: &str, metadata: &BookMetadata) -> Result<Book> {
        let sql = format!(
            "INSERT INTO books_metadata (file_path, grade, subject, semester)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (file_path) DO UPDATE
                SET grade = EXCLUDED.grade,
                    subject = EXCLUDED.subject,
                    semester = EXCLUDED.semester
             RETURNING {}",
            BOOK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(file_path)
            .bind(&metadata.grade)
            .bind(&metadata.subject)
            .bind(&metadata.semester)
            .fetch_one(&self.pool)
            .await?;
        book_from_row(&row)
    }

    async fn list_progress(&self) -> Result<Vec<ProcessingProgress>> {
        let sql = format!("SELECT {} FROM processing_progress", PROGRESS_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(progress_from_row).collect()
    }

    async fn progress_by_path(&self, file_path: &str) -> Result<Option<ProcessingProgress>> {
        let sql = format!(
            "SELECT {} FROM processing_progress WHERE file_path = $1",
            PROGRESS_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(file_path)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(progress_from_row).transpose()
    }

    async fn ensure_progress(&self, file_path: &str) -> Result<ProcessingProgress> {
        sqlx::query(
            "INSERT INTO processing_progress (file_path, status, last_processed_page, questions_generated)
             VALUES ($1, 'not_started', 0, 0)
             ON CONFLICT (file_path) DO NOTHING",
        )
        .bind(file_path)
        .execute(&self.pool)
        .await?;

        self.progress_by_path(file_path)
            .await?
            .ok_or_else(|| anyhow::anyhow!("progress row for '{}' missing after insert", file_path))
    }

    async fn set_status(&self, file_path: &str, status: ProgressStatus) -> Result<u64> {
        let result = sqlx::query("UPDATE processing_progress SET status = $2 WHERE file_path = $1")
            .bind(file_path)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn apply_report(&self, update: ReportUpdate<'_>) -> Result<Option<ProcessingProgress>> {
        let next_status = if update.completed {
            ProgressStatus::Completed
        } else {
            ProgressStatus::Processing
        };

        let mut tx = self.pool.begin().await?;

        // Conditional on `processing` so a concurrent cancel wins over a late report.
        let sql = format!(
            "UPDATE processing_progress
                SET last_processed_page = $2,
                    questions_generated = questions_generated + $3,
                    status = $4
              WHERE file_path = $1 AND status = 'processing'
              RETURNING {}",
            PROGRESS_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(update.file_path)
            .bind(update.last_processed_page)
            .bind(update.questions.len() as i32)
            .bind(next_status.as_str())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let progress = progress_from_row(&row)?;

        for q in update.questions {
            sqlx::query(
                "INSERT INTO questions (book_id, question_number, question_text, choice_1, choice_2,
                                        choice_3, choice_4, correct_choice, category, difficulty_level)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(update.book_id)
            .bind(q.question_number)
            .bind(&q.question_text)
            .bind(&q.choice_1)
            .bind(&q.choice_2)
            .bind(&q.choice_3)
            .bind(&q.choice_4)
            .bind(&q.correct_choice)
            .bind(&q.category)
            .bind(q.difficulty_level.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(progress))
    }

    async fn questions_for_book(&self, book_id: i64) -> Result<Vec<Question>> {
        let sql = format!(
            "SELECT {} FROM questions WHERE book_id = $1 ORDER BY question_number, id",
            QUESTION_COLUMNS
        );
        let rows = sqlx::query(&sql).bind(book_id).fetch_all(&self.pool).await?;
        rows.iter().map(question_from_row).collect()
    }
}
