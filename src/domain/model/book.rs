//! Registered books (`books_metadata` rows).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A PDF registered in the catalog.
///
/// `grade`, `subject` and `semester` stay `None` until metadata extraction
/// succeeds, after which all three are set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Book {
    pub id: i64,
    pub file_path: String,
    pub grade: Option<String>,
    pub subject: Option<String>,
    pub semester: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn has_metadata(&self) -> bool {
        self.metadata().is_some()
    }

    /// Returns the extracted triple, or `None` if any of the fields is still unset.
    pub fn metadata(&self) -> Option<BookMetadata> {
        match (&self.grade, &self.subject, &self.semester) {
            (Some(grade), Some(subject), Some(semester)) => Some(BookMetadata {
                grade: grade.clone(),
                subject: subject.clone(),
                semester: semester.clone(),
            }),
            _ => None,
        }
    }
}

/// Bibliographic fields inferred from a book's first pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BookMetadata {
    pub grade: String,
    pub subject: String,
    pub semester: String,
}
