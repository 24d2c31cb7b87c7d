//! Per-book processing progress (`processing_progress` rows).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    Processing,
    Completed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::Processing => "processing",
            ProgressStatus::Completed => "completed",
        }
    }

    /// Whether a generation handshake may move this status to `processing`.
    ///
    /// Re-starting a book that is already processing is allowed (two starts for the
    /// same file are an accepted race); a completed book never goes back.
    pub fn can_start(&self) -> bool {
        !matches!(self, ProgressStatus::Completed)
    }

    /// Worker reports are only accepted while a book is being processed.
    pub fn accepts_reports(&self) -> bool {
        matches!(self, ProgressStatus::Processing)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(ProgressStatus::NotStarted),
            "processing" => Ok(ProgressStatus::Processing),
            "completed" => Ok(ProgressStatus::Completed),
            other => Err(anyhow::anyhow!("unknown progress status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProcessingProgress {
    pub id: i64,
    pub file_path: String,
    pub status: ProgressStatus,
    pub last_processed_page: i32,
    pub questions_generated: i32,
    pub created_at: DateTime<Utc>,
}

/// Highest page number a worker may report. Keeps `next_page` representable.
pub const MAX_PAGE: i32 = 1_000_000;

impl ProcessingProgress {
    /// First page the external worker has not processed yet; `None` if it would overflow.
    pub fn next_page(&self) -> Option<i32> {
        self.last_processed_page.checked_add(1)
    }
}

/// Status shown next to a book in the dashboard listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DerivedStatus {
    pub state: ProgressStatus,
    pub label: String,
}

impl DerivedStatus {
    pub fn from_progress(progress: Option<&ProcessingProgress>) -> Self {
        let Some(progress) = progress else {
            return DerivedStatus {
                state: ProgressStatus::NotStarted,
                label: "Not started".to_string(),
            };
        };

        let label = match progress.status {
            ProgressStatus::NotStarted => "Not started".to_string(),
            ProgressStatus::Processing => format!(
                "Processing: {} questions, page {}",
                progress.questions_generated, progress.last_processed_page
            ),
            ProgressStatus::Completed => {
                format!("Completed ({} questions)", progress.questions_generated)
            }
        };

        DerivedStatus {
            state: progress.status,
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(status: ProgressStatus, page: i32, questions: i32) -> ProcessingProgress {
        ProcessingProgress {
            id: 7,
            file_path: "science.pdf".to_string(),
            status,
            last_processed_page: page,
            questions_generated: questions,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn status_text_round_trips_through_from_str() {
        for status in [
            ProgressStatus::NotStarted,
            ProgressStatus::Processing,
            ProgressStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<ProgressStatus>().unwrap(), status);
        }
        assert!("paused".parse::<ProgressStatus>().is_err());
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&ProgressStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
    }

    #[test]
    fn completed_books_cannot_restart() {
        assert!(ProgressStatus::NotStarted.can_start());
        assert!(ProgressStatus::Processing.can_start());
        assert!(!ProgressStatus::Completed.can_start());
        assert!(ProgressStatus::Processing.accepts_reports());
        assert!(!ProgressStatus::NotStarted.accepts_reports());
    }

    #[test]
    fn next_page_follows_last_processed() {
        assert_eq!(progress(ProgressStatus::NotStarted, 0, 0).next_page(), Some(1));
        assert_eq!(progress(ProgressStatus::Processing, 41, 12).next_page(), Some(42));
        assert_eq!(progress(ProgressStatus::NotStarted, i32::MAX, 0).next_page(), None);
    }

    #[test]
    fn derived_status_labels() {
        assert_eq!(DerivedStatus::from_progress(None).label, "Not started");
        assert_eq!(
            DerivedStatus::from_progress(Some(&progress(ProgressStatus::Processing, 4, 10))).label,
            "Processing: 10 questions, page 4"
        );
        let done = DerivedStatus::from_progress(Some(&progress(ProgressStatus::Completed, 90, 120)));
        assert_eq!(done.state, ProgressStatus::Completed);
        assert_eq!(done.label, "Completed (120 questions)");
    }
}
