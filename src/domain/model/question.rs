use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
        }
    }
}

impl FromStr for DifficultyLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(DifficultyLevel::Easy),
            "medium" => Ok(DifficultyLevel::Medium),
            "hard" => Ok(DifficultyLevel::Hard),
            other => Err(anyhow::anyhow!("unknown difficulty level '{}'", other)),
        }
    }
}

/// A generated multiple-choice question.
///
/// `correct_choice` is expected to repeat one of the four choices verbatim; nothing
/// checks that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: i64,
    pub book_id: i64,
    pub question_number: i32,
    pub question_text: String,
    pub choice_1: String,
    pub choice_2: String,
    pub choice_3: String,
    pub choice_4: String,
    pub correct_choice: String,
    pub category: String,
    pub difficulty_level: DifficultyLevel,
    pub created_at: DateTime<Utc>,
}

/// Question as stored for a book, before it receives an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewQuestion {
    pub question_number: i32,
    pub question_text: String,
    pub choice_1: String,
    pub choice_2: String,
    pub choice_3: String,
    pub choice_4: String,
    pub correct_choice: String,
    pub category: String,
    pub difficulty_level: DifficultyLevel,
}

impl NewQuestion {
    pub fn into_question(self, id: i64, book_id: i64, created_at: DateTime<Utc>) -> Question {
        Question {
            id,
            book_id,
            question_number: self.question_number,
            question_text: self.question_text,
            choice_1: self.choice_1,
            choice_2: self.choice_2,
            choice_3: self.choice_3,
            choice_4: self.choice_4,
            correct_choice: self.correct_choice,
            category: self.category,
            difficulty_level: self.difficulty_level,
            created_at,
        }
    }
}
