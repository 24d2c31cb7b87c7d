//! Catalog entities: books, their processing progress, and generated questions.

pub mod book;
pub mod progress;
pub mod question;

pub use book::{Book, BookMetadata};
pub use progress::{DerivedStatus, ProcessingProgress, ProgressStatus, MAX_PAGE};
pub use question::{DifficultyLevel, NewQuestion, Question};
