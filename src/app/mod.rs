pub mod book_service;
pub mod startup;

pub use book_service::{BookOverview, BookService, GenerationTicket, ProgressReport, ScanReport};
pub use startup::build_service;
