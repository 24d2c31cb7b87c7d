pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{build_service, BookService};
pub use error::{PipelineError, PipelineResult};
pub use infra::config::Config;
