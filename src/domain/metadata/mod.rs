pub mod excerpt;
pub mod prompt;

pub use excerpt::{excerpt_or_placeholder, extract_excerpt, PLACEHOLDER_EXCERPT};
pub use prompt::{fallback_metadata, parse_metadata_reply, SYSTEM_PROMPT};
