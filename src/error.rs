//! Error taxonomy for pipeline operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing or malformed caller input.
    #[error("{0}")]
    Validation(String),

    /// Referenced book, progress row or object does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The current progress status forbids the requested transition.
    #[error("{0}")]
    Conflict(String),

    #[error("object of {size} bytes exceeds the {limit}-byte limit of bucket '{bucket}'")]
    PayloadTooLarge {
        bucket: &'static str,
        limit: usize,
        size: usize,
    },

    /// Object store, catalog or language model call failed.
    #[error("{context}")]
    Upstream {
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// Language model reply was not usable metadata (strict mode only).
    #[error("{0}")]
    Parse(String),

    /// Required configuration is missing.
    #[error("{0}")]
    Config(String),
}

impl PipelineError {
    /// Adapter for `map_err` on backend results.
    pub fn upstream(context: impl Into<String>) -> impl FnOnce(anyhow::Error) -> PipelineError {
        let context = context.into();
        move |source| PipelineError::Upstream { context, source }
    }

    /// Extra detail for the error envelope, if any.
    pub fn details(&self) -> Option<String> {
        match self {
            PipelineError::Upstream { source, .. } => Some(format!("{:#}", source)),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
