//! Error types for the cleaning pipeline.
//!
//! Library code returns `PipelineError`; the binary and the config layer
//! wrap it with `anyhow` context.

use thiserror::Error;

/// Errors that can occur while loading, navigating or aggregating a hierarchy.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A container is missing an expected nested key, or a path names a node
    /// that does not exist.
    #[error("Structure error at '{path}': {reason}")]
    Structure { path: String, reason: String },

    /// An aggregation that needs at least one row received none.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A student reached the flattener without passing validation.
    #[error("Student at '{path}' was not validated before flattening")]
    Unvalidated { path: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn structure(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::Structure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the precondition violations on tree shape.
    pub fn is_structural(&self) -> bool {
        matches!(self, PipelineError::Structure { .. } | PipelineError::Json(_))
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
