//! Error types for session finalization.

use murmur_storage::StorageError;

/// Errors that can occur while merging a session or triggering analysis.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading log records or writing the summary failed.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid analysis configuration: {0}")]
    Config(String),

    /// The analysis request could not be sent.
    #[error("analysis request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The analysis service answered with a non-success status.
    #[error("analysis service returned HTTP {status}: {body}")]
    Analysis { status: u16, body: String },
}
