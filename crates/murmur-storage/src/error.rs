//! Error types for the storage layer.

use crate::object_store::MAX_KEYS_PER_REQUEST;

/// Errors that can occur during object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// The key or bucket name cannot be mapped to an object location.
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// A batch operation named more keys than one request may carry.
    #[error("too many keys in one request: {0} (limit: {max})", max = MAX_KEYS_PER_REQUEST)]
    BatchTooLarge(usize),

    /// A signed URL was malformed, tampered with, or expired.
    #[error("signed url rejected: {0}")]
    Signature(String),

    /// A filesystem operation failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failed.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
