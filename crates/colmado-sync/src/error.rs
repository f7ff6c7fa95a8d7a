//! Error types for the sync layer.

use thiserror::Error;

/// Sync layer errors.
///
/// Delivery itself is fire-and-forget; errors here are limited to payload
/// shape problems. A malformed payload is skipped, never fatal.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Event payload could not be (de)serialized.
    #[error("Payload serialization error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Convenience type alias for Results with SyncError.
pub type SyncResult<T> = Result<T, SyncError>;
