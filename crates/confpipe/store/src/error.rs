//! Store error taxonomy

use thiserror::Error;

/// Errors surfaced by the backing store.
///
/// `Unavailable` wraps downstream transport or engine failures verbatim; the
/// pipeline never retries internally.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Row does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness or write conflict
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row failed integrity checks on the way in or out
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The store could not be reached or failed mid-call
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
