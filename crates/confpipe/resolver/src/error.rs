//! Resolver error types

use confpipe_store::StoreError;
use confpipe_types::{ReleaseId, ReleaseState};
use thiserror::Error;

/// Pull-path errors
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Request rejected before any store access
    #[error("validation failed: {0}")]
    Validation(String),

    /// An explicitly requested release does not exist
    #[error("release not found: {0}")]
    NotFound(ReleaseId),

    /// An explicitly requested release is not live
    #[error("release {release_id} is not published (state {state})")]
    NotPublished {
        release_id: ReleaseId,
        state: ReleaseState,
    },

    /// A fetched row does not belong to the business/app/config set of the
    /// request. This is a data-integrity fault and aborts the scan rather
    /// than being skipped.
    #[error("data inconsistency: {0}")]
    Consistency(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, ResolverError>;
