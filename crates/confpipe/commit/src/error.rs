//! Commit error types

use crate::render::RenderError;
use confpipe_store::StoreError;
use confpipe_types::{CfgsetId, CommitId, CommitState, MultiCommitId};
use thiserror::Error;

/// Commit and multi-commit errors
#[derive(Debug, Error)]
pub enum CommitError {
    /// Request rejected before any store access
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("commit not found: {0}")]
    NotFound(CommitId),

    #[error("config set not found: {0}")]
    CfgsetNotFound(CfgsetId),

    #[error("multi-commit not found: {0}")]
    MultiNotFound(MultiCommitId),

    #[error("commit already confirmed: {0}")]
    AlreadyConfirmed(CommitId),

    #[error("commit already canceled: {0}")]
    AlreadyCanceled(CommitId),

    #[error("multi-commit already confirmed: {0}")]
    MultiAlreadyConfirmed(MultiCommitId),

    #[error("multi-commit already canceled: {0}")]
    MultiAlreadyCanceled(MultiCommitId),

    /// Reuse binding requires a confirmed commit
    #[error("reuse commit {commit_id} is not confirmed (state {state})")]
    ReuseNotConfirmed {
        commit_id: CommitId,
        state: CommitState,
    },

    /// A fetched row does not belong to the business/app/config set it was
    /// requested for; a data-integrity fault, fatal to the operation
    #[error("data inconsistency: {0}")]
    Consistency(String),

    /// Template rendering failed; the commit stays Init and may be retried
    #[error("template rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for commit operations
pub type Result<T> = std::result::Result<T, CommitError>;
