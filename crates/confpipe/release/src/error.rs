//! Release error types

use crate::channel::ChannelError;
use crate::signal::SignalError;
use confpipe_store::StoreError;
use confpipe_types::{
    CommitId, CommitState, MultiCommitId, MultiReleaseId, ReleaseId, ReleaseState, StrategyId,
};
use thiserror::Error;

/// Release and multi-release errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Request rejected before any store access
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("release not found: {0}")]
    NotFound(ReleaseId),

    #[error("multi-release not found: {0}")]
    MultiNotFound(MultiReleaseId),

    #[error("commit not found: {0}")]
    CommitNotFound(CommitId),

    #[error("multi-commit not found: {0}")]
    MultiCommitNotFound(MultiCommitId),

    #[error("strategy not found: {0}")]
    StrategyNotFound(StrategyId),

    /// Multi-release binding requires a confirmed multi-commit
    #[error("multi-commit {multi_commit_id} is not confirmed (state {state})")]
    MultiCommitNotConfirmed {
        multi_commit_id: MultiCommitId,
        state: CommitState,
    },

    #[error("multi-release already rollbacked: {0}")]
    MultiAlreadyRollbacked(MultiReleaseId),

    #[error("multi-release already canceled: {0}")]
    MultiAlreadyCanceled(MultiReleaseId),

    /// Publish attempted on a release already withdrawn
    #[error("release already rollbacked: {0}")]
    AlreadyRollbacked(ReleaseId),

    /// Publish attempted on an abandoned release
    #[error("release already canceled: {0}")]
    AlreadyCanceled(ReleaseId),

    /// Publish requires the backing commit to be confirmed first
    #[error("commit {commit_id} is not confirmed (state {state})")]
    CommitNotConfirmed {
        commit_id: CommitId,
        state: CommitState,
    },

    /// Rollback re-signalling requires the administrative state flip to have
    /// happened already
    #[error("release {release_id} is not rollbacked (state {state})")]
    NotRollbacked {
        release_id: ReleaseId,
        state: ReleaseState,
    },

    /// Reload only applies to releases agents may have applied
    #[error("release {release_id} is not reloadable (state {state})")]
    NotReloadable {
        release_id: ReleaseId,
        state: ReleaseState,
    },

    /// A fetched row does not belong to the business/app/config set it was
    /// requested for; a data-integrity fault, fatal to the operation
    #[error("data inconsistency: {0}")]
    Consistency(String),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for release operations
pub type Result<T> = std::result::Result<T, ReleaseError>;
