//! Facade error types and client codes
//!
//! Internal errors carry typed ids and states; callers on the other side of
//! a wire only need a stable code plus the rendered message. `ClientCode`
//! is that code: every internal variant maps to exactly one, so the mapping
//! never loses a failure class even as the inner enums grow.

use confpipe_commit::CommitError;
use confpipe_release::ReleaseError;
use confpipe_resolver::ResolverError;
use confpipe_store::StoreError;
use confpipe_strategy::StrategyError;
use std::time::Duration;
use thiserror::Error;

/// Stable machine-readable failure class reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCode {
    /// Request rejected before reaching any service
    InvalidArgument,
    /// Referenced entity does not exist
    NotFound,
    /// Entity exists but its state forbids the operation
    FailedPrecondition,
    /// Name or key collision
    AlreadyExists,
    /// Stored rows contradict each other; operator attention needed
    DataCorruption,
    /// Call exceeded its deadline
    DeadlineExceeded,
    /// Store or downstream dependency failure
    Unavailable,
}

impl ClientCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCode::InvalidArgument => "INVALID_ARGUMENT",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::FailedPrecondition => "FAILED_PRECONDITION",
            ClientCode::AlreadyExists => "ALREADY_EXISTS",
            ClientCode::DataCorruption => "DATA_CORRUPTION",
            ClientCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ClientCode::Unavailable => "UNAVAILABLE",
        }
    }
}

impl std::fmt::Display for ClientCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facade-level errors
#[derive(Debug, Error)]
pub enum AccessError {
    /// Request rejected by facade validation, before any service call
    #[error("validation failed: {0}")]
    Validation(String),

    /// The wrapped call did not finish within the configured deadline
    #[error("{operation} exceeded deadline of {deadline:?}")]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Release(#[from] ReleaseError),

    #[error(transparent)]
    Resolver(#[from] ResolverError),
}

impl AccessError {
    /// Classify this error for callers.
    pub fn client_code(&self) -> ClientCode {
        match self {
            AccessError::Validation(_) => ClientCode::InvalidArgument,
            AccessError::Timeout { .. } => ClientCode::DeadlineExceeded,
            AccessError::Commit(err) => commit_code(err),
            AccessError::Strategy(err) => strategy_code(err),
            AccessError::Release(err) => release_code(err),
            AccessError::Resolver(err) => resolver_code(err),
        }
    }
}

fn store_code(err: &StoreError) -> ClientCode {
    match err {
        StoreError::NotFound(_) => ClientCode::NotFound,
        StoreError::Conflict(_) => ClientCode::AlreadyExists,
        StoreError::InvalidData(_) => ClientCode::DataCorruption,
        StoreError::Unavailable(_) => ClientCode::Unavailable,
    }
}

fn commit_code(err: &CommitError) -> ClientCode {
    match err {
        CommitError::Validation(_) => ClientCode::InvalidArgument,
        CommitError::NotFound(_)
        | CommitError::CfgsetNotFound(_)
        | CommitError::MultiNotFound(_) => ClientCode::NotFound,
        CommitError::AlreadyConfirmed(_)
        | CommitError::AlreadyCanceled(_)
        | CommitError::MultiAlreadyConfirmed(_)
        | CommitError::MultiAlreadyCanceled(_)
        | CommitError::ReuseNotConfirmed { .. } => ClientCode::FailedPrecondition,
        CommitError::Consistency(_) => ClientCode::DataCorruption,
        CommitError::Render(_) => ClientCode::Unavailable,
        CommitError::Store(err) => store_code(err),
    }
}

fn strategy_code(err: &StrategyError) -> ClientCode {
    match err {
        StrategyError::Validation(_) => ClientCode::InvalidArgument,
        StrategyError::NameExists { .. } => ClientCode::AlreadyExists,
        StrategyError::NotFound(_) | StrategyError::AppNotFound(_) => ClientCode::NotFound,
        StrategyError::Consistency(_) => ClientCode::DataCorruption,
        StrategyError::Store(err) => store_code(err),
    }
}

fn release_code(err: &ReleaseError) -> ClientCode {
    match err {
        ReleaseError::Validation(_) => ClientCode::InvalidArgument,
        ReleaseError::NotFound(_)
        | ReleaseError::MultiNotFound(_)
        | ReleaseError::CommitNotFound(_)
        | ReleaseError::MultiCommitNotFound(_)
        | ReleaseError::StrategyNotFound(_) => ClientCode::NotFound,
        ReleaseError::MultiCommitNotConfirmed { .. }
        | ReleaseError::MultiAlreadyRollbacked(_)
        | ReleaseError::MultiAlreadyCanceled(_)
        | ReleaseError::AlreadyRollbacked(_)
        | ReleaseError::AlreadyCanceled(_)
        | ReleaseError::CommitNotConfirmed { .. }
        | ReleaseError::NotRollbacked { .. }
        | ReleaseError::NotReloadable { .. } => ClientCode::FailedPrecondition,
        ReleaseError::Consistency(_) => ClientCode::DataCorruption,
        ReleaseError::Signal(_) | ReleaseError::Channel(_) => ClientCode::Unavailable,
        ReleaseError::Store(err) => store_code(err),
    }
}

fn resolver_code(err: &ResolverError) -> ClientCode {
    match err {
        ResolverError::Validation(_) => ClientCode::InvalidArgument,
        ResolverError::NotFound(_) => ClientCode::NotFound,
        ResolverError::NotPublished { .. } => ClientCode::FailedPrecondition,
        ResolverError::Consistency(_) => ClientCode::DataCorruption,
        ResolverError::Store(err) => store_code(err),
    }
}

/// Result type for facade operations
pub type Result<T> = std::result::Result<T, AccessError>;
