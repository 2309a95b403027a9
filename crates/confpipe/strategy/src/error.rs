//! Strategy error types

use confpipe_store::StoreError;
use confpipe_types::{AppId, StrategyId};
use thiserror::Error;

/// Strategy errors
#[derive(Debug, Error)]
pub enum StrategyError {
    /// Request rejected before any store access
    #[error("validation failed: {0}")]
    Validation(String),

    /// Strategy names are unique per app
    #[error("strategy name {name:?} already exists for app {app_id}")]
    NameExists { app_id: AppId, name: String },

    #[error("strategy not found: {0}")]
    NotFound(StrategyId),

    #[error("app not found: {0}")]
    AppNotFound(AppId),

    /// A fetched row does not belong to the requested business/app
    #[error("data inconsistency: {0}")]
    Consistency(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for strategy operations
pub type Result<T> = std::result::Result<T, StrategyError>;
