//! Core domain types for the confpipe release pipeline
//!
//! Raw configuration content moves through commit -> confirm -> release ->
//! publish -> rollback; releases bind to targeting strategies, and polling
//! agents resolve which single release currently applies to them. This crate
//! holds the shared vocabulary: strongly-typed ids, entity structs, lifecycle
//! state enums, the signalling message, and the pure strategy matcher.

pub mod entity;
pub mod ids;
pub mod signal;
pub mod state;
pub mod strategy;

pub use entity::{
    App, Business, Commit, ConfigSet, ContentSource, DeliveryChannel, MultiCommit, MultiRelease,
    Release, Strategy, SubCommit,
};
pub use ids::{
    AppId, BusinessId, CfgsetId, CommitId, MultiCommitId, MultiReleaseId, ReleaseId, StrategyId,
};
pub use signal::{Signal, SignalKind};
pub use state::{CommitState, ReleaseState};
pub use strategy::{AppInstance, StrategyRule};
