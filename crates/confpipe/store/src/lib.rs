//! Storage abstraction for the confpipe release pipeline
//!
//! One trait per entity family plus a DashMap-backed in-memory
//! implementation for development and tests. The production store is an
//! external collaborator reached through these same traits.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use traits::{
    AppStore, BusinessStore, CfgsetStore, CommitStore, MultiCommitStore, MultiReleaseStore,
    ReleaseStore, StrategyStore,
};
