//! Targeting strategy service
//!
//! A strategy is an app-scoped targeting rule set bound to releases. The
//! matcher itself lives in `confpipe_types::strategy` and is re-exported
//! here; this crate adds creation with per-app name uniqueness and rule
//! size validation.

pub mod error;
pub mod service;

pub use confpipe_types::strategy::{AppInstance, StrategyRule};
pub use error::{Result, StrategyError};
pub use service::{CreateStrategyRequest, StrategyLimits, StrategyService};
