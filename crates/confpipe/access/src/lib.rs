//! Caller-facing facade for the release pipeline
//!
//! Wraps the commit, strategy, release, and pull services behind one entry
//! point with request limits, per-call deadlines, and a stable client error
//! code per failure class.

pub mod config;
pub mod error;
pub mod service;

pub use config::{AccessConfig, RequestLimits};
pub use error::{AccessError, ClientCode, Result};
pub use service::AccessService;
