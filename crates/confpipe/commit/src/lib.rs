//! Commit lifecycle and multi-commit aggregation
//!
//! A commit is one proposed content snapshot for a config set, moving
//! Init -> Confirmed or Init -> Canceled. The multi-commit aggregator batches
//! commits across many config sets of one app into a single unit with
//! best-effort per-entry creation and an idempotent cancel guard.

pub mod error;
pub mod multi;
pub mod render;
pub mod service;

pub use error::{CommitError, Result};
pub use multi::{
    CommitIntent, CreateMultiCommitRequest, FailedIntent, MultiCommitOutcome, MultiCommitService,
};
pub use render::{PassthroughRenderer, RenderError, TemplateRenderer};
pub use service::{CommitService, CreateCommitRequest};
