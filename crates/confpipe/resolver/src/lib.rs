//! Pull-path release resolution
//!
//! Serves polling agents: given an instance identity and the agent's current
//! release, decide which single published release applies now, either by
//! explicit id or by a paginated newest-first scan of the config set's
//! release history.

pub mod error;
pub mod resolver;

pub use error::{Result, ResolverError};
pub use resolver::{PullOutcome, PullRequest, Resolver, ResolverConfig};
