//! Lifecycle states for commits and releases
//!
//! Commits move Init -> Confirmed or Init -> Canceled; both are terminal.
//! Releases move Init -> Published -> Rollbacked, or Init -> Canceled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a commit or multi-commit aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommitState {
    /// Created but not yet confirmed; content may still be canceled
    #[default]
    Init,

    /// Content is frozen and eligible for release binding
    Confirmed,

    /// Abandoned before confirmation
    Canceled,
}

impl CommitState {
    /// Terminal states admit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommitState::Confirmed | CommitState::Canceled)
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitState::Init => write!(f, "init"),
            CommitState::Confirmed => write!(f, "confirmed"),
            CommitState::Canceled => write!(f, "canceled"),
        }
    }
}

/// State of a release or multi-release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReleaseState {
    /// Created but not yet visible to agents
    #[default]
    Init,

    /// Live: agents resolving this config set may receive it
    Published,

    /// Withdrawn after publication; agents are re-signalled to fall back
    Rollbacked,

    /// Abandoned before publication
    Canceled,
}

impl ReleaseState {
    /// Rollbacked and Canceled releases can never be (re-)published
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReleaseState::Rollbacked | ReleaseState::Canceled)
    }

    /// Reload is only meaningful for releases agents may have applied
    pub fn is_reloadable(&self) -> bool {
        matches!(self, ReleaseState::Published | ReleaseState::Rollbacked)
    }
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseState::Init => write!(f, "init"),
            ReleaseState::Published => write!(f, "published"),
            ReleaseState::Rollbacked => write!(f, "rollbacked"),
            ReleaseState::Canceled => write!(f, "canceled"),
        }
    }
}
