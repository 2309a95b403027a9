//! Signalling messages emitted on publish and rollback
//!
//! Signals are fire-and-forget notifications for connected agents or the
//! downstream reload controller. Delivery is at-least-once; receivers are
//! expected to apply them idempotently.

use crate::ids::{AppId, BusinessId, CfgsetId, ReleaseId};
use crate::strategy::StrategyRule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a signal announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    /// A release became live for its config set
    Publish,

    /// A previously published release was withdrawn
    Rollback,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Publish => write!(f, "publish"),
            SignalKind::Rollback => write!(f, "rollback"),
        }
    }
}

/// One notification carrying everything a receiver needs to decide locally
/// whether the announced release applies to it, without a follow-up query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub cfgset_id: CfgsetId,
    pub cfgset_name: String,
    pub cfgset_path: String,
    /// Store-assigned per-config-set release serial
    pub serial: u64,
    pub release_id: ReleaseId,
    /// Targeting rule of the release, so receivers can pre-filter
    pub strategy: StrategyRule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_kind_display() {
        assert_eq!(SignalKind::Publish.to_string(), "publish");
        assert_eq!(SignalKind::Rollback.to_string(), "rollback");
    }
}
