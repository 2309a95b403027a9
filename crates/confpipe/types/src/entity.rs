//! Domain entities of the release pipeline
//!
//! Businesses own apps, apps own config sets, and every config set moves
//! content through commits and releases. Audit fields (operator, memo,
//! timestamps) follow every entity.

use crate::ids::{
    AppId, BusinessId, CfgsetId, CommitId, MultiCommitId, MultiReleaseId, ReleaseId, StrategyId,
};
use crate::state::{CommitState, ReleaseState};
use crate::strategy::StrategyRule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tenant boundary; owns everything below it. Created once by an admin
/// operation, immutable id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub creator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Downstream delivery channel a workload is wired to.
///
/// Publish and reload signals for an app are forwarded to the controller
/// serving its channel; the pipeline logic is identical for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryChannel {
    /// Container-deployed workloads reached through the cluster sidecar
    #[default]
    Container,

    /// Host-deployed workloads reached through the node agent
    HostAgent,
}

impl fmt::Display for DeliveryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryChannel::Container => write!(f, "container"),
            DeliveryChannel::HostAgent => write!(f, "host-agent"),
        }
    }
}

/// A deployable workload under a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub id: AppId,
    pub business_id: BusinessId,
    pub name: String,
    pub delivery_channel: DeliveryChannel,
    pub creator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named, path-addressed configuration unit under an app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSet {
    pub id: CfgsetId,
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub name: String,
    pub path: String,
    pub creator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a commit's content comes from.
///
/// The three forms are mutually exclusive by construction; validation on top
/// of this only needs to check the inline form carries a non-empty render
/// rule and referenced ids are non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentSource {
    /// Raw content bytes, released as-is
    Raw { content: Vec<u8> },

    /// Reference to a template managed by the external template service
    Template { template_id: String },

    /// Inline template plus the render rule to apply at confirm time
    Inline { template: String, rule: String },
}

impl ContentSource {
    /// Raw content helper, mainly for callers assembling requests.
    pub fn raw(content: impl Into<Vec<u8>>) -> Self {
        ContentSource::Raw {
            content: content.into(),
        }
    }
}

/// One proposed content snapshot for a config set.
///
/// Content is write-once-then-confirmed: after confirmation the commit is
/// never updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub cfgset_id: CfgsetId,
    pub source: ContentSource,
    /// Rendered bytes, populated at confirm time for template sources
    pub rendered: Option<Vec<u8>>,
    pub changelog: String,
    pub state: CommitState,
    pub operator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of a multi-commit: the commit bound to one config set, either
/// freshly created or reused from an earlier confirmed commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubCommit {
    pub cfgset_id: CfgsetId,
    pub commit_id: CommitId,
    /// True when this entry binds a previously confirmed commit instead of a
    /// newly created one
    pub reused: bool,
}

/// Groups one commit per target config set for a single app, created in one
/// logical operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiCommit {
    pub id: MultiCommitId,
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub sub_commits: Vec<SubCommit>,
    pub state: CommitState,
    pub operator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A targeting rule set scoped to one app; immutable once referenced by a
/// release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub id: StrategyId,
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub name: String,
    pub rule: StrategyRule,
    pub creator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A publishable binding of business + app + config set + commit + strategy.
///
/// The strategy rule is denormalized onto the release at creation time;
/// strategies are immutable once referenced, so the copy can never drift.
/// `serial` is assigned by the store, monotonically increasing per config
/// set, and orders the newest-first history scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: ReleaseId,
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub cfgset_id: CfgsetId,
    pub commit_id: CommitId,
    pub strategy_id: Option<StrategyId>,
    pub strategy: StrategyRule,
    pub name: String,
    pub serial: u64,
    pub state: ReleaseState,
    pub operator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Multi-config-set analogue of a release, built from a confirmed
/// multi-commit; carries the sub-release id list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiRelease {
    pub id: MultiReleaseId,
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub multi_commit_id: MultiCommitId,
    pub strategy_id: Option<StrategyId>,
    pub name: String,
    pub sub_releases: Vec<ReleaseId>,
    pub state: ReleaseState,
    pub operator: String,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_channel_display() {
        assert_eq!(DeliveryChannel::Container.to_string(), "container");
        assert_eq!(DeliveryChannel::HostAgent.to_string(), "host-agent");
    }

    #[test]
    fn test_content_source_raw_helper() {
        let source = ContentSource::raw("X=1");
        assert_eq!(
            source,
            ContentSource::Raw {
                content: b"X=1".to_vec()
            }
        );
    }
}
