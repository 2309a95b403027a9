//! Targeting strategy rules and the instance matcher
//!
//! A strategy decides which polling agents a release applies to. Matching is
//! a pure function of (rule, instance): the same code runs on the publish
//! consistency path and on the pull resolution path.

use crate::ids::AppId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Targeting rule set scoped to one app.
///
/// Each allow-list filters one dimension of the instance identity; an empty
/// list means "no filter on this dimension". The two label maps differ in
/// combination semantics: `labels_or` requires at least one key to be present
/// with an equal value, `labels_and` requires every key to be present with an
/// equal value. The default (all fields empty) is the broadcast rule that
/// matches every instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StrategyRule {
    /// Allowed cluster ids
    pub cluster_ids: Vec<String>,

    /// Allowed zone ids
    pub zone_ids: Vec<String>,

    /// Allowed datacenters
    pub datacenters: Vec<String>,

    /// Allowed instance IPs
    pub ips: Vec<String>,

    /// Label selector with OR semantics
    pub labels_or: HashMap<String, String>,

    /// Label selector with AND semantics
    pub labels_and: HashMap<String, String>,
}

impl StrategyRule {
    /// The broadcast rule: no filter on any dimension.
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when every dimension is unfiltered, i.e. this is the broadcast
    /// rule that matches every instance unconditionally.
    pub fn is_empty(&self) -> bool {
        self.cluster_ids.is_empty()
            && self.zone_ids.is_empty()
            && self.datacenters.is_empty()
            && self.ips.is_empty()
            && self.labels_or.is_empty()
            && self.labels_and.is_empty()
    }

    /// Evaluate this rule against an instance identity.
    ///
    /// Pure and deterministic: no side effects, no clock, no store access.
    /// Per-dimension checks are ANDed together, each vacuously true when its
    /// list or map is empty. A non-empty OR map none of whose keys exist on
    /// the instance is a non-match, the same as a key present with a
    /// differing value.
    pub fn matches(&self, instance: &AppInstance) -> bool {
        if self.is_empty() {
            return true;
        }

        let in_list = |list: &[String], value: &str| -> bool {
            list.is_empty() || list.iter().any(|v| v == value)
        };

        if !in_list(&self.cluster_ids, &instance.cluster_id) {
            return false;
        }
        if !in_list(&self.zone_ids, &instance.zone_id) {
            return false;
        }
        if !in_list(&self.datacenters, &instance.datacenter) {
            return false;
        }
        if !in_list(&self.ips, &instance.ip) {
            return false;
        }

        if !self.labels_or.is_empty() {
            let any = self
                .labels_or
                .iter()
                .any(|(k, v)| instance.labels.get(k) == Some(v));
            if !any {
                return false;
            }
        }

        if !self.labels_and.is_empty() {
            let all = self
                .labels_and
                .iter()
                .all(|(k, v)| instance.labels.get(k) == Some(v));
            if !all {
                return false;
            }
        }

        true
    }
}

/// Identity of a polling agent, supplied per request and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppInstance {
    /// App the agent serves
    pub app_id: Option<AppId>,

    /// Cluster the agent runs in
    pub cluster_id: String,

    /// Zone within the cluster
    pub zone_id: String,

    /// Datacenter
    pub datacenter: String,

    /// Instance IP
    pub ip: String,

    /// Free-form instance labels
    pub labels: HashMap<String, String>,
}

impl AppInstance {
    /// Builder-style label attachment, mainly for tests.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}
