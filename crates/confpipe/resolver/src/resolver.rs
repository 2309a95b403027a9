//! Pull-path release resolution
//!
//! Agents poll with their instance identity and the release they currently
//! run; the resolver answers "which release, if any, applies to you now".
//! With an explicit release id the answer is a single fetch plus checks.
//! Without one, the resolver walks the config set's release history newest
//! first, one bounded page at a time, evaluating the targeting rule per row.
//! The history of a busy config set is unbounded and strategies are
//! evaluated per agent, not pre-computed, so pagination is what keeps
//! per-request store load flat while still guaranteeing progress toward the
//! newest matching release.

use crate::error::{Result, ResolverError};
use confpipe_store::ReleaseStore;
use confpipe_types::{
    AppId, AppInstance, BusinessId, CfgsetId, Release, ReleaseId, ReleaseState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolver tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Rows fetched per history-scan round
    pub page_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { page_size: 50 }
    }
}

/// One pull request from an agent.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub cfgset_id: CfgsetId,
    pub instance: AppInstance,
    /// Release the agent currently runs, if any
    pub local_release_id: Option<ReleaseId>,
    /// Resolve exactly this release instead of scanning history
    pub explicit_release_id: Option<ReleaseId>,
}

/// Outcome of a pull.
#[derive(Debug, Clone, PartialEq)]
pub enum PullOutcome {
    /// A release applies and differs from what the agent runs
    Resolved(Release),

    /// The newest applicable release is the one the agent already runs;
    /// nothing to do, no reconfiguration signalled
    NoChange,

    /// No published release targets this instance
    NoneApplicable,
}

/// Stateless per-request resolver over the release store.
pub struct Resolver {
    releases: Arc<dyn ReleaseStore>,
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(releases: Arc<dyn ReleaseStore>) -> Self {
        Self {
            releases,
            config: ResolverConfig::default(),
        }
    }

    /// Override the default configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve the release applying to this agent now.
    pub async fn pull(&self, req: PullRequest) -> Result<PullOutcome> {
        match &req.explicit_release_id {
            Some(release_id) => self.resolve_explicit(&req, release_id.clone()).await,
            None => self.scan_history(&req).await,
        }
    }

    /// Explicit-id mode: fetch, verify, match.
    async fn resolve_explicit(
        &self,
        req: &PullRequest,
        release_id: ReleaseId,
    ) -> Result<PullOutcome> {
        let release = self
            .releases
            .get_release(&release_id)
            .await?
            .ok_or_else(|| ResolverError::NotFound(release_id.clone()))?;
        self.check_linkage(req, &release)?;

        if release.state != ReleaseState::Published {
            return Err(ResolverError::NotPublished {
                release_id,
                state: release.state,
            });
        }

        // Broadcast short-circuit; a targeted rule must match the instance.
        // A non-match means "no applicable release", not an error.
        if release.strategy.is_empty() || release.strategy.matches(&req.instance) {
            debug!(release = %release.id, serial = release.serial, "explicit pull resolved");
            Ok(PullOutcome::Resolved(release))
        } else {
            Ok(PullOutcome::NoneApplicable)
        }
    }

    /// Newest-release scan: page through history newest first until a
    /// published release matches this instance.
    ///
    /// The scan never assumes the first page contains the eventual match; it
    /// continues page by page until a match or the end of history. Each
    /// fetch asks for one row beyond the page so the final page is detected
    /// in the same round, keeping a no-match scan over N rows at
    /// ceil(N / page_size) fetches even when N is an exact multiple.
    /// History older than the agent's local release is not fetched: the
    /// local serial is an inclusive lower bound, so the local release itself
    /// can still be matched and reported as no change.
    async fn scan_history(&self, req: &PullRequest) -> Result<PullOutcome> {
        let min_serial = match &req.local_release_id {
            Some(local_id) => self
                .releases
                .get_release(local_id)
                .await?
                .map(|local| local.serial),
            None => None,
        };

        let page_size = self.config.page_size.max(1);
        let mut offset = 0;
        let mut rounds = 0;
        loop {
            let mut page = self
                .releases
                .list_releases_desc(&req.cfgset_id, min_serial, offset, page_size + 1)
                .await?;
            rounds += 1;
            let has_more = page.len() > page_size;
            page.truncate(page_size);

            for release in page {
                self.check_linkage(req, &release)?;
                if release.state != ReleaseState::Published {
                    continue;
                }
                if release.strategy.is_empty() || release.strategy.matches(&req.instance) {
                    if req.local_release_id.as_ref() == Some(&release.id) {
                        debug!(release = %release.id, rounds, "agent already on newest match");
                        return Ok(PullOutcome::NoChange);
                    }
                    debug!(release = %release.id, serial = release.serial, rounds, "scan resolved");
                    return Ok(PullOutcome::Resolved(release));
                }
            }

            if !has_more {
                debug!(rounds, "history exhausted, no applicable release");
                return Ok(PullOutcome::NoneApplicable);
            }
            offset += page_size;
        }
    }

    /// Verify a fetched row belongs to the request's business/app/cfgset.
    ///
    /// A mismatch is a server-side data-integrity fault, fatal to the call;
    /// skipping it silently would hide corruption behind "no match".
    fn check_linkage(&self, req: &PullRequest, release: &Release) -> Result<()> {
        if release.business_id != req.business_id
            || release.app_id != req.app_id
            || release.cfgset_id != req.cfgset_id
        {
            warn!(
                release = %release.id,
                business = %release.business_id,
                app = %release.app_id,
                cfgset = %release.cfgset_id,
                "release row does not match request linkage"
            );
            return Err(ResolverError::Consistency(format!(
                "release {} does not belong to business {} / app {} / config set {}",
                release.id, req.business_id, req.app_id, req.cfgset_id
            )));
        }
        Ok(())
    }
}
