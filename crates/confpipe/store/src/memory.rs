//! In-memory store for development and testing.
//!
//! Implements every store trait over DashMap. Not suitable for production
//! use; the deployed pipeline talks to the sharded relational store through
//! the same traits.

use crate::error::{Result, StoreError};
use crate::traits::{
    AppStore, BusinessStore, CfgsetStore, CommitStore, MultiCommitStore, MultiReleaseStore,
    ReleaseStore, StrategyStore,
};
use async_trait::async_trait;
use chrono::Utc;
use confpipe_types::{
    App, AppId, Business, BusinessId, CfgsetId, Commit, CommitId, CommitState, ConfigSet,
    MultiCommit, MultiCommitId, MultiRelease, MultiReleaseId, Release, ReleaseId, ReleaseState,
    Strategy, StrategyId,
};
use dashmap::DashMap;

/// In-memory implementation of all store traits.
#[derive(Default)]
pub struct InMemoryStore {
    businesses: DashMap<BusinessId, Business>,
    apps: DashMap<AppId, App>,
    cfgsets: DashMap<CfgsetId, ConfigSet>,
    commits: DashMap<CommitId, Commit>,
    multi_commits: DashMap<MultiCommitId, MultiCommit>,
    strategies: DashMap<StrategyId, Strategy>,
    releases: DashMap<ReleaseId, Release>,
    multi_releases: DashMap<MultiReleaseId, MultiRelease>,

    /// Next serial per config set; serials start at 1
    serials: DashMap<CfgsetId, u64>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BusinessStore for InMemoryStore {
    async fn create_business(&self, business: &Business) -> Result<()> {
        if self.businesses.contains_key(&business.id) {
            return Err(StoreError::Conflict(business.id.to_string()));
        }
        self.businesses.insert(business.id.clone(), business.clone());
        Ok(())
    }

    async fn get_business(&self, id: &BusinessId) -> Result<Option<Business>> {
        Ok(self.businesses.get(id).map(|b| b.clone()))
    }
}

#[async_trait]
impl AppStore for InMemoryStore {
    async fn create_app(&self, app: &App) -> Result<()> {
        if self.apps.contains_key(&app.id) {
            return Err(StoreError::Conflict(app.id.to_string()));
        }
        self.apps.insert(app.id.clone(), app.clone());
        Ok(())
    }

    async fn get_app(&self, id: &AppId) -> Result<Option<App>> {
        Ok(self.apps.get(id).map(|a| a.clone()))
    }
}

#[async_trait]
impl CfgsetStore for InMemoryStore {
    async fn create_cfgset(&self, cfgset: &ConfigSet) -> Result<()> {
        if self.cfgsets.contains_key(&cfgset.id) {
            return Err(StoreError::Conflict(cfgset.id.to_string()));
        }
        self.cfgsets.insert(cfgset.id.clone(), cfgset.clone());
        Ok(())
    }

    async fn get_cfgset(&self, id: &CfgsetId) -> Result<Option<ConfigSet>> {
        Ok(self.cfgsets.get(id).map(|c| c.clone()))
    }

    async fn list_cfgsets_for_app(&self, app_id: &AppId) -> Result<Vec<ConfigSet>> {
        let mut out: Vec<ConfigSet> = self
            .cfgsets
            .iter()
            .filter(|c| &c.app_id == app_id)
            .map(|c| c.clone())
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(out)
    }
}

#[async_trait]
impl CommitStore for InMemoryStore {
    async fn create_commit(&self, commit: &Commit) -> Result<()> {
        if self.commits.contains_key(&commit.id) {
            return Err(StoreError::Conflict(commit.id.to_string()));
        }
        self.commits.insert(commit.id.clone(), commit.clone());
        Ok(())
    }

    async fn get_commit(&self, id: &CommitId) -> Result<Option<Commit>> {
        Ok(self.commits.get(id).map(|c| c.clone()))
    }

    async fn update_commit_state(&self, id: &CommitId, state: CommitState) -> Result<()> {
        match self.commits.get_mut(id) {
            Some(mut commit) => {
                commit.state = state;
                commit.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn set_commit_rendered(&self, id: &CommitId, rendered: Vec<u8>) -> Result<()> {
        match self.commits.get_mut(id) {
            Some(mut commit) => {
                commit.rendered = Some(rendered);
                commit.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn update_commit_changelog(&self, id: &CommitId, changelog: String) -> Result<()> {
        match self.commits.get_mut(id) {
            Some(mut commit) => {
                commit.changelog = changelog;
                commit.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn list_commits_for_cfgset(&self, cfgset_id: &CfgsetId) -> Result<Vec<Commit>> {
        let mut out: Vec<Commit> = self
            .commits
            .iter()
            .filter(|c| &c.cfgset_id == cfgset_id)
            .map(|c| c.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }
}

#[async_trait]
impl MultiCommitStore for InMemoryStore {
    async fn create_multi_commit(&self, multi: &MultiCommit) -> Result<()> {
        if self.multi_commits.contains_key(&multi.id) {
            return Err(StoreError::Conflict(multi.id.to_string()));
        }
        self.multi_commits.insert(multi.id.clone(), multi.clone());
        Ok(())
    }

    async fn get_multi_commit(&self, id: &MultiCommitId) -> Result<Option<MultiCommit>> {
        Ok(self.multi_commits.get(id).map(|m| m.clone()))
    }

    async fn update_multi_commit_state(
        &self,
        id: &MultiCommitId,
        state: CommitState,
    ) -> Result<()> {
        match self.multi_commits.get_mut(id) {
            Some(mut multi) => {
                multi.state = state;
                multi.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}

#[async_trait]
impl StrategyStore for InMemoryStore {
    async fn create_strategy(&self, strategy: &Strategy) -> Result<()> {
        if self.strategies.contains_key(&strategy.id) {
            return Err(StoreError::Conflict(strategy.id.to_string()));
        }
        self.strategies.insert(strategy.id.clone(), strategy.clone());
        Ok(())
    }

    async fn get_strategy(&self, id: &StrategyId) -> Result<Option<Strategy>> {
        Ok(self.strategies.get(id).map(|s| s.clone()))
    }

    async fn find_strategy_by_name(
        &self,
        app_id: &AppId,
        name: &str,
    ) -> Result<Option<Strategy>> {
        Ok(self
            .strategies
            .iter()
            .find(|s| &s.app_id == app_id && s.name == name)
            .map(|s| s.clone()))
    }
}

#[async_trait]
impl ReleaseStore for InMemoryStore {
    async fn create_release(&self, mut release: Release) -> Result<Release> {
        if self.releases.contains_key(&release.id) {
            return Err(StoreError::Conflict(release.id.to_string()));
        }

        // Serial assignment and insertion happen under the entry lock so two
        // concurrent creations for the same config set cannot share a serial.
        let mut next = self
            .serials
            .entry(release.cfgset_id.clone())
            .or_insert(0);
        *next += 1;
        release.serial = *next;
        self.releases.insert(release.id.clone(), release.clone());
        drop(next);

        Ok(release)
    }

    async fn get_release(&self, id: &ReleaseId) -> Result<Option<Release>> {
        Ok(self.releases.get(id).map(|r| r.clone()))
    }

    async fn update_release_state(&self, id: &ReleaseId, state: ReleaseState) -> Result<()> {
        match self.releases.get_mut(id) {
            Some(mut release) => {
                release.state = state;
                release.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn list_releases_desc(
        &self,
        cfgset_id: &CfgsetId,
        min_serial: Option<u64>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>> {
        let floor = min_serial.unwrap_or(0);
        let mut rows: Vec<Release> = self
            .releases
            .iter()
            .filter(|r| &r.cfgset_id == cfgset_id && r.serial >= floor)
            .map(|r| r.clone())
            .collect();
        rows.sort_by(|a, b| b.serial.cmp(&a.serial));
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait]
impl MultiReleaseStore for InMemoryStore {
    async fn create_multi_release(&self, multi: &MultiRelease) -> Result<()> {
        if self.multi_releases.contains_key(&multi.id) {
            return Err(StoreError::Conflict(multi.id.to_string()));
        }
        self.multi_releases.insert(multi.id.clone(), multi.clone());
        Ok(())
    }

    async fn get_multi_release(&self, id: &MultiReleaseId) -> Result<Option<MultiRelease>> {
        Ok(self.multi_releases.get(id).map(|m| m.clone()))
    }

    async fn update_multi_release_state(
        &self,
        id: &MultiReleaseId,
        state: ReleaseState,
    ) -> Result<()> {
        match self.multi_releases.get_mut(id) {
            Some(mut multi) => {
                multi.state = state;
                multi.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }
}
