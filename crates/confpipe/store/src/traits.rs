//! Store traits, one per entity family
//!
//! The production deployment backs these with a sharded relational store;
//! the in-memory implementation in this crate serves development and tests.
//! Every call is synchronous from the caller's point of view and bounded by
//! the caller's deadline; the store does not retry.

use crate::error::Result;
use async_trait::async_trait;
use confpipe_types::{
    App, AppId, Business, BusinessId, CfgsetId, Commit, CommitId, CommitState, ConfigSet,
    MultiCommit, MultiCommitId, MultiRelease, MultiReleaseId, Release, ReleaseId, ReleaseState,
    Strategy, StrategyId,
};

/// Business rows
#[async_trait]
pub trait BusinessStore: Send + Sync {
    /// Insert a business; `Conflict` if the id already exists
    async fn create_business(&self, business: &Business) -> Result<()>;

    /// Fetch a business by id
    async fn get_business(&self, id: &BusinessId) -> Result<Option<Business>>;
}

/// App rows
#[async_trait]
pub trait AppStore: Send + Sync {
    /// Insert an app; `Conflict` if the id already exists
    async fn create_app(&self, app: &App) -> Result<()>;

    /// Fetch an app by id
    async fn get_app(&self, id: &AppId) -> Result<Option<App>>;
}

/// Config set rows
#[async_trait]
pub trait CfgsetStore: Send + Sync {
    /// Insert a config set; `Conflict` if the id already exists
    async fn create_cfgset(&self, cfgset: &ConfigSet) -> Result<()>;

    /// Fetch a config set by id
    async fn get_cfgset(&self, id: &CfgsetId) -> Result<Option<ConfigSet>>;

    /// All config sets belonging to an app
    async fn list_cfgsets_for_app(&self, app_id: &AppId) -> Result<Vec<ConfigSet>>;
}

/// Commit rows
#[async_trait]
pub trait CommitStore: Send + Sync {
    /// Insert a commit; `Conflict` if the id already exists
    async fn create_commit(&self, commit: &Commit) -> Result<()>;

    /// Fetch a commit by id
    async fn get_commit(&self, id: &CommitId) -> Result<Option<Commit>>;

    /// Flip commit state; `NotFound` if the row is missing
    async fn update_commit_state(&self, id: &CommitId, state: CommitState) -> Result<()>;

    /// Attach rendered content produced at confirm time
    async fn set_commit_rendered(&self, id: &CommitId, rendered: Vec<u8>) -> Result<()>;

    /// Replace the change log of an unconfirmed commit
    async fn update_commit_changelog(&self, id: &CommitId, changelog: String) -> Result<()>;

    /// All commits for a config set, newest first
    async fn list_commits_for_cfgset(&self, cfgset_id: &CfgsetId) -> Result<Vec<Commit>>;
}

/// Multi-commit rows
#[async_trait]
pub trait MultiCommitStore: Send + Sync {
    /// Insert a multi-commit; `Conflict` if the id already exists
    async fn create_multi_commit(&self, multi: &MultiCommit) -> Result<()>;

    /// Fetch a multi-commit by id
    async fn get_multi_commit(&self, id: &MultiCommitId) -> Result<Option<MultiCommit>>;

    /// Flip aggregate state; `NotFound` if the row is missing
    async fn update_multi_commit_state(&self, id: &MultiCommitId, state: CommitState)
        -> Result<()>;
}

/// Strategy rows
#[async_trait]
pub trait StrategyStore: Send + Sync {
    /// Insert a strategy; `Conflict` if the id already exists
    async fn create_strategy(&self, strategy: &Strategy) -> Result<()>;

    /// Fetch a strategy by id
    async fn get_strategy(&self, id: &StrategyId) -> Result<Option<Strategy>>;

    /// Look up a strategy by app-scoped name
    async fn find_strategy_by_name(&self, app_id: &AppId, name: &str)
        -> Result<Option<Strategy>>;
}

/// Release rows
#[async_trait]
pub trait ReleaseStore: Send + Sync {
    /// Insert a release; the store assigns the per-config-set serial and
    /// returns the stored row
    async fn create_release(&self, release: Release) -> Result<Release>;

    /// Fetch a release by id
    async fn get_release(&self, id: &ReleaseId) -> Result<Option<Release>>;

    /// Flip release state; `NotFound` if the row is missing.
    ///
    /// This is also the administrative path that marks a release Rollbacked
    /// before the pipeline re-emits the rollback signal.
    async fn update_release_state(&self, id: &ReleaseId, state: ReleaseState) -> Result<()>;

    /// One page of a config set's release history, newest serial first.
    ///
    /// `min_serial` is an inclusive lower bound; rows older than it are not
    /// returned. `offset` skips already-scanned rows so a caller can walk
    /// the history page by page.
    async fn list_releases_desc(
        &self,
        cfgset_id: &CfgsetId,
        min_serial: Option<u64>,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Release>>;
}

/// Multi-release rows
#[async_trait]
pub trait MultiReleaseStore: Send + Sync {
    /// Insert a multi-release; `Conflict` if the id already exists
    async fn create_multi_release(&self, multi: &MultiRelease) -> Result<()>;

    /// Fetch a multi-release by id
    async fn get_multi_release(&self, id: &MultiReleaseId) -> Result<Option<MultiRelease>>;

    /// Flip aggregate state; `NotFound` if the row is missing
    async fn update_multi_release_state(
        &self,
        id: &MultiReleaseId,
        state: ReleaseState,
    ) -> Result<()>;
}
