//! Caller-facing facade
//!
//! One entry point over the commit, strategy, release, and pull services.
//! The facade owns the cross-cutting request policy: size and length limits
//! are checked before any store access, and every wrapped call runs under
//! the configured deadline so a stalled store never wedges a caller.

use crate::config::AccessConfig;
use crate::error::{AccessError, Result};
use confpipe_commit::{
    CommitService, CreateCommitRequest, CreateMultiCommitRequest, MultiCommitOutcome,
    MultiCommitService, TemplateRenderer,
};
use confpipe_release::{
    CreateMultiReleaseRequest, CreateReleaseRequest, ReleaseService, ReloadRouter, ReloadTarget,
    SignalBus,
};
use confpipe_resolver::{PullOutcome, PullRequest, Resolver};
use confpipe_store::{
    AppStore, BusinessStore, CfgsetStore, CommitStore, MultiCommitStore, MultiReleaseStore,
    ReleaseStore, StrategyStore,
};
use confpipe_strategy::{CreateStrategyRequest, StrategyService};
use confpipe_types::{
    BusinessId, Commit, CommitId, ContentSource, MultiCommit, MultiCommitId, MultiRelease,
    MultiReleaseId, Release, ReleaseId, Strategy, StrategyId,
};
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::warn;

/// Facade over the pipeline services.
pub struct AccessService {
    commits: Arc<CommitService>,
    multi_commits: Arc<MultiCommitService>,
    strategies: Arc<StrategyService>,
    releases: Arc<ReleaseService>,
    resolver: Arc<Resolver>,
    config: AccessConfig,
}

impl AccessService {
    pub fn new(
        commits: Arc<CommitService>,
        multi_commits: Arc<MultiCommitService>,
        strategies: Arc<StrategyService>,
        releases: Arc<ReleaseService>,
        resolver: Arc<Resolver>,
        config: AccessConfig,
    ) -> Self {
        Self {
            commits,
            multi_commits,
            strategies,
            releases,
            resolver,
            config,
        }
    }

    /// Wire the full service stack over one store.
    pub fn wire<S>(
        store: Arc<S>,
        renderer: Arc<dyn TemplateRenderer>,
        bus: Arc<dyn SignalBus>,
        router: Arc<ReloadRouter>,
        config: AccessConfig,
    ) -> Self
    where
        S: BusinessStore
            + AppStore
            + CfgsetStore
            + CommitStore
            + MultiCommitStore
            + StrategyStore
            + ReleaseStore
            + MultiReleaseStore
            + 'static,
    {
        let commits = Arc::new(CommitService::new(store.clone(), store.clone(), renderer));
        let multi_commits = Arc::new(MultiCommitService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            commits.clone(),
        ));
        let strategies = Arc::new(
            StrategyService::new(store.clone(), store.clone())
                .with_limits(config.strategy_limits.clone()),
        );
        let releases = Arc::new(ReleaseService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            bus,
            router,
        ));
        let resolver = Arc::new(Resolver::new(store).with_config(config.resolver.clone()));
        Self::new(commits, multi_commits, strategies, releases, resolver, config)
    }

    // Commits

    pub async fn create_commit(&self, req: CreateCommitRequest) -> Result<Commit> {
        self.check_operator(&req.operator)?;
        self.check_memo(&req.memo)?;
        self.check_source(&req.source)?;
        self.bounded("create_commit", self.commits.create(req)).await
    }

    pub async fn get_commit(&self, business_id: &BusinessId, id: &CommitId) -> Result<Commit> {
        self.bounded("get_commit", self.commits.get(business_id, id))
            .await
    }

    pub async fn confirm_commit(
        &self,
        business_id: &BusinessId,
        id: &CommitId,
        operator: &str,
    ) -> Result<Commit> {
        self.check_operator(operator)?;
        self.bounded("confirm_commit", self.commits.confirm(business_id, id, operator))
            .await
    }

    pub async fn cancel_commit(
        &self,
        business_id: &BusinessId,
        id: &CommitId,
        operator: &str,
    ) -> Result<()> {
        self.check_operator(operator)?;
        self.bounded("cancel_commit", self.commits.cancel(business_id, id, operator))
            .await
    }

    pub async fn list_commits(
        &self,
        business_id: &BusinessId,
        app_id: &confpipe_types::AppId,
        cfgset_id: &confpipe_types::CfgsetId,
    ) -> Result<Vec<Commit>> {
        self.bounded(
            "list_commits",
            self.commits.list_for_cfgset(business_id, app_id, cfgset_id),
        )
        .await
    }

    pub async fn update_commit_changelog(
        &self,
        business_id: &BusinessId,
        id: &CommitId,
        changelog: String,
    ) -> Result<()> {
        self.bounded(
            "update_commit_changelog",
            self.commits.update_changelog(business_id, id, changelog),
        )
        .await
    }

    // Multi-commits

    pub async fn create_multi_commit(
        &self,
        req: CreateMultiCommitRequest,
    ) -> Result<MultiCommitOutcome> {
        self.check_operator(&req.operator)?;
        self.check_memo(&req.memo)?;
        if req.intents.len() > self.config.limits.max_batch_entries {
            return Err(AccessError::Validation(format!(
                "multi-commit exceeds {} config set entries",
                self.config.limits.max_batch_entries
            )));
        }
        for intent in &req.intents {
            self.check_source(&intent.source)?;
        }
        self.bounded("create_multi_commit", self.multi_commits.create(req))
            .await
    }

    pub async fn get_multi_commit(
        &self,
        business_id: &BusinessId,
        id: &MultiCommitId,
    ) -> Result<MultiCommit> {
        self.bounded("get_multi_commit", self.multi_commits.get(business_id, id))
            .await
    }

    pub async fn confirm_multi_commit(
        &self,
        business_id: &BusinessId,
        id: &MultiCommitId,
        operator: &str,
    ) -> Result<MultiCommit> {
        self.check_operator(operator)?;
        self.bounded(
            "confirm_multi_commit",
            self.multi_commits.confirm(business_id, id, operator),
        )
        .await
    }

    /// Cancel a multi-commit unless it has already been confirmed; a no-op
    /// afterwards, so deferred cleanup can always call it.
    pub async fn cancel_multi_commit(
        &self,
        business_id: &BusinessId,
        id: &MultiCommitId,
        operator: &str,
    ) -> Result<()> {
        self.check_operator(operator)?;
        self.bounded(
            "cancel_multi_commit",
            self.multi_commits.cancel_if_unconfirmed(business_id, id, operator),
        )
        .await
    }

    // Strategies

    pub async fn create_strategy(&self, req: CreateStrategyRequest) -> Result<Strategy> {
        self.check_operator(&req.operator)?;
        self.check_memo(&req.memo)?;
        self.bounded("create_strategy", self.strategies.create(req))
            .await
    }

    pub async fn get_strategy(
        &self,
        business_id: &BusinessId,
        id: &StrategyId,
    ) -> Result<Strategy> {
        self.bounded("get_strategy", self.strategies.get(business_id, id))
            .await
    }

    // Releases

    pub async fn create_release(&self, req: CreateReleaseRequest) -> Result<Release> {
        self.check_operator(&req.operator)?;
        self.check_memo(&req.memo)?;
        self.bounded("create_release", self.releases.create(req)).await
    }

    pub async fn get_release(&self, business_id: &BusinessId, id: &ReleaseId) -> Result<Release> {
        self.bounded("get_release", self.releases.get(business_id, id))
            .await
    }

    /// Dry-run publication check; fails with the same codes publish would.
    pub async fn prepare_publish(
        &self,
        business_id: &BusinessId,
        id: &ReleaseId,
    ) -> Result<Release> {
        self.bounded("prepare_publish", self.releases.prepare_publish(business_id, id))
            .await
    }

    pub async fn publish(
        &self,
        business_id: &BusinessId,
        id: &ReleaseId,
        operator: &str,
    ) -> Result<Release> {
        self.check_operator(operator)?;
        self.bounded("publish", self.releases.publish(business_id, id, operator))
            .await
    }

    /// Re-notify agents of a release already flipped to Rollbacked.
    pub async fn rollback(
        &self,
        business_id: &BusinessId,
        id: &ReleaseId,
        operator: &str,
    ) -> Result<()> {
        self.check_operator(operator)?;
        self.bounded("rollback", self.releases.rollback(business_id, id, operator))
            .await
    }

    pub async fn create_multi_release(
        &self,
        req: CreateMultiReleaseRequest,
    ) -> Result<MultiRelease> {
        self.check_operator(&req.operator)?;
        self.check_memo(&req.memo)?;
        self.bounded("create_multi_release", self.releases.create_multi(req))
            .await
    }

    pub async fn get_multi_release(
        &self,
        business_id: &BusinessId,
        id: &MultiReleaseId,
    ) -> Result<MultiRelease> {
        self.bounded("get_multi_release", self.releases.get_multi(business_id, id))
            .await
    }

    pub async fn publish_multi(
        &self,
        business_id: &BusinessId,
        id: &MultiReleaseId,
        operator: &str,
    ) -> Result<MultiRelease> {
        self.check_operator(operator)?;
        self.bounded(
            "publish_multi",
            self.releases.publish_multi(business_id, id, operator),
        )
        .await
    }

    pub async fn reload(
        &self,
        business_id: &BusinessId,
        target: ReloadTarget,
        operator: &str,
        rollback: bool,
    ) -> Result<()> {
        self.check_operator(operator)?;
        self.bounded(
            "reload",
            self.releases.reload(business_id, target, operator, rollback),
        )
        .await
    }

    // Pull path

    pub async fn pull(&self, req: PullRequest) -> Result<PullOutcome> {
        if req.instance.ip.is_empty() {
            return Err(AccessError::Validation(
                "pull requires the agent's instance ip".into(),
            ));
        }
        self.bounded("pull", self.resolver.pull(req)).await
    }

    async fn bounded<T, E, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, E>>,
        AccessError: From<E>,
    {
        match timeout(self.config.call_timeout, fut).await {
            Ok(out) => out.map_err(AccessError::from),
            Err(_) => {
                warn!(operation, deadline = ?self.config.call_timeout, "call exceeded deadline");
                Err(AccessError::Timeout {
                    operation,
                    deadline: self.config.call_timeout,
                })
            }
        }
    }

    fn check_operator(&self, operator: &str) -> Result<()> {
        if operator.is_empty() {
            return Err(AccessError::Validation("operator is required".into()));
        }
        if operator.len() > self.config.limits.max_operator_len {
            return Err(AccessError::Validation(format!(
                "operator exceeds {} characters",
                self.config.limits.max_operator_len
            )));
        }
        Ok(())
    }

    fn check_memo(&self, memo: &str) -> Result<()> {
        if memo.len() > self.config.limits.max_memo_len {
            return Err(AccessError::Validation(format!(
                "memo exceeds {} characters",
                self.config.limits.max_memo_len
            )));
        }
        Ok(())
    }

    fn check_source(&self, source: &ContentSource) -> Result<()> {
        let size = match source {
            ContentSource::Raw { content } => content.len(),
            ContentSource::Template { template_id } => template_id.len(),
            ContentSource::Inline { template, rule } => template.len() + rule.len(),
        };
        if size > self.config.limits.max_content_bytes {
            return Err(AccessError::Validation(format!(
                "content exceeds {} bytes",
                self.config.limits.max_content_bytes
            )));
        }
        Ok(())
    }
}
