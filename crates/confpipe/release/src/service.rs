//! Release and multi-release lifecycle
//!
//! A release binds one business + app + config set + commit + strategy into
//! a publishable unit. Publication is a precondition check, a state flip in
//! the store, and a signal; rollback is split in two so re-notifying live
//! agents never re-derives state: the administrative path flips the row to
//! Rollbacked first, then this service re-emits the rollback signal, which
//! makes the notify step safely repeatable.

use crate::channel::{ReloadInstruction, ReloadRouter, ReleaseRef};
use crate::error::{ReleaseError, Result};
use crate::signal::SignalBus;
use chrono::Utc;
use confpipe_store::{
    AppStore, CfgsetStore, CommitStore, MultiCommitStore, MultiReleaseStore, ReleaseStore,
    StrategyStore,
};
use confpipe_types::{
    App, BusinessId, CommitState, ConfigSet, MultiRelease, MultiReleaseId, Release, ReleaseId,
    ReleaseState, Signal, SignalKind, StrategyRule,
};
use std::sync::Arc;
use tracing::info;

/// Request to create one release.
#[derive(Debug, Clone)]
pub struct CreateReleaseRequest {
    pub business_id: confpipe_types::BusinessId,
    pub app_id: confpipe_types::AppId,
    pub cfgset_id: confpipe_types::CfgsetId,
    pub commit_id: confpipe_types::CommitId,
    pub strategy_id: Option<confpipe_types::StrategyId>,
    pub name: String,
    pub operator: String,
    pub memo: String,
}

/// Request to create a multi-release from a confirmed multi-commit.
#[derive(Debug, Clone)]
pub struct CreateMultiReleaseRequest {
    pub business_id: confpipe_types::BusinessId,
    pub app_id: confpipe_types::AppId,
    pub multi_commit_id: confpipe_types::MultiCommitId,
    pub strategy_id: Option<confpipe_types::StrategyId>,
    pub name: String,
    pub operator: String,
    pub memo: String,
}

/// What a reload request points at.
#[derive(Debug, Clone)]
pub enum ReloadTarget {
    Release(ReleaseId),
    MultiRelease(MultiReleaseId),
}

/// Release lifecycle service.
pub struct ReleaseService {
    releases: Arc<dyn ReleaseStore>,
    multi_releases: Arc<dyn MultiReleaseStore>,
    commits: Arc<dyn CommitStore>,
    multi_commits: Arc<dyn MultiCommitStore>,
    cfgsets: Arc<dyn CfgsetStore>,
    apps: Arc<dyn AppStore>,
    strategies: Arc<dyn StrategyStore>,
    bus: Arc<dyn SignalBus>,
    router: Arc<ReloadRouter>,
}

impl ReleaseService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        releases: Arc<dyn ReleaseStore>,
        multi_releases: Arc<dyn MultiReleaseStore>,
        commits: Arc<dyn CommitStore>,
        multi_commits: Arc<dyn MultiCommitStore>,
        cfgsets: Arc<dyn CfgsetStore>,
        apps: Arc<dyn AppStore>,
        strategies: Arc<dyn StrategyStore>,
        bus: Arc<dyn SignalBus>,
        router: Arc<ReloadRouter>,
    ) -> Self {
        Self {
            releases,
            multi_releases,
            commits,
            multi_commits,
            cfgsets,
            apps,
            strategies,
            bus,
            router,
        }
    }

    /// Create a release bound to a confirmed commit.
    ///
    /// The strategy rule is copied onto the release; strategies are
    /// immutable once referenced, so the copy cannot drift. The store
    /// assigns the per-config-set serial.
    pub async fn create(&self, req: CreateReleaseRequest) -> Result<Release> {
        if req.name.is_empty() {
            return Err(ReleaseError::Validation("release name is required".into()));
        }

        let commit = self
            .commits
            .get_commit(&req.commit_id)
            .await?
            .ok_or_else(|| ReleaseError::CommitNotFound(req.commit_id.clone()))?;
        if commit.business_id != req.business_id
            || commit.app_id != req.app_id
            || commit.cfgset_id != req.cfgset_id
        {
            return Err(ReleaseError::Consistency(format!(
                "commit {} does not belong to business {} / app {} / config set {}",
                req.commit_id, req.business_id, req.app_id, req.cfgset_id
            )));
        }
        if commit.state != CommitState::Confirmed {
            return Err(ReleaseError::CommitNotConfirmed {
                commit_id: req.commit_id,
                state: commit.state,
            });
        }

        let rule = self
            .resolve_strategy_rule(&req.business_id, &req.app_id, req.strategy_id.as_ref())
            .await?;

        let now = Utc::now();
        let release = Release {
            id: ReleaseId::generate(),
            business_id: req.business_id,
            app_id: req.app_id,
            cfgset_id: req.cfgset_id,
            commit_id: req.commit_id,
            strategy_id: req.strategy_id,
            strategy: rule,
            name: req.name,
            serial: 0,
            state: ReleaseState::Init,
            operator: req.operator,
            memo: req.memo,
            created_at: now,
            updated_at: now,
        };
        let release = self.releases.create_release(release).await?;

        info!(release = %release.id, cfgset = %release.cfgset_id, serial = release.serial, "release created");
        Ok(release)
    }

    /// Fetch a release, verifying business ownership.
    pub async fn get(&self, business_id: &BusinessId, id: &ReleaseId) -> Result<Release> {
        let release = self
            .releases
            .get_release(id)
            .await?
            .ok_or_else(|| ReleaseError::NotFound(id.clone()))?;
        if &release.business_id != business_id {
            return Err(ReleaseError::Consistency(format!(
                "release {} belongs to {}, not {}",
                id, release.business_id, business_id
            )));
        }
        Ok(release)
    }

    /// Precondition check for publication; no side effects.
    ///
    /// Fails with a distinct code for an already-rollbacked release, an
    /// already-canceled release, and an unconfirmed backing commit, so a
    /// caller can validate before committing to the state change.
    pub async fn prepare_publish(
        &self,
        business_id: &BusinessId,
        id: &ReleaseId,
    ) -> Result<Release> {
        let release = self.get(business_id, id).await?;
        match release.state {
            ReleaseState::Rollbacked => {
                return Err(ReleaseError::AlreadyRollbacked(id.clone()))
            }
            ReleaseState::Canceled => return Err(ReleaseError::AlreadyCanceled(id.clone())),
            ReleaseState::Init | ReleaseState::Published => {}
        }

        let commit = self
            .commits
            .get_commit(&release.commit_id)
            .await?
            .ok_or_else(|| {
                ReleaseError::Consistency(format!(
                    "release {} references missing commit {}",
                    id, release.commit_id
                ))
            })?;
        if commit.state != CommitState::Confirmed {
            return Err(ReleaseError::CommitNotConfirmed {
                commit_id: release.commit_id.clone(),
                state: commit.state,
            });
        }

        Ok(release)
    }

    /// Publish a release: precondition check, state flip, publish signal.
    pub async fn publish(
        &self,
        business_id: &BusinessId,
        id: &ReleaseId,
        operator: &str,
    ) -> Result<Release> {
        let release = self.prepare_publish(business_id, id).await?;
        self.commit_publish(release, operator).await
    }

    /// Second half of publication: the state flip and the signal, after the
    /// precondition check has already passed.
    async fn commit_publish(&self, mut release: Release, operator: &str) -> Result<Release> {
        self.releases
            .update_release_state(&release.id, ReleaseState::Published)
            .await?;
        release.state = ReleaseState::Published;

        let cfgset = self.fetch_cfgset_of(&release).await?;
        self.bus
            .emit(self.signal_for(SignalKind::Publish, &release, &cfgset))
            .await?;

        info!(release = %release.id, serial = release.serial, operator, "release published");
        Ok(release)
    }

    /// Re-emit the rollback signal for a release already marked Rollbacked.
    ///
    /// The authoritative state flip happens on the administrative store path
    /// beforehand; this call only verifies it and re-notifies, so it can be
    /// replayed safely.
    pub async fn rollback(
        &self,
        business_id: &BusinessId,
        id: &ReleaseId,
        operator: &str,
    ) -> Result<()> {
        let release = self.get(business_id, id).await?;
        if release.state != ReleaseState::Rollbacked {
            return Err(ReleaseError::NotRollbacked {
                release_id: id.clone(),
                state: release.state,
            });
        }

        let cfgset = self.fetch_cfgset_of(&release).await?;
        self.bus
            .emit(self.signal_for(SignalKind::Rollback, &release, &cfgset))
            .await?;

        info!(release = %id, serial = release.serial, operator, "rollback signalled");
        Ok(())
    }

    /// Create a multi-release from a confirmed multi-commit.
    ///
    /// Every referenced sub-commit must be independently confirmed; one
    /// sub-release is created per config set entry.
    pub async fn create_multi(&self, req: CreateMultiReleaseRequest) -> Result<MultiRelease> {
        let multi_commit = self
            .multi_commits
            .get_multi_commit(&req.multi_commit_id)
            .await?
            .ok_or_else(|| ReleaseError::MultiCommitNotFound(req.multi_commit_id.clone()))?;
        if multi_commit.business_id != req.business_id || multi_commit.app_id != req.app_id {
            return Err(ReleaseError::Consistency(format!(
                "multi-commit {} does not belong to business {} / app {}",
                req.multi_commit_id, req.business_id, req.app_id
            )));
        }
        if multi_commit.state != CommitState::Confirmed {
            return Err(ReleaseError::MultiCommitNotConfirmed {
                multi_commit_id: req.multi_commit_id,
                state: multi_commit.state,
            });
        }

        // Fail fast on a bad strategy before creating any sub-release; the
        // per-release path re-validates and copies the rule for each one.
        self.resolve_strategy_rule(&req.business_id, &req.app_id, req.strategy_id.as_ref())
            .await?;

        let mut sub_releases = Vec::with_capacity(multi_commit.sub_commits.len());
        for sub in &multi_commit.sub_commits {
            let release = self
                .create(CreateReleaseRequest {
                    business_id: req.business_id.clone(),
                    app_id: req.app_id.clone(),
                    cfgset_id: sub.cfgset_id.clone(),
                    commit_id: sub.commit_id.clone(),
                    strategy_id: req.strategy_id.clone(),
                    name: req.name.clone(),
                    operator: req.operator.clone(),
                    memo: req.memo.clone(),
                })
                .await?;
            sub_releases.push(release.id);
        }
        let now = Utc::now();
        let multi_release = MultiRelease {
            id: MultiReleaseId::generate(),
            business_id: req.business_id,
            app_id: req.app_id,
            multi_commit_id: req.multi_commit_id,
            strategy_id: req.strategy_id,
            name: req.name,
            sub_releases,
            state: ReleaseState::Init,
            operator: req.operator,
            memo: req.memo,
            created_at: now,
            updated_at: now,
        };
        self.multi_releases
            .create_multi_release(&multi_release)
            .await?;

        info!(
            multi_release = %multi_release.id,
            subs = multi_release.sub_releases.len(),
            "multi-release created"
        );
        Ok(multi_release)
    }

    /// Fetch a multi-release, verifying business ownership.
    pub async fn get_multi(
        &self,
        business_id: &BusinessId,
        id: &MultiReleaseId,
    ) -> Result<MultiRelease> {
        let multi = self
            .multi_releases
            .get_multi_release(id)
            .await?
            .ok_or_else(|| ReleaseError::MultiNotFound(id.clone()))?;
        if &multi.business_id != business_id {
            return Err(ReleaseError::Consistency(format!(
                "multi-release {} belongs to {}, not {}",
                id, multi.business_id, business_id
            )));
        }
        Ok(multi)
    }

    /// Publish every sub-release of a multi-release, then the aggregate.
    ///
    /// All sub-releases are precondition-checked before any state flips, so
    /// a rejected sub leaves every other sub untouched and unsignalled.
    pub async fn publish_multi(
        &self,
        business_id: &BusinessId,
        id: &MultiReleaseId,
        operator: &str,
    ) -> Result<MultiRelease> {
        let mut multi = self.get_multi(business_id, id).await?;
        match multi.state {
            ReleaseState::Rollbacked => {
                return Err(ReleaseError::MultiAlreadyRollbacked(id.clone()))
            }
            ReleaseState::Canceled => return Err(ReleaseError::MultiAlreadyCanceled(id.clone())),
            ReleaseState::Init | ReleaseState::Published => {}
        }

        let mut prepared = Vec::with_capacity(multi.sub_releases.len());
        for sub_id in &multi.sub_releases {
            prepared.push(self.prepare_publish(business_id, sub_id).await?);
        }
        for release in prepared {
            self.commit_publish(release, operator).await?;
        }
        self.multi_releases
            .update_multi_release_state(id, ReleaseState::Published)
            .await?;
        multi.state = ReleaseState::Published;

        info!(multi_release = %id, operator, "multi-release published");
        Ok(multi)
    }

    /// Forward a reload instruction for a release or multi-release to the
    /// owning app's delivery-channel controller.
    ///
    /// Every covered release must be Published or Rollbacked; anything else
    /// never reached agents and has nothing to reload.
    pub async fn reload(
        &self,
        business_id: &BusinessId,
        target: ReloadTarget,
        operator: &str,
        rollback: bool,
    ) -> Result<()> {
        let releases = match &target {
            ReloadTarget::Release(id) => vec![self.get(business_id, id).await?],
            ReloadTarget::MultiRelease(id) => {
                let multi = self.get_multi(business_id, id).await?;
                let mut subs = Vec::with_capacity(multi.sub_releases.len());
                for sub_id in &multi.sub_releases {
                    subs.push(self.get(business_id, sub_id).await?);
                }
                subs
            }
        };
        let first = releases
            .first()
            .ok_or_else(|| ReleaseError::Validation("reload target has no releases".into()))?;

        for release in &releases {
            if !release.state.is_reloadable() {
                return Err(ReleaseError::NotReloadable {
                    release_id: release.id.clone(),
                    state: release.state,
                });
            }
        }

        let app = self.fetch_app_of(first).await?;
        let instruction = ReloadInstruction {
            business_id: business_id.clone(),
            app_id: app.id.clone(),
            releases: releases
                .iter()
                .map(|r| ReleaseRef {
                    release_id: r.id.clone(),
                    cfgset_id: r.cfgset_id.clone(),
                    serial: r.serial,
                })
                .collect(),
            rollback,
            operator: operator.to_string(),
        };
        self.router
            .dispatch(app.delivery_channel, &instruction)
            .await?;

        info!(
            app = %app.id,
            channel = %app.delivery_channel,
            releases = instruction.releases.len(),
            rollback,
            operator,
            "reload forwarded"
        );
        Ok(())
    }

    async fn resolve_strategy_rule(
        &self,
        business_id: &BusinessId,
        app_id: &confpipe_types::AppId,
        strategy_id: Option<&confpipe_types::StrategyId>,
    ) -> Result<StrategyRule> {
        let Some(strategy_id) = strategy_id else {
            return Ok(StrategyRule::empty());
        };
        let strategy = self
            .strategies
            .get_strategy(strategy_id)
            .await?
            .ok_or_else(|| ReleaseError::StrategyNotFound(strategy_id.clone()))?;
        if &strategy.business_id != business_id || &strategy.app_id != app_id {
            return Err(ReleaseError::Consistency(format!(
                "strategy {} does not belong to business {} / app {}",
                strategy_id, business_id, app_id
            )));
        }
        Ok(strategy.rule)
    }

    async fn fetch_cfgset_of(&self, release: &Release) -> Result<ConfigSet> {
        self.cfgsets
            .get_cfgset(&release.cfgset_id)
            .await?
            .ok_or_else(|| {
                ReleaseError::Consistency(format!(
                    "release {} references missing config set {}",
                    release.id, release.cfgset_id
                ))
            })
    }

    async fn fetch_app_of(&self, release: &Release) -> Result<App> {
        self.apps.get_app(&release.app_id).await?.ok_or_else(|| {
            ReleaseError::Consistency(format!(
                "release {} references missing app {}",
                release.id, release.app_id
            ))
        })
    }

    fn signal_for(&self, kind: SignalKind, release: &Release, cfgset: &ConfigSet) -> Signal {
        Signal {
            kind,
            business_id: release.business_id.clone(),
            app_id: release.app_id.clone(),
            cfgset_id: release.cfgset_id.clone(),
            cfgset_name: cfgset.name.clone(),
            cfgset_path: cfgset.path.clone(),
            serial: release.serial,
            release_id: release.id.clone(),
            strategy: release.strategy.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::RecordingController;
    use crate::signal::InMemorySignalBus;
    use confpipe_commit::{CommitService, CreateCommitRequest, PassthroughRenderer};
    use confpipe_store::{
        AppStore, BusinessStore, CfgsetStore, InMemoryStore, MultiCommitStore, ReleaseStore,
    };
    use confpipe_types::{
        App, AppId, Business, CfgsetId, Commit, ConfigSet, ContentSource, DeliveryChannel,
        MultiCommit, MultiCommitId, SubCommit,
    };

    struct Fixture {
        store: Arc<InMemoryStore>,
        business: Business,
        app: App,
        cfgset: ConfigSet,
        commits: CommitService,
        bus: Arc<InMemorySignalBus>,
        container: Arc<RecordingController>,
        host: Arc<RecordingController>,
        releases: ReleaseService,
    }

    async fn fixture_with_channel(channel: DeliveryChannel) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let business = Business {
            id: confpipe_types::BusinessId::generate(),
            name: "acme".into(),
            creator: "admin".into(),
            memo: String::new(),
            created_at: now,
            updated_at: now,
        };
        let app = App {
            id: AppId::generate(),
            business_id: business.id.clone(),
            name: "web".into(),
            delivery_channel: channel,
            creator: "admin".into(),
            memo: String::new(),
            created_at: now,
            updated_at: now,
        };
        let cfgset = ConfigSet {
            id: CfgsetId::generate(),
            business_id: business.id.clone(),
            app_id: app.id.clone(),
            name: "server.conf".into(),
            path: "/etc/web".into(),
            creator: "admin".into(),
            memo: String::new(),
            created_at: now,
            updated_at: now,
        };
        store.create_business(&business).await.unwrap();
        store.create_app(&app).await.unwrap();
        store.create_cfgset(&cfgset).await.unwrap();

        let commits = CommitService::new(
            store.clone(),
            store.clone(),
            Arc::new(PassthroughRenderer),
        );
        let bus = Arc::new(InMemorySignalBus::new());
        let container = Arc::new(RecordingController::new(DeliveryChannel::Container));
        let host = Arc::new(RecordingController::new(DeliveryChannel::HostAgent));
        let router = Arc::new(
            ReloadRouter::new()
                .register(container.clone())
                .register(host.clone()),
        );
        let releases = ReleaseService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            bus.clone(),
            router,
        );
        Fixture {
            store,
            business,
            app,
            cfgset,
            commits,
            bus,
            container,
            host,
            releases,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with_channel(DeliveryChannel::Container).await
    }

    async fn confirmed_commit(fx: &Fixture) -> Commit {
        let commit = fx
            .commits
            .create(CreateCommitRequest {
                business_id: fx.business.id.clone(),
                app_id: fx.app.id.clone(),
                cfgset_id: fx.cfgset.id.clone(),
                source: ContentSource::raw("X=1"),
                changelog: "initial".into(),
                operator: "alice".into(),
                memo: String::new(),
            })
            .await
            .unwrap();
        fx.commits
            .confirm(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap()
    }

    fn release_request(fx: &Fixture, commit: &Commit) -> CreateReleaseRequest {
        CreateReleaseRequest {
            business_id: fx.business.id.clone(),
            app_id: fx.app.id.clone(),
            cfgset_id: fx.cfgset.id.clone(),
            commit_id: commit.id.clone(),
            strategy_id: None,
            name: "v1".into(),
            operator: "alice".into(),
            memo: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_requires_confirmed_commit() {
        let fx = fixture().await;
        let commit = fx
            .commits
            .create(CreateCommitRequest {
                business_id: fx.business.id.clone(),
                app_id: fx.app.id.clone(),
                cfgset_id: fx.cfgset.id.clone(),
                source: ContentSource::raw("X=1"),
                changelog: "initial".into(),
                operator: "alice".into(),
                memo: String::new(),
            })
            .await
            .unwrap();

        let err = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::CommitNotConfirmed { .. }));
    }

    #[tokio::test]
    async fn test_publish_flips_state_and_signals() {
        let fx = fixture().await;
        let commit = confirmed_commit(&fx).await;
        let release = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();
        assert_eq!(release.state, ReleaseState::Init);

        let published = fx
            .releases
            .publish(&fx.business.id, &release.id, "alice")
            .await
            .unwrap();
        assert_eq!(published.state, ReleaseState::Published);

        let signals = fx.bus.emitted().await;
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, SignalKind::Publish);
        assert_eq!(signals[0].release_id, release.id);
        assert_eq!(signals[0].cfgset_name, "server.conf");
        assert_eq!(signals[0].serial, release.serial);
    }

    #[tokio::test]
    async fn test_terminal_states_block_publish() {
        let fx = fixture().await;
        let commit = confirmed_commit(&fx).await;

        let rollbacked = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();
        fx.releases
            .publish(&fx.business.id, &rollbacked.id, "alice")
            .await
            .unwrap();
        fx.store
            .update_release_state(&rollbacked.id, ReleaseState::Rollbacked)
            .await
            .unwrap();
        let err = fx
            .releases
            .prepare_publish(&fx.business.id, &rollbacked.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::AlreadyRollbacked(_)));

        let canceled = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();
        fx.store
            .update_release_state(&canceled.id, ReleaseState::Canceled)
            .await
            .unwrap();
        let err = fx
            .releases
            .prepare_publish(&fx.business.id, &canceled.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::AlreadyCanceled(_)));
    }

    #[tokio::test]
    async fn test_prepare_publish_has_no_side_effects() {
        let fx = fixture().await;
        let commit = confirmed_commit(&fx).await;
        let release = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();

        fx.releases
            .prepare_publish(&fx.business.id, &release.id)
            .await
            .unwrap();

        let fetched = fx.releases.get(&fx.business.id, &release.id).await.unwrap();
        assert_eq!(fetched.state, ReleaseState::Init);
        assert!(fx.bus.emitted().await.is_empty());
    }

    #[tokio::test]
    async fn test_rollback_requires_prior_state_flip() {
        let fx = fixture().await;
        let commit = confirmed_commit(&fx).await;
        let release = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();
        fx.releases
            .publish(&fx.business.id, &release.id, "alice")
            .await
            .unwrap();

        // Not yet marked Rollbacked on the administrative path
        let err = fx
            .releases
            .rollback(&fx.business.id, &release.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::NotRollbacked { .. }));
    }

    #[tokio::test]
    async fn test_rollback_signal_is_replayable() {
        let fx = fixture().await;
        let commit = confirmed_commit(&fx).await;
        let release = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();
        fx.releases
            .publish(&fx.business.id, &release.id, "alice")
            .await
            .unwrap();
        fx.store
            .update_release_state(&release.id, ReleaseState::Rollbacked)
            .await
            .unwrap();

        fx.releases
            .rollback(&fx.business.id, &release.id, "alice")
            .await
            .unwrap();
        fx.releases
            .rollback(&fx.business.id, &release.id, "alice")
            .await
            .unwrap();

        let signals = fx.bus.emitted().await;
        // One publish plus two identical rollback re-sends
        assert_eq!(signals.len(), 3);
        assert_eq!(signals[1].kind, SignalKind::Rollback);
        assert_eq!(signals[1], signals[2]);
    }

    #[tokio::test]
    async fn test_reload_requires_live_state_and_routes_by_channel() {
        let fx = fixture_with_channel(DeliveryChannel::HostAgent).await;
        let commit = confirmed_commit(&fx).await;
        let release = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();

        let err = fx
            .releases
            .reload(
                &fx.business.id,
                ReloadTarget::Release(release.id.clone()),
                "alice",
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::NotReloadable { .. }));

        fx.releases
            .publish(&fx.business.id, &release.id, "alice")
            .await
            .unwrap();
        fx.releases
            .reload(
                &fx.business.id,
                ReloadTarget::Release(release.id.clone()),
                "alice",
                false,
            )
            .await
            .unwrap();

        assert!(fx.container.received().await.is_empty());
        let received = fx.host.received().await;
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].releases[0].release_id, release.id);
    }

    #[tokio::test]
    async fn test_publish_multi_rejected_sub_flips_nothing() {
        let fx = fixture().await;
        let now = Utc::now();

        // Second config set so the multi-release has two subs
        let cfgset2 = ConfigSet {
            id: CfgsetId::generate(),
            business_id: fx.business.id.clone(),
            app_id: fx.app.id.clone(),
            name: "extra.conf".into(),
            path: "/etc/web".into(),
            creator: "admin".into(),
            memo: String::new(),
            created_at: now,
            updated_at: now,
        };
        fx.store.create_cfgset(&cfgset2).await.unwrap();

        let commit1 = confirmed_commit(&fx).await;
        let commit2 = fx
            .commits
            .create(CreateCommitRequest {
                business_id: fx.business.id.clone(),
                app_id: fx.app.id.clone(),
                cfgset_id: cfgset2.id.clone(),
                source: ContentSource::raw("Y=2"),
                changelog: "second".into(),
                operator: "alice".into(),
                memo: String::new(),
            })
            .await
            .unwrap();
        let commit2 = fx
            .commits
            .confirm(&fx.business.id, &commit2.id, "alice")
            .await
            .unwrap();

        let multi_commit = MultiCommit {
            id: MultiCommitId::generate(),
            business_id: fx.business.id.clone(),
            app_id: fx.app.id.clone(),
            sub_commits: vec![
                SubCommit {
                    cfgset_id: fx.cfgset.id.clone(),
                    commit_id: commit1.id.clone(),
                    reused: false,
                },
                SubCommit {
                    cfgset_id: cfgset2.id.clone(),
                    commit_id: commit2.id.clone(),
                    reused: false,
                },
            ],
            state: CommitState::Confirmed,
            operator: "alice".into(),
            memo: String::new(),
            created_at: now,
            updated_at: now,
        };
        fx.store.create_multi_commit(&multi_commit).await.unwrap();

        let multi = fx
            .releases
            .create_multi(CreateMultiReleaseRequest {
                business_id: fx.business.id.clone(),
                app_id: fx.app.id.clone(),
                multi_commit_id: multi_commit.id.clone(),
                strategy_id: None,
                name: "batch-v1".into(),
                operator: "alice".into(),
                memo: String::new(),
            })
            .await
            .unwrap();

        // Administratively abandon the second sub before publication
        fx.store
            .update_release_state(&multi.sub_releases[1], ReleaseState::Canceled)
            .await
            .unwrap();

        let err = fx
            .releases
            .publish_multi(&fx.business.id, &multi.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::AlreadyCanceled(_)));

        // The first sub was not flipped and nothing was signalled
        let first = fx
            .releases
            .get(&fx.business.id, &multi.sub_releases[0])
            .await
            .unwrap();
        assert_eq!(first.state, ReleaseState::Init);
        assert!(fx.bus.emitted().await.is_empty());

        let aggregate = fx
            .releases
            .get_multi(&fx.business.id, &multi.id)
            .await
            .unwrap();
        assert_eq!(aggregate.state, ReleaseState::Init);
    }

    #[tokio::test]
    async fn test_business_mismatch_is_fatal() {
        let fx = fixture().await;
        let commit = confirmed_commit(&fx).await;
        let release = fx
            .releases
            .create(release_request(&fx, &commit))
            .await
            .unwrap();

        let err = fx
            .releases
            .get(&confpipe_types::BusinessId::generate(), &release.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Consistency(_)));
    }
}
