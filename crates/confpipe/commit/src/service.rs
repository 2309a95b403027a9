//! Commit lifecycle service
//!
//! Commits move Init -> Confirmed or Init -> Canceled, with no exit from
//! either terminal state. Content is validated before any store access;
//! template sources are rendered by the external collaborator at confirm
//! time, and a render failure leaves the commit Init for a later retry or an
//! explicit cancel.

use crate::error::{CommitError, Result};
use crate::render::TemplateRenderer;
use chrono::Utc;
use confpipe_store::{CfgsetStore, CommitStore};
use confpipe_types::{
    AppId, BusinessId, CfgsetId, Commit, CommitId, CommitState, ConfigSet, ContentSource,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Request to create one commit.
#[derive(Debug, Clone)]
pub struct CreateCommitRequest {
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub cfgset_id: CfgsetId,
    pub source: ContentSource,
    pub changelog: String,
    pub operator: String,
    pub memo: String,
}

/// Commit lifecycle service.
pub struct CommitService {
    commits: Arc<dyn CommitStore>,
    cfgsets: Arc<dyn CfgsetStore>,
    renderer: Arc<dyn TemplateRenderer>,
}

impl CommitService {
    pub fn new(
        commits: Arc<dyn CommitStore>,
        cfgsets: Arc<dyn CfgsetStore>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            commits,
            cfgsets,
            renderer,
        }
    }

    /// Validate a content source before touching the store.
    ///
    /// The enum makes the raw/template/inline forms structurally exclusive;
    /// what remains is rejecting empty references and an inline template
    /// without a render rule.
    pub fn validate_source(source: &ContentSource) -> Result<()> {
        match source {
            ContentSource::Raw { .. } => Ok(()),
            ContentSource::Template { template_id } => {
                if template_id.is_empty() {
                    return Err(CommitError::Validation(
                        "template reference requires a template id".into(),
                    ));
                }
                Ok(())
            }
            ContentSource::Inline { template, rule } => {
                if template.is_empty() {
                    return Err(CommitError::Validation(
                        "inline template must not be empty".into(),
                    ));
                }
                if rule.is_empty() {
                    return Err(CommitError::Validation(
                        "inline template requires a non-empty render rule".into(),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Create a commit in Init state.
    pub async fn create(&self, req: CreateCommitRequest) -> Result<Commit> {
        Self::validate_source(&req.source)?;

        let cfgset = self.fetch_cfgset(&req.business_id, &req.app_id, &req.cfgset_id).await?;

        let now = Utc::now();
        let commit = Commit {
            id: CommitId::generate(),
            business_id: req.business_id,
            app_id: req.app_id,
            cfgset_id: cfgset.id,
            source: req.source,
            rendered: None,
            changelog: req.changelog,
            state: CommitState::Init,
            operator: req.operator,
            memo: req.memo,
            created_at: now,
            updated_at: now,
        };
        self.commits.create_commit(&commit).await?;

        debug!(commit = %commit.id, cfgset = %commit.cfgset_id, "commit created");
        Ok(commit)
    }

    /// Fetch a commit, verifying business ownership.
    pub async fn get(&self, business_id: &BusinessId, id: &CommitId) -> Result<Commit> {
        let commit = self
            .commits
            .get_commit(id)
            .await?
            .ok_or_else(|| CommitError::NotFound(id.clone()))?;
        if &commit.business_id != business_id {
            return Err(CommitError::Consistency(format!(
                "commit {} belongs to {}, not {}",
                id, commit.business_id, business_id
            )));
        }
        Ok(commit)
    }

    /// Confirm an Init commit, rendering template sources first.
    ///
    /// Renderer failure propagates without a state change, so the commit
    /// stays Init and confirm can be retried.
    pub async fn confirm(
        &self,
        business_id: &BusinessId,
        id: &CommitId,
        operator: &str,
    ) -> Result<Commit> {
        let mut commit = self.get(business_id, id).await?;
        self.check_init(&commit)?;

        let rendered = match &commit.source {
            ContentSource::Raw { .. } => None,
            ContentSource::Template { template_id } => {
                Some(self.renderer.render_template(template_id).await?)
            }
            ContentSource::Inline { template, rule } => {
                Some(self.renderer.render_inline(template, rule).await?)
            }
        };

        if let Some(bytes) = rendered {
            self.commits.set_commit_rendered(id, bytes.clone()).await?;
            commit.rendered = Some(bytes);
        }
        self.commits
            .update_commit_state(id, CommitState::Confirmed)
            .await?;
        commit.state = CommitState::Confirmed;

        info!(commit = %id, operator, "commit confirmed");
        Ok(commit)
    }

    /// Cancel an Init commit.
    pub async fn cancel(
        &self,
        business_id: &BusinessId,
        id: &CommitId,
        operator: &str,
    ) -> Result<()> {
        let commit = self.get(business_id, id).await?;
        self.check_init(&commit)?;

        self.commits
            .update_commit_state(id, CommitState::Canceled)
            .await?;
        info!(commit = %id, operator, "commit canceled");
        Ok(())
    }

    /// All commits of a config set, newest first, after verifying the config
    /// set belongs to the caller's business and app.
    pub async fn list_for_cfgset(
        &self,
        business_id: &BusinessId,
        app_id: &AppId,
        cfgset_id: &CfgsetId,
    ) -> Result<Vec<Commit>> {
        self.fetch_cfgset(business_id, app_id, cfgset_id).await?;
        Ok(self.commits.list_commits_for_cfgset(cfgset_id).await?)
    }

    /// Replace the change log; permitted only while Init.
    pub async fn update_changelog(
        &self,
        business_id: &BusinessId,
        id: &CommitId,
        changelog: String,
    ) -> Result<()> {
        let commit = self.get(business_id, id).await?;
        self.check_init(&commit)?;
        self.commits.update_commit_changelog(id, changelog).await?;
        Ok(())
    }

    fn check_init(&self, commit: &Commit) -> Result<()> {
        match commit.state {
            CommitState::Init => Ok(()),
            CommitState::Confirmed => Err(CommitError::AlreadyConfirmed(commit.id.clone())),
            CommitState::Canceled => Err(CommitError::AlreadyCanceled(commit.id.clone())),
        }
    }

    async fn fetch_cfgset(
        &self,
        business_id: &BusinessId,
        app_id: &AppId,
        cfgset_id: &CfgsetId,
    ) -> Result<ConfigSet> {
        let cfgset = self
            .cfgsets
            .get_cfgset(cfgset_id)
            .await?
            .ok_or_else(|| CommitError::CfgsetNotFound(cfgset_id.clone()))?;
        if &cfgset.business_id != business_id || &cfgset.app_id != app_id {
            return Err(CommitError::Consistency(format!(
                "config set {} does not belong to business {} / app {}",
                cfgset_id, business_id, app_id
            )));
        }
        Ok(cfgset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PassthroughRenderer, RenderError, TemplateRenderer};
    use async_trait::async_trait;
    use confpipe_store::InMemoryStore;
    use confpipe_types::{App, Business, DeliveryChannel};

    pub(crate) struct Fixture {
        pub store: Arc<InMemoryStore>,
        pub business: Business,
        pub app: App,
        pub cfgset: ConfigSet,
    }

    pub(crate) async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let now = Utc::now();
        let business = Business {
            id: BusinessId::generate(),
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
            delivery_channel: DeliveryChannel::Container,
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
        use confpipe_store::{AppStore, BusinessStore, CfgsetStore};
        store.create_business(&business).await.unwrap();
        store.create_app(&app).await.unwrap();
        store.create_cfgset(&cfgset).await.unwrap();
        Fixture {
            store,
            business,
            app,
            cfgset,
        }
    }

    fn service(fx: &Fixture) -> CommitService {
        CommitService::new(
            fx.store.clone(),
            fx.store.clone(),
            Arc::new(PassthroughRenderer),
        )
    }

    fn request(fx: &Fixture, source: ContentSource) -> CreateCommitRequest {
        CreateCommitRequest {
            business_id: fx.business.id.clone(),
            app_id: fx.app.id.clone(),
            cfgset_id: fx.cfgset.id.clone(),
            source,
            changelog: "initial".into(),
            operator: "alice".into(),
            memo: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_confirm_raw_commit() {
        let fx = fixture().await;
        let svc = service(&fx);

        let commit = svc.create(request(&fx, ContentSource::raw("X=1"))).await.unwrap();
        assert_eq!(commit.state, CommitState::Init);

        let confirmed = svc
            .confirm(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap();
        assert_eq!(confirmed.state, CommitState::Confirmed);
        assert!(confirmed.rendered.is_none());
    }

    #[tokio::test]
    async fn test_inline_template_requires_rule() {
        let fx = fixture().await;
        let svc = service(&fx);

        let err = svc
            .create(request(
                &fx,
                ContentSource::Inline {
                    template: "X={{v}}".into(),
                    rule: String::new(),
                },
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::Validation(_)));
    }

    #[tokio::test]
    async fn test_confirm_renders_inline_template() {
        let fx = fixture().await;
        let svc = service(&fx);

        let commit = svc
            .create(request(
                &fx,
                ContentSource::Inline {
                    template: "X={{v}}".into(),
                    rule: "v=1".into(),
                },
            ))
            .await
            .unwrap();
        let confirmed = svc
            .confirm(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap();
        assert_eq!(confirmed.rendered.as_deref(), Some(b"X={{v}}".as_slice()));
    }

    #[tokio::test]
    async fn test_render_failure_leaves_commit_init() {
        struct FailingRenderer;
        #[async_trait]
        impl TemplateRenderer for FailingRenderer {
            async fn render_inline(&self, _t: &str, _r: &str) -> crate::render::Result<Vec<u8>> {
                Err(RenderError("render backend down".into()))
            }
            async fn render_template(&self, _id: &str) -> crate::render::Result<Vec<u8>> {
                Err(RenderError("render backend down".into()))
            }
        }

        let fx = fixture().await;
        let svc = CommitService::new(fx.store.clone(), fx.store.clone(), Arc::new(FailingRenderer));

        let commit = svc
            .create(request(
                &fx,
                ContentSource::Inline {
                    template: "X={{v}}".into(),
                    rule: "v=1".into(),
                },
            ))
            .await
            .unwrap();
        let err = svc
            .confirm(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::Render(_)));

        // Still retryable
        let again = svc.get(&fx.business.id, &commit.id).await.unwrap();
        assert_eq!(again.state, CommitState::Init);
    }

    #[tokio::test]
    async fn test_no_transition_out_of_terminal_states() {
        let fx = fixture().await;
        let svc = service(&fx);

        let commit = svc.create(request(&fx, ContentSource::raw("X=1"))).await.unwrap();
        svc.confirm(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap();

        let err = svc
            .confirm(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::AlreadyConfirmed(_)));

        let err = svc
            .cancel(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::AlreadyConfirmed(_)));

        let canceled = svc.create(request(&fx, ContentSource::raw("X=2"))).await.unwrap();
        svc.cancel(&fx.business.id, &canceled.id, "alice")
            .await
            .unwrap();
        let err = svc
            .confirm(&fx.business.id, &canceled.id, "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::AlreadyCanceled(_)));
    }

    #[tokio::test]
    async fn test_business_mismatch_is_consistency_fault() {
        let fx = fixture().await;
        let svc = service(&fx);

        let commit = svc.create(request(&fx, ContentSource::raw("X=1"))).await.unwrap();
        let err = svc
            .get(&BusinessId::generate(), &commit.id)
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::Consistency(_)));
    }

    #[tokio::test]
    async fn test_changelog_update_only_while_init() {
        let fx = fixture().await;
        let svc = service(&fx);

        let commit = svc.create(request(&fx, ContentSource::raw("X=1"))).await.unwrap();
        svc.update_changelog(&fx.business.id, &commit.id, "tweaked".into())
            .await
            .unwrap();

        svc.confirm(&fx.business.id, &commit.id, "alice")
            .await
            .unwrap();
        let err = svc
            .update_changelog(&fx.business.id, &commit.id, "late".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::AlreadyConfirmed(_)));
    }

    #[tokio::test]
    async fn test_list_for_cfgset_newest_first() {
        let fx = fixture().await;
        let svc = service(&fx);

        let first = svc.create(request(&fx, ContentSource::raw("X=1"))).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = svc.create(request(&fx, ContentSource::raw("X=2"))).await.unwrap();

        let commits = svc
            .list_for_cfgset(&fx.business.id, &fx.app.id, &fx.cfgset.id)
            .await
            .unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].id, second.id);
        assert_eq!(commits[1].id, first.id);

        let err = svc
            .list_for_cfgset(&fx.business.id, &fx.app.id, &CfgsetId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::CfgsetNotFound(_)));
    }
}
