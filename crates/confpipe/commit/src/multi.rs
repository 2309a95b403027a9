//! Multi-commit aggregator
//!
//! Batches commits across many config sets of one app into one aggregate.
//! Creation is best-effort per config set: a failed entry is recorded and
//! returned, not rolled back, and the caller decides what to do with the
//! partial result. Config sets the caller does not list can be bound to a
//! previously confirmed reuse commit so a partial update still yields one
//! coherent multi-release.

use crate::error::{CommitError, Result};
use crate::service::{CommitService, CreateCommitRequest};
use chrono::Utc;
use confpipe_store::{CfgsetStore, CommitStore, MultiCommitStore};
use confpipe_types::{
    AppId, BusinessId, CfgsetId, CommitId, CommitState, ContentSource, MultiCommit, MultiCommitId,
    SubCommit,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

/// One per-config-set entry of a multi-commit request.
#[derive(Debug, Clone)]
pub struct CommitIntent {
    pub cfgset_id: CfgsetId,
    pub source: ContentSource,
    pub changelog: String,
}

/// Request to create a multi-commit.
#[derive(Debug, Clone)]
pub struct CreateMultiCommitRequest {
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub intents: Vec<CommitIntent>,
    /// Confirmed commit bound to every config set of the app not listed in
    /// `intents`; `None` leaves unlisted config sets out of the aggregate
    pub reuse_commit_id: Option<CommitId>,
    pub operator: String,
    pub memo: String,
}

/// A config set whose sub-commit could not be created.
#[derive(Debug, Clone)]
pub struct FailedIntent {
    pub cfgset_id: CfgsetId,
    pub reason: String,
}

/// Result of a multi-commit creation: the aggregate plus which entries
/// succeeded and which failed.
#[derive(Debug)]
pub struct MultiCommitOutcome {
    pub multi_commit: MultiCommit,
    pub succeeded: Vec<CfgsetId>,
    pub failed: Vec<FailedIntent>,
}

/// Multi-commit aggregation service.
pub struct MultiCommitService {
    multi_commits: Arc<dyn MultiCommitStore>,
    commit_store: Arc<dyn CommitStore>,
    cfgsets: Arc<dyn CfgsetStore>,
    commits: Arc<CommitService>,
}

impl MultiCommitService {
    pub fn new(
        multi_commits: Arc<dyn MultiCommitStore>,
        commit_store: Arc<dyn CommitStore>,
        cfgsets: Arc<dyn CfgsetStore>,
        commits: Arc<CommitService>,
    ) -> Self {
        Self {
            multi_commits,
            commit_store,
            cfgsets,
            commits,
        }
    }

    /// Create sub-commits for every listed config set, bind the reuse commit
    /// to the rest, and persist the aggregate in Init state.
    ///
    /// Per-config-set failures do not abort the call; already-created
    /// sub-commits are not rolled back.
    pub async fn create(&self, req: CreateMultiCommitRequest) -> Result<MultiCommitOutcome> {
        if req.intents.is_empty() {
            return Err(CommitError::Validation(
                "multi-commit requires at least one config set entry".into(),
            ));
        }
        let mut seen = HashSet::new();
        for intent in &req.intents {
            if !seen.insert(intent.cfgset_id.clone()) {
                return Err(CommitError::Validation(format!(
                    "config set {} listed more than once",
                    intent.cfgset_id
                )));
            }
        }

        let mut sub_commits = Vec::new();
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for intent in req.intents {
            let create = CreateCommitRequest {
                business_id: req.business_id.clone(),
                app_id: req.app_id.clone(),
                cfgset_id: intent.cfgset_id.clone(),
                source: intent.source,
                changelog: intent.changelog,
                operator: req.operator.clone(),
                memo: req.memo.clone(),
            };
            match self.commits.create(create).await {
                Ok(commit) => {
                    succeeded.push(intent.cfgset_id.clone());
                    sub_commits.push(SubCommit {
                        cfgset_id: intent.cfgset_id,
                        commit_id: commit.id,
                        reused: false,
                    });
                }
                Err(err) => {
                    warn!(cfgset = %intent.cfgset_id, error = %err, "sub-commit creation failed");
                    failed.push(FailedIntent {
                        cfgset_id: intent.cfgset_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        if let Some(reuse_id) = &req.reuse_commit_id {
            let reuse = self
                .commit_store
                .get_commit(reuse_id)
                .await?
                .ok_or_else(|| CommitError::NotFound(reuse_id.clone()))?;
            if reuse.business_id != req.business_id || reuse.app_id != req.app_id {
                return Err(CommitError::Consistency(format!(
                    "reuse commit {} does not belong to business {} / app {}",
                    reuse_id, req.business_id, req.app_id
                )));
            }
            if reuse.state != CommitState::Confirmed {
                return Err(CommitError::ReuseNotConfirmed {
                    commit_id: reuse_id.clone(),
                    state: reuse.state,
                });
            }

            for cfgset in self.cfgsets.list_cfgsets_for_app(&req.app_id).await? {
                if seen.contains(&cfgset.id) {
                    continue;
                }
                sub_commits.push(SubCommit {
                    cfgset_id: cfgset.id,
                    commit_id: reuse_id.clone(),
                    reused: true,
                });
            }
        }

        let now = Utc::now();
        let multi_commit = MultiCommit {
            id: MultiCommitId::generate(),
            business_id: req.business_id,
            app_id: req.app_id,
            sub_commits,
            state: CommitState::Init,
            operator: req.operator,
            memo: req.memo,
            created_at: now,
            updated_at: now,
        };
        self.multi_commits.create_multi_commit(&multi_commit).await?;

        info!(
            multi_commit = %multi_commit.id,
            succeeded = succeeded.len(),
            failed = failed.len(),
            "multi-commit created"
        );
        Ok(MultiCommitOutcome {
            multi_commit,
            succeeded,
            failed,
        })
    }

    /// Fetch a multi-commit, verifying business ownership.
    pub async fn get(&self, business_id: &BusinessId, id: &MultiCommitId) -> Result<MultiCommit> {
        let multi = self
            .multi_commits
            .get_multi_commit(id)
            .await?
            .ok_or_else(|| CommitError::MultiNotFound(id.clone()))?;
        if &multi.business_id != business_id {
            return Err(CommitError::Consistency(format!(
                "multi-commit {} belongs to {}, not {}",
                id, multi.business_id, business_id
            )));
        }
        Ok(multi)
    }

    /// Confirm every sub-commit, then the aggregate.
    ///
    /// Reused entries are already Confirmed and are skipped. Any sub-commit
    /// failure aborts the call and leaves the aggregate Init.
    pub async fn confirm(
        &self,
        business_id: &BusinessId,
        id: &MultiCommitId,
        operator: &str,
    ) -> Result<MultiCommit> {
        let mut multi = self.get(business_id, id).await?;
        match multi.state {
            CommitState::Init => {}
            CommitState::Confirmed => return Err(CommitError::MultiAlreadyConfirmed(id.clone())),
            CommitState::Canceled => return Err(CommitError::MultiAlreadyCanceled(id.clone())),
        }

        for sub in &multi.sub_commits {
            let commit = self
                .commit_store
                .get_commit(&sub.commit_id)
                .await?
                .ok_or_else(|| {
                    CommitError::Consistency(format!(
                        "multi-commit {} references missing commit {}",
                        id, sub.commit_id
                    ))
                })?;
            match commit.state {
                CommitState::Confirmed => continue,
                CommitState::Canceled => {
                    return Err(CommitError::Consistency(format!(
                        "multi-commit {} references canceled commit {}",
                        id, sub.commit_id
                    )))
                }
                CommitState::Init => {
                    self.commits
                        .confirm(business_id, &sub.commit_id, operator)
                        .await?;
                }
            }
        }

        self.multi_commits
            .update_multi_commit_state(id, CommitState::Confirmed)
            .await?;
        multi.state = CommitState::Confirmed;

        info!(multi_commit = %id, operator, "multi-commit confirmed");
        Ok(multi)
    }

    /// Cancel the aggregate and its still-Init sub-commits unless it has
    /// already been confirmed.
    ///
    /// This is the deferred-cleanup half of the create -> cancel-if-needed ->
    /// confirm pattern used by higher layers: once confirm has succeeded (or
    /// a previous cancel ran) the call is a no-op, so a half-finished
    /// aggregate never lingers as Init but a finished one is untouched.
    pub async fn cancel_if_unconfirmed(
        &self,
        business_id: &BusinessId,
        id: &MultiCommitId,
        operator: &str,
    ) -> Result<()> {
        let multi = self.get(business_id, id).await?;
        if multi.state != CommitState::Init {
            return Ok(());
        }

        for sub in &multi.sub_commits {
            if sub.reused {
                continue;
            }
            let commit = match self.commit_store.get_commit(&sub.commit_id).await? {
                Some(commit) => commit,
                None => continue,
            };
            if commit.state == CommitState::Init {
                self.commits
                    .cancel(business_id, &sub.commit_id, operator)
                    .await?;
            }
        }

        self.multi_commits
            .update_multi_commit_state(id, CommitState::Canceled)
            .await?;
        info!(multi_commit = %id, operator, "multi-commit canceled");
        Ok(())
    }
}
