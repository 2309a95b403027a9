//! Strategy service
//!
//! Creates and fetches targeting strategies. Names are unique per app, and
//! strategies are immutable once created: a release copies the rule at
//! binding time, so there is no update path.

use crate::error::{Result, StrategyError};
use chrono::Utc;
use confpipe_store::{AppStore, StrategyStore};
use confpipe_types::{AppId, BusinessId, Strategy, StrategyId, StrategyRule};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Limits applied to strategy rule sets before they reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyLimits {
    /// Maximum entries per allow-list (clusters, zones, datacenters, IPs)
    pub max_list_entries: usize,

    /// Maximum entries per label map
    pub max_label_entries: usize,

    /// Maximum strategy name length
    pub max_name_len: usize,
}

impl Default for StrategyLimits {
    fn default() -> Self {
        Self {
            max_list_entries: 100,
            max_label_entries: 100,
            max_name_len: 128,
        }
    }
}

/// Request to create one strategy.
#[derive(Debug, Clone)]
pub struct CreateStrategyRequest {
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub name: String,
    pub rule: StrategyRule,
    pub operator: String,
    pub memo: String,
}

/// Strategy service.
pub struct StrategyService {
    strategies: Arc<dyn StrategyStore>,
    apps: Arc<dyn AppStore>,
    limits: StrategyLimits,
}

impl StrategyService {
    pub fn new(strategies: Arc<dyn StrategyStore>, apps: Arc<dyn AppStore>) -> Self {
        Self {
            strategies,
            apps,
            limits: StrategyLimits::default(),
        }
    }

    /// Override the default rule limits.
    pub fn with_limits(mut self, limits: StrategyLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Create a strategy; rejects duplicate names within the app.
    pub async fn create(&self, req: CreateStrategyRequest) -> Result<Strategy> {
        self.validate(&req)?;

        let app = self
            .apps
            .get_app(&req.app_id)
            .await?
            .ok_or_else(|| StrategyError::AppNotFound(req.app_id.clone()))?;
        if app.business_id != req.business_id {
            return Err(StrategyError::Consistency(format!(
                "app {} belongs to {}, not {}",
                req.app_id, app.business_id, req.business_id
            )));
        }

        if self
            .strategies
            .find_strategy_by_name(&req.app_id, &req.name)
            .await?
            .is_some()
        {
            return Err(StrategyError::NameExists {
                app_id: req.app_id,
                name: req.name,
            });
        }

        let now = Utc::now();
        let strategy = Strategy {
            id: StrategyId::generate(),
            business_id: req.business_id,
            app_id: req.app_id,
            name: req.name,
            rule: req.rule,
            creator: req.operator,
            memo: req.memo,
            created_at: now,
            updated_at: now,
        };
        self.strategies.create_strategy(&strategy).await?;

        info!(strategy = %strategy.id, app = %strategy.app_id, name = %strategy.name, "strategy created");
        Ok(strategy)
    }

    /// Fetch a strategy, verifying business ownership.
    pub async fn get(&self, business_id: &BusinessId, id: &StrategyId) -> Result<Strategy> {
        let strategy = self
            .strategies
            .get_strategy(id)
            .await?
            .ok_or_else(|| StrategyError::NotFound(id.clone()))?;
        if &strategy.business_id != business_id {
            return Err(StrategyError::Consistency(format!(
                "strategy {} belongs to {}, not {}",
                id, strategy.business_id, business_id
            )));
        }
        Ok(strategy)
    }

    fn validate(&self, req: &CreateStrategyRequest) -> Result<()> {
        if req.name.is_empty() {
            return Err(StrategyError::Validation("strategy name is required".into()));
        }
        if req.name.len() > self.limits.max_name_len {
            return Err(StrategyError::Validation(format!(
                "strategy name exceeds {} characters",
                self.limits.max_name_len
            )));
        }

        let rule = &req.rule;
        for (dimension, len) in [
            ("cluster_ids", rule.cluster_ids.len()),
            ("zone_ids", rule.zone_ids.len()),
            ("datacenters", rule.datacenters.len()),
            ("ips", rule.ips.len()),
        ] {
            if len > self.limits.max_list_entries {
                return Err(StrategyError::Validation(format!(
                    "{dimension} exceeds {} entries",
                    self.limits.max_list_entries
                )));
            }
        }
        for (dimension, len) in [
            ("labels_or", rule.labels_or.len()),
            ("labels_and", rule.labels_and.len()),
        ] {
            if len > self.limits.max_label_entries {
                return Err(StrategyError::Validation(format!(
                    "{dimension} exceeds {} entries",
                    self.limits.max_label_entries
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confpipe_store::{AppStore, BusinessStore, InMemoryStore};
    use confpipe_types::{App, Business, DeliveryChannel};

    async fn fixture() -> (Arc<InMemoryStore>, Business, App) {
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
        store.create_business(&business).await.unwrap();
        store.create_app(&app).await.unwrap();
        (store, business, app)
    }

    fn request(business: &Business, app: &App, name: &str) -> CreateStrategyRequest {
        CreateStrategyRequest {
            business_id: business.id.clone(),
            app_id: app.id.clone(),
            name: name.into(),
            rule: StrategyRule {
                cluster_ids: vec!["c1".into()],
                ..Default::default()
            },
            operator: "alice".into(),
            memo: String::new(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (store, business, app) = fixture().await;
        let svc = StrategyService::new(store.clone(), store.clone());

        let strategy = svc.create(request(&business, &app, "canary")).await.unwrap();
        let fetched = svc.get(&business.id, &strategy.id).await.unwrap();
        assert_eq!(fetched.name, "canary");
        assert_eq!(fetched.rule.cluster_ids, vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (store, business, app) = fixture().await;
        let svc = StrategyService::new(store.clone(), store.clone());

        svc.create(request(&business, &app, "canary")).await.unwrap();
        let err = svc
            .create(request(&business, &app, "canary"))
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::NameExists { .. }));
    }

    #[tokio::test]
    async fn test_list_limit_enforced() {
        let (store, business, app) = fixture().await;
        let svc = StrategyService::new(store.clone(), store.clone()).with_limits(StrategyLimits {
            max_list_entries: 2,
            ..Default::default()
        });

        let mut req = request(&business, &app, "wide");
        req.rule.cluster_ids = vec!["c1".into(), "c2".into(), "c3".into()];
        let err = svc.create(req).await.unwrap_err();
        assert!(matches!(err, StrategyError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_app_rejected() {
        let (store, business, app) = fixture().await;
        let svc = StrategyService::new(store.clone(), store.clone());

        let mut req = request(&business, &app, "canary");
        req.app_id = AppId::generate();
        let err = svc.create(req).await.unwrap_err();
        assert!(matches!(err, StrategyError::AppNotFound(_)));
    }
}
