//! Delivery-channel reload dispatch
//!
//! Reload instructions reach workloads through one of two downstream
//! controllers, selected by the owning app's delivery channel. The flow is
//! identical for both channels; only the adapter differs, so the router
//! keeps one adapter per channel instead of two parallel code paths.

use async_trait::async_trait;
use confpipe_types::{AppId, BusinessId, CfgsetId, DeliveryChannel, ReleaseId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Downstream delivery failure, surfaced to the caller without retry.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("no reload controller registered for channel {0}")]
    NoController(DeliveryChannel),

    #[error("reload delivery failed on channel {channel}: {reason}")]
    DeliveryFailed {
        channel: DeliveryChannel,
        reason: String,
    },
}

/// Result type for channel operations
pub type Result<T> = std::result::Result<T, ChannelError>;

/// One release a reload instruction covers.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseRef {
    pub release_id: ReleaseId,
    pub cfgset_id: CfgsetId,
    pub serial: u64,
}

/// Instruction forwarded to a channel controller to re-apply configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadInstruction {
    pub business_id: BusinessId,
    pub app_id: AppId,
    pub releases: Vec<ReleaseRef>,
    /// True when the reload follows a rollback rather than a publish
    pub rollback: bool,
    pub operator: String,
}

/// Adapter for one delivery channel's downstream controller.
#[async_trait]
pub trait ReloadController: Send + Sync {
    /// Forward a reload instruction; failure surfaces, nothing retries.
    async fn reload(&self, instruction: &ReloadInstruction) -> Result<()>;

    /// Channel this adapter serves.
    fn channel(&self) -> DeliveryChannel;
}

/// Routes reload instructions to the controller serving the app's channel.
#[derive(Default)]
pub struct ReloadRouter {
    controllers: HashMap<DeliveryChannel, Arc<dyn ReloadController>>,
}

impl ReloadRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under the channel it reports.
    pub fn register(mut self, controller: Arc<dyn ReloadController>) -> Self {
        self.controllers.insert(controller.channel(), controller);
        self
    }

    /// Dispatch one instruction to the given channel's controller.
    pub async fn dispatch(
        &self,
        channel: DeliveryChannel,
        instruction: &ReloadInstruction,
    ) -> Result<()> {
        let controller = self
            .controllers
            .get(&channel)
            .ok_or(ChannelError::NoController(channel))?;
        debug!(
            channel = %channel,
            app = %instruction.app_id,
            releases = instruction.releases.len(),
            rollback = instruction.rollback,
            "dispatching reload"
        );
        controller.reload(instruction).await
    }
}

/// Test controller that records every instruction it receives.
#[derive(Default)]
pub struct RecordingController {
    channel: DeliveryChannel,
    received: tokio::sync::Mutex<Vec<ReloadInstruction>>,
}

impl RecordingController {
    pub fn new(channel: DeliveryChannel) -> Self {
        Self {
            channel,
            received: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Instructions received so far, in order.
    pub async fn received(&self) -> Vec<ReloadInstruction> {
        self.received.lock().await.clone()
    }
}

#[async_trait]
impl ReloadController for RecordingController {
    async fn reload(&self, instruction: &ReloadInstruction) -> Result<()> {
        self.received.lock().await.push(instruction.clone());
        Ok(())
    }

    fn channel(&self) -> DeliveryChannel {
        self.channel
    }
}
