//! Signal bus seam
//!
//! Publish and rollback notifications are fire-and-forget from the
//! pipeline's point of view: emission failure surfaces to the caller, but
//! nothing waits for agent acknowledgement. At-least-once delivery and
//! idempotent application are the receiver's responsibility, which is what
//! makes rollback re-signalling safely repeatable.

use async_trait::async_trait;
use confpipe_types::Signal;
use thiserror::Error;
use tokio::sync::Mutex;

/// Signal emission failure, surfaced verbatim.
#[derive(Debug, Error)]
#[error("signal emission failed: {0}")]
pub struct SignalError(pub String);

/// Result type for signal operations
pub type Result<T> = std::result::Result<T, SignalError>;

/// Carries signals to connected agents or the downstream controller.
#[async_trait]
pub trait SignalBus: Send + Sync {
    /// Emit one signal; returns once the bus has accepted it.
    async fn emit(&self, signal: Signal) -> Result<()>;
}

/// In-memory bus for development and tests; records every emitted signal.
#[derive(Default)]
pub struct InMemorySignalBus {
    emitted: Mutex<Vec<Signal>>,
}

impl InMemorySignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far, in order.
    pub async fn emitted(&self) -> Vec<Signal> {
        self.emitted.lock().await.clone()
    }
}

#[async_trait]
impl SignalBus for InMemorySignalBus {
    async fn emit(&self, signal: Signal) -> Result<()> {
        self.emitted.lock().await.push(signal);
        Ok(())
    }
}
