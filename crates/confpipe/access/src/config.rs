//! Facade configuration.

use confpipe_resolver::ResolverConfig;
use confpipe_strategy::StrategyLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the caller-facing facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Deadline applied to every wrapped service call.
    pub call_timeout: Duration,

    /// Request validation limits.
    pub limits: RequestLimits,

    /// Strategy rule size limits.
    pub strategy_limits: StrategyLimits,

    /// Pull-path resolver tuning.
    pub resolver: ResolverConfig,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(5),
            limits: RequestLimits::default(),
            strategy_limits: StrategyLimits::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

/// Limits applied to requests before any service call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestLimits {
    /// Maximum raw or template content size per commit, in bytes.
    pub max_content_bytes: usize,

    /// Maximum config set entries per multi-commit.
    pub max_batch_entries: usize,

    /// Maximum operator name length.
    pub max_operator_len: usize,

    /// Maximum memo length.
    pub max_memo_len: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_content_bytes: 1024 * 1024,
            max_batch_entries: 50,
            max_operator_len: 128,
            max_memo_len: 512,
        }
    }
}
