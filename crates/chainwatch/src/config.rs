//! Configuration types.

use std::time::Duration;

/// Polling behavior for a single watcher.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between polling cycles.
    pub interval: Duration,
    /// Maximum number of blocks to query per cycle.
    pub batch_size: u64,
    /// Number of blocks below the chain tip considered final.
    pub confirmations: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            batch_size: 1000,
            confirmations: 0,
        }
    }
}

/// Global configuration for a [`ChainWatch`](crate::ChainWatch)
/// instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default polling behavior for spawned watchers.
    pub poller: PollerConfig,
    /// Log verbosity ("trace", "debug", "info", "warn", "error").
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poller: PollerConfig::default(),
            log_level: "info".into(),
        }
    }
}
