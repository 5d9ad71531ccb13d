//! Configuration structures for the bhav analytics system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ranking and rolling-average configuration.
    pub analytics: AnalyticsConfig,
    /// Snapshot pooling configuration.
    pub history: HistoryConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values that would make the aggregators meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.analytics.top_n == 0 {
            return Err(Error::config("analytics.top_n must be at least 1"));
        }
        if self.analytics.lookback_days == 0 {
            return Err(Error::config("analytics.lookback_days must be at least 1"));
        }
        if self.history.max_concurrent_fetches == 0 {
            return Err(Error::config(
                "history.max_concurrent_fetches must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Single-day ranking and rolling-average configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Entries kept by each top-N ranking.
    pub top_n: usize,
    /// Trading days in the trailing average (excluding today).
    pub lookback_days: usize,
}

impl AnalyticsConfig {
    /// Snapshots a symbol needs before it is evaluated: the window plus today.
    pub fn min_history(&self) -> usize {
        self.lookback_days.saturating_add(1)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_n: 20,
            lookback_days: 21,
        }
    }
}

/// Snapshot pooling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum snapshot fetches in flight at once.
    pub max_concurrent_fetches: usize,
    /// Snapshots older than this many days are eligible for cleanup.
    pub retention_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            retention_days: 30,
        }
    }
}
