use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Upper bound on concurrent workers, matching the socket budget of a typical host.
pub const MAX_WORKERS: usize = 5_000;

/// Tunables of the scanning engine.
///
/// Missing fields in a config file fall back to the defaults below.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Number of concurrent workers in the pool.
    pub workers: usize,
    /// Connect timeout for a single probe, in milliseconds.
    pub connect_timeout_ms: u64,
    /// How long an idle worker waits on the queue before re-checking the stop signal.
    pub poll_interval_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 200,
            connect_timeout_ms: 500,
            poll_interval_ms: 1_000,
        }
    }
}

impl ScanConfig {
    /// Load a JSON config file. Errors if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file: {}", path.as_ref().display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("invalid config file: {}", path.as_ref().display()))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Worker count clamped to `1..=MAX_WORKERS`.
    pub fn pool_size(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
