//! Application configuration structures.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP, retry and pacing behavior
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Diff summary bounds
    #[serde(default)]
    pub diff: DiffConfig,

    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Log verbosity
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply environment variable overrides for file locations.
    pub fn apply_env(&mut self) {
        if let Ok(path) = env::var("SNAPSHOTS_FILE") {
            if !path.trim().is_empty() {
                self.paths.snapshots_file = PathBuf::from(path);
            }
        }
        if let Ok(path) = env::var("URL_MONITOR_ENTITIES") {
            if !path.trim().is_empty() {
                self.paths.entities_file = PathBuf::from(path);
            }
        }
        if let Ok(path) = env::var("URL_MONITOR_RESULTS") {
            if !path.trim().is_empty() {
                self.paths.results_file = PathBuf::from(path);
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.user_agent.trim().is_empty() {
            return Err(AppError::validation("monitor.user_agent is empty"));
        }
        if self.monitor.timeout_secs == 0 {
            return Err(AppError::validation("monitor.timeout_secs must be > 0"));
        }
        if self.diff.max_lines == 0 {
            return Err(AppError::validation("diff.max_lines must be > 0"));
        }
        if self.diff.max_line_width == 0 {
            return Err(AppError::validation("diff.max_line_width must be > 0"));
        }
        if self.paths.snapshots_file.as_os_str().is_empty() {
            return Err(AppError::validation("paths.snapshots_file is empty"));
        }
        Ok(())
    }
}

/// HTTP client, retry and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt for transient failures
    #[serde(default = "defaults::retry_count")]
    pub retry_count: u32,

    /// Backoff before the first retry; doubles for each further retry
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_ms: u64,

    /// Pause between consecutive page fetches
    #[serde(default = "defaults::politeness_delay")]
    pub politeness_delay_ms: u64,
}

impl MonitorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retry_count: defaults::retry_count(),
            backoff_base_ms: defaults::backoff_base(),
            politeness_delay_ms: defaults::politeness_delay(),
        }
    }
}

/// Bounds applied to diff summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Maximum added (and, separately, removed) lines listed
    #[serde(default = "defaults::max_lines")]
    pub max_lines: usize,

    /// Maximum characters shown per listed line
    #[serde(default = "defaults::max_line_width")]
    pub max_line_width: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            max_lines: defaults::max_lines(),
            max_line_width: defaults::max_line_width(),
        }
    }
}

/// File locations used by a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Persisted snapshot store
    #[serde(default = "defaults::snapshots_file")]
    pub snapshots_file: PathBuf,

    /// TOML list of monitored pages
    #[serde(default = "defaults::entities_file")]
    pub entities_file: PathBuf,

    /// JSON results of the latest run
    #[serde(default = "defaults::results_file")]
    pub results_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            snapshots_file: defaults::snapshots_file(),
            entities_file: defaults::entities_file(),
            results_file: defaults::results_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Monitor defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn retry_count() -> u32 {
        2
    }
    pub fn backoff_base() -> u64 {
        1000
    }
    pub fn politeness_delay() -> u64 {
        1000
    }

    // Diff defaults
    pub fn max_lines() -> usize {
        30
    }
    pub fn max_line_width() -> usize {
        200
    }

    // Path defaults
    pub fn snapshots_file() -> PathBuf {
        PathBuf::from("snapshots.json")
    }
    pub fn entities_file() -> PathBuf {
        PathBuf::from("urls.toml")
    }
    pub fn results_file() -> PathBuf {
        PathBuf::from("url-monitor-results.json")
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
