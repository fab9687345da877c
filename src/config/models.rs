//! Configuration data models
//!
//! This module defines the data structures used for watchdog configuration.

use crate::error::{GameWatchError, Result, StringError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lowest accepted sampling interval
pub const MIN_SAMPLE_INTERVAL_MS: u64 = 100;
/// Highest accepted sampling interval
pub const MAX_SAMPLE_INTERVAL_MS: u64 = 60_000;

fn check_interval(field: &str, interval_ms: u64) -> Result<()> {
    if (MIN_SAMPLE_INTERVAL_MS..=MAX_SAMPLE_INTERVAL_MS).contains(&interval_ms) {
        return Ok(());
    }
    Err(GameWatchError::ConfigError(StringError::new(format!(
        "{field} must be between {MIN_SAMPLE_INTERVAL_MS} and {MAX_SAMPLE_INTERVAL_MS}, \
         got {interval_ms}"
    ))))
}

/// Tunables of the hang/crash classifier and its sampling timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Time between two samples of the monitored process, in milliseconds
    pub sample_interval_ms: u64,
    /// CPU percentage at or above which a sample counts as activity
    pub activity_cpu_threshold: f32,
    /// Consecutive low-activity samples before the process is reported as hung
    pub hang_tick_threshold: u32,
}

impl MonitorConfig {
    /// Sampling interval as a `Duration`
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    /// Reject values the classifier cannot work with
    pub fn validate(&self) -> Result<()> {
        check_interval("sample_interval_ms", self.sample_interval_ms)?;
        if !self.activity_cpu_threshold.is_finite() || self.activity_cpu_threshold < 0.0 {
            return Err(GameWatchError::ConfigError(StringError::new(format!(
                "activity_cpu_threshold must be a non-negative number, got {}",
                self.activity_cpu_threshold
            ))));
        }
        if self.hang_tick_threshold == 0 {
            return Err(GameWatchError::ConfigError(StringError::new(
                "hang_tick_threshold must be at least 1",
            )));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 2000,
            activity_cpu_threshold: 1.0,
            hang_tick_threshold: 5,
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Process monitoring tunables
    pub monitor: MonitorConfig,
    /// Host CPU/memory sampling interval in milliseconds
    pub host_metrics_interval_ms: u64,
    /// Whether monitoring log lines are appended to `events.log`
    pub event_log_enabled: bool,
}

impl AppConfig {
    /// Host metrics interval as a `Duration`
    pub fn host_metrics_interval(&self) -> Duration {
        Duration::from_millis(self.host_metrics_interval_ms)
    }

    /// Reject a host metrics interval outside the sampling range
    pub fn validate_host_metrics_interval(&self) -> Result<()> {
        check_interval("host_metrics_interval_ms", self.host_metrics_interval_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            host_metrics_interval_ms: 2000,
            event_log_enabled: true,
        }
    }
}
