//! Host-wide CPU and memory metrics
//!
//! Independent of any monitoring session. The presentation layer starts a
//! [`HostMetricsSampler`] once and receives a [`HostMetrics`] snapshot per interval over a
//! channel until the returned handle is stopped or dropped.

use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use sysinfo::System;
use tracing::{debug, info};

use crate::error::Result;

/// One host-wide snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostMetrics {
    /// Average CPU utilization across all cores, 0 to 100
    pub cpu_percent: f32,
    /// Used memory as a share of total, 0 to 100
    pub memory_used_percent: f32,
    /// Used memory in bytes
    pub used_memory_bytes: u64,
    /// Total memory in bytes
    pub total_memory_bytes: u64,
}

/// Used memory as a percentage of total; zero when total is unknown
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    reason = "Percentage for display; f64 to f32 truncation and u64 precision loss are irrelevant at this scale"
)]
pub fn memory_used_percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        return 0.0;
    }
    ((used as f64 / total as f64) * 100.0).clamp(0.0, 100.0) as f32
}

/// Samples host CPU and memory
pub struct HostMetricsSampler {
    system: System,
}

impl HostMetricsSampler {
    /// Create a sampler and take the baseline CPU measurement
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self { system }
    }

    /// Take one snapshot
    ///
    /// CPU usage is computed relative to the previous call, so the first snapshot taken
    /// right after [`new`](Self::new) may read zero.
    pub fn sample(&mut self) -> HostMetrics {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let used = self.system.used_memory();
        let total = self.system.total_memory();
        HostMetrics {
            cpu_percent: self.system.global_cpu_usage(),
            memory_used_percent: memory_used_percent(used, total),
            used_memory_bytes: used,
            total_memory_bytes: total,
        }
    }

    /// Sample every `interval` on a background thread
    ///
    /// The first snapshot is sent after one interval. The thread exits when the handle is
    /// stopped or dropped, or when the receiver goes away.
    pub fn start(
        mut self,
        interval: Duration,
        sender: mpsc::Sender<HostMetrics>,
    ) -> Result<HostMetricsHandle> {
        let (stop_sender, stop_receiver) = mpsc::channel::<()>();

        let worker = thread::Builder::new()
            .name("gamewatch-host-metrics".to_string())
            .spawn(move || {
                info!(
                    "Host metrics sampler started ({}ms interval)",
                    interval.as_millis()
                );
                while let Err(mpsc::RecvTimeoutError::Timeout) =
                    stop_receiver.recv_timeout(interval)
                {
                    let metrics = self.sample();
                    if sender.send(metrics).is_err() {
                        debug!("Host metrics receiver disconnected");
                        break;
                    }
                }
                info!("Host metrics sampler stopped");
            })?;

        Ok(HostMetricsHandle {
            stop_sender,
            worker: Some(worker),
        })
    }
}

impl Default for HostMetricsSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Stops the host metrics thread when dropped
pub struct HostMetricsHandle {
    stop_sender: mpsc::Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl HostMetricsHandle {
    /// Stop sampling and wait for the thread to exit; idempotent
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.stop_sender.send(());
            let _ = worker.join();
        }
    }
}

impl Drop for HostMetricsHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
