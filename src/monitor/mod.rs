//! Process monitoring module
//!
//! Watches one running game for crashes and hangs.
//!
//! # Overview
//!
//! - **Locate** the target's process once by executable name ([`ProcessLocator`])
//! - **Sample** its CPU and memory every tick ([`UsageSampler`])
//! - **Classify** each outcome: crashed, hung, or running ([`Classifier`])
//! - **Publish** log lines and phase transitions ([`EventSink`])
//!
//! # Architecture
//!
//! ```text
//! SessionHandle (worker thread, recv_timeout = timer)
//!      │ tick
//!      ▼
//! UsageSampler ──► Classifier ──► MonitorSession::publish ──► EventSink
//! ```
//!
//! Host-wide metrics ([`HostMetricsSampler`]) run on their own thread and are unrelated
//! to any session.
//!
//! # Known Limitations
//!
//! - **Name collisions**: several processes with the same executable name cannot be told
//!   apart; the lowest pid is monitored.
//! - **Pid reuse**: a pid recycled by the OS after the game exits is not detected.

pub mod classifier;
pub mod events;
pub mod host_metrics;
pub mod probe;
pub mod session;
pub mod target;

pub use classifier::{Classifier, MonitorState, Verdict};
pub use events::{
    ChannelSink, EventSink, FanoutSink, LogFileSink, LogLevel, LogLine, MonitorEvent, Phase,
    SessionId,
};
pub use host_metrics::{HostMetrics, HostMetricsHandle, HostMetricsSampler};
pub use probe::{ProcessBackend, ProcessLocator, SysinfoBackend, UsageSample, UsageSampler};
pub use session::{MonitorSession, SessionHandle};
pub use target::{ProcessHandle, Target};
