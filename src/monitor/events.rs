//! Outbound event stream of the monitoring core
//!
//! The session publishes through the [`EventSink`] trait so the core stays testable without
//! a presentation layer attached. Sinks are one-way: implementations must not call back
//! into the `Watchdog` that feeds them.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, mpsc};
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;

/// Identifier carried by every event of one monitoring session
pub type SessionId = Uuid;

/// Phase of the hang/crash state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Process alive and, as far as we know, responsive
    Running,
    /// Sustained low CPU; advisory, monitoring continues
    Hung,
    /// Terminal: crashed, exited, or stopped by the user
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "Running",
            Self::Hung => "Hung",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Conventional prefix of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// Lifecycle information
    Info,
    /// Per-sample usage report
    Metrics,
    /// Skipped tick or other recoverable condition
    Warn,
    /// Hang detected
    Hang,
    /// Monitored process vanished
    Crash,
    /// Monitoring could not start
    Error,
}

impl LogLevel {
    /// Bracketed prefix used in rendered lines
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Info => "[INFO]",
            Self::Metrics => "[METRICS]",
            Self::Warn => "[WARN]",
            Self::Hang => "[HANG]",
            Self::Crash => "[CRASH]",
            Self::Error => "[ERROR]",
        }
    }
}

/// A timestamped, human-readable log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    /// Local time the line was produced
    pub timestamp: DateTime<Local>,
    /// Prefix category
    pub level: LogLevel,
    /// Message body without prefix
    pub message: String,
}

impl LogLine {
    /// Create a line stamped with the current local time
    pub fn now(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level.prefix(),
            self.message
        )
    }
}

/// Events as delivered over a channel
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A log line for the log viewer
    Log(LogLine),
    /// A structured phase transition
    StateChanged {
        /// Session the transition belongs to
        session: SessionId,
        /// New phase
        phase: Phase,
    },
}

/// One-way notification interface consumed by the presentation layer
pub trait EventSink: Send + Sync {
    /// Publish a log line
    fn log(&self, line: &LogLine);

    /// Publish a phase transition
    fn state_changed(&self, session: SessionId, phase: Phase);
}

/// Forwards events into an mpsc channel
pub struct ChannelSink {
    sender: mpsc::Sender<MonitorEvent>,
}

impl ChannelSink {
    /// Wrap the sending half of a channel
    pub fn new(sender: mpsc::Sender<MonitorEvent>) -> Self {
        Self { sender }
    }

    fn send(&self, event: MonitorEvent) {
        if let Err(e) = self.sender.send(event) {
            // Receiver gone; the presentation layer shut down before the core did
            tracing::debug!("Dropping monitor event, receiver disconnected: {:?}", e.0);
        }
    }
}

impl EventSink for ChannelSink {
    fn log(&self, line: &LogLine) {
        self.send(MonitorEvent::Log(line.clone()));
    }

    fn state_changed(&self, session: SessionId, phase: Phase) {
        self.send(MonitorEvent::StateChanged { session, phase });
    }
}

/// Appends every log line to a text file
///
/// Write failures are reported through `tracing` and never reach the session.
pub struct LogFileSink {
    file: Mutex<File>,
}

impl LogFileSink {
    /// Open (or create) `path` for appending
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for LogFileSink {
    fn log(&self, line: &LogLine) {
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{line}") {
            warn!("Failed to append to event log: {}", e);
        }
    }

    fn state_changed(&self, _session: SessionId, _phase: Phase) {}
}

/// Delivers every event to each inner sink in order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    /// Create an empty fan-out
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink; builder style
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn log(&self, line: &LogLine) {
        for sink in &self.sinks {
            sink.log(line);
        }
    }

    fn state_changed(&self, session: SessionId, phase: Phase) {
        for sink in &self.sinks {
            sink.state_changed(session, phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingSink, create_test_dir};

    #[test]
    fn test_log_line_rendering() {
        let line = LogLine::now(LogLevel::Crash, "Process 42 for Portal 2 is no longer running.");
        let rendered = line.to_string();
        assert!(rendered.contains("[CRASH] Process 42 for Portal 2"));
        // HH:MM:SS prefix
        assert_eq!(rendered.as_bytes()[2], b':');
        assert_eq!(rendered.as_bytes()[5], b':');
    }

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (tx, rx) = mpsc::channel();
        let sink = ChannelSink::new(tx);
        let session = Uuid::new_v4();

        sink.log(&LogLine::now(LogLevel::Info, "first"));
        sink.state_changed(session, Phase::Running);

        match rx.try_recv().unwrap() {
            MonitorEvent::Log(line) => assert_eq!(line.message, "first"),
            MonitorEvent::StateChanged { .. } => panic!("Expected log line first"),
        }
        assert_eq!(
            rx.try_recv().unwrap(),
            MonitorEvent::StateChanged {
                session,
                phase: Phase::Running
            }
        );
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let sink = ChannelSink::new(tx);
        sink.log(&LogLine::now(LogLevel::Info, "nobody listening"));
        sink.state_changed(Uuid::new_v4(), Phase::Stopped);
    }

    #[test]
    fn test_log_file_sink_appends_lines() {
        let dir = create_test_dir();
        let path = dir.path().join("logs").join("events.log");

        let sink = LogFileSink::open(&path).unwrap();
        sink.log(&LogLine::now(LogLevel::Info, "Monitoring started"));
        sink.state_changed(Uuid::new_v4(), Phase::Running);
        sink.log(&LogLine::now(LogLevel::Hang, "Portal 2 appears unresponsive"));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] Monitoring started"));
        assert!(lines[1].contains("[HANG]"));
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let first = Arc::new(RecordingSink::default());
        let second = Arc::new(RecordingSink::default());
        let fanout = FanoutSink::new()
            .with(first.clone())
            .with(second.clone());

        fanout.log(&LogLine::now(LogLevel::Warn, "skipped"));
        fanout.state_changed(Uuid::new_v4(), Phase::Hung);

        for sink in [first, second] {
            assert_eq!(sink.lines().len(), 1);
            assert_eq!(sink.phases(), vec![Phase::Hung]);
        }
    }
}
