#![expect(
    clippy::unwrap_used,
    reason = "Test utilities use .unwrap() for brevity"
)]

//! Shared test utilities for `GameWatch` unit tests.
//!
//! This module provides common test doubles used across multiple test modules.
//! It is only compiled during testing (`#[cfg(test)]`).

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use crate::error::{GameWatchError, Result, StringError};
use crate::monitor::{
    EventSink, LogLine, MonitorEvent, Phase, ProcessBackend, ProcessHandle, ProcessLocator,
    SessionId, Target, UsageSample, UsageSampler,
};

/// Helper function to create a temporary test directory using tempfile.
/// Returns a `TempDir` that automatically cleans up when dropped.
pub fn create_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Sink that records every event in publication order
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<MonitorEvent>>,
}

impl RecordingSink {
    /// All recorded events
    pub fn events(&self) -> Vec<MonitorEvent> {
        self.events.lock().clone()
    }

    /// Recorded log lines
    pub fn lines(&self) -> Vec<LogLine> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MonitorEvent::Log(line) => Some(line),
                MonitorEvent::StateChanged { .. } => None,
            })
            .collect()
    }

    /// Recorded transitions with their session
    pub fn transitions(&self) -> Vec<(SessionId, Phase)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                MonitorEvent::StateChanged { session, phase } => Some((session, phase)),
                MonitorEvent::Log(_) => None,
            })
            .collect()
    }

    /// Recorded phases
    pub fn phases(&self) -> Vec<Phase> {
        self.transitions().into_iter().map(|(_, phase)| phase).collect()
    }

    /// Poll until `phase` was recorded or `timeout` elapsed
    pub fn wait_for_phase(&self, phase: Phase, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.phases().contains(&phase) {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        self.phases().contains(&phase)
    }
}

impl EventSink for RecordingSink {
    fn log(&self, line: &LogLine) {
        self.events.lock().push(MonitorEvent::Log(line.clone()));
    }

    fn state_changed(&self, session: SessionId, phase: Phase) {
        self.events
            .lock()
            .push(MonitorEvent::StateChanged { session, phase });
    }
}

/// One scripted sampler outcome
#[derive(Debug, Clone, Copy)]
pub enum Step {
    /// Successful sample with this CPU percentage
    Cpu(f32),
    /// The process is gone
    Gone,
    /// A transient fault
    Fault,
    /// The sampler panics
    Panic,
}

/// Sampler replaying a fixed script, then reporting steady activity
pub struct ScriptedSampler {
    steps: VecDeque<Step>,
}

impl ScriptedSampler {
    /// Sampler for `steps`
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
        }
    }
}

impl UsageSampler for ScriptedSampler {
    fn sample(&mut self, handle: ProcessHandle) -> Result<UsageSample> {
        match self.steps.pop_front().unwrap_or(Step::Cpu(5.0)) {
            Step::Cpu(cpu_percent) => Ok(UsageSample {
                cpu_percent,
                memory_bytes: 256 * 1024 * 1024,
            }),
            Step::Gone => Err(GameWatchError::ProcessGone { pid: handle.pid() }),
            Step::Fault => Err(GameWatchError::SamplerTransientFault(StringError::new(
                "access denied",
            ))),
            Step::Panic => panic!("scripted sampler panic"),
        }
    }
}

/// Backend with a fixed resolution result and scripted samplers
pub struct StaticBackend {
    pid: Option<u32>,
    steps: Vec<Step>,
}

impl StaticBackend {
    /// Every target resolves to `pid`; each sampler replays `steps`
    pub fn running(pid: u32, steps: Vec<Step>) -> Self {
        Self {
            pid: Some(pid),
            steps,
        }
    }

    /// No target resolves
    pub fn not_found() -> Self {
        Self {
            pid: None,
            steps: Vec::new(),
        }
    }
}

impl ProcessLocator for StaticBackend {
    fn resolve(&self, target: &Target) -> Result<ProcessHandle> {
        self.pid
            .map(ProcessHandle::from_pid)
            .ok_or_else(|| GameWatchError::TargetNotFound {
                display_name: target.display_name.clone(),
                process_name: target.process_name.clone(),
            })
    }
}

impl ProcessBackend for StaticBackend {
    fn open_sampler(&self, _handle: ProcessHandle) -> Box<dyn UsageSampler> {
        Box::new(ScriptedSampler::new(self.steps.clone()))
    }
}

#[test]
fn test_recording_sink_splits_events() {
    let sink = RecordingSink::default();
    let session = uuid::Uuid::new_v4();
    sink.log(&LogLine::now(crate::monitor::LogLevel::Info, "hello"));
    sink.state_changed(session, Phase::Hung);

    assert_eq!(sink.events().len(), 2);
    assert_eq!(sink.lines()[0].message, "hello");
    assert_eq!(sink.transitions(), vec![(session, Phase::Hung)]);
    assert!(sink.wait_for_phase(Phase::Hung, Duration::from_millis(1)));
    assert!(!sink.wait_for_phase(Phase::Stopped, Duration::from_millis(10)));
}

#[test]
fn test_scripted_sampler_defaults_to_activity() {
    let mut sampler = ScriptedSampler::new(vec![Step::Gone]);
    let handle = ProcessHandle::from_pid(3);
    assert!(matches!(
        sampler.sample(handle),
        Err(GameWatchError::ProcessGone { pid: 3 })
    ));
    assert!((sampler.sample(handle).unwrap().cpu_percent - 5.0).abs() < f32::EPSILON);
}
