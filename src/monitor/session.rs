//! Monitoring session
//!
//! A [`MonitorSession`] owns everything one monitoring run needs: the target, its
//! resolved process, a sampler and the classifier state. [`SessionHandle`] runs it on a
//! background thread that doubles as the sampling timer.
//!
//! # Timer
//!
//! The worker waits on a stop channel with `recv_timeout(sample_interval)`:
//! - timeout: one tick (sample, classify, publish), fully completed before the next wait
//! - message or disconnect: user stop, then exit
//!
//! Ticks are therefore strictly sequential and the worker is the only code touching the
//! classifier state. A crash ends the loop from inside the tick, so a later `stop()` has
//! nothing left to stop and emits nothing.

use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::error::{GameWatchError, Result, StringError};
use crate::monitor::classifier::{Classifier, MonitorState, Verdict};
use crate::monitor::events::{EventSink, LogLevel, LogLine, Phase, SessionId};
use crate::monitor::probe::{UsageSample, UsageSampler};
use crate::monitor::target::{ProcessHandle, Target};

/// One monitoring run, from start to terminal stop
pub struct MonitorSession {
    id: SessionId,
    target: Target,
    handle: ProcessHandle,
    sampler: Box<dyn UsageSampler>,
    classifier: Classifier,
    sink: Arc<dyn EventSink>,
}

impl MonitorSession {
    /// Create a session with fresh `Running` state
    pub fn new(
        target: Target,
        handle: ProcessHandle,
        sampler: Box<dyn UsageSampler>,
        config: &MonitorConfig,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            handle,
            sampler,
            classifier: Classifier::new(config),
            sink,
        }
    }

    /// Session identifier carried on every event
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Monitored target
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Process being sampled
    pub fn process(&self) -> ProcessHandle {
        self.handle
    }

    /// Classifier state
    pub fn state(&self) -> MonitorState {
        self.classifier.state()
    }

    /// Publish the start of monitoring
    pub fn announce_start(&self) {
        info!(
            "Monitoring started for {} (PID: {}, session {})",
            self.target.display_name, self.handle, self.id
        );
        self.emit(
            LogLevel::Info,
            format!(
                "Monitoring started for {} (PID: {}).",
                self.target.display_name, self.handle
            ),
        );
        self.sink.state_changed(self.id, Phase::Running);
    }

    /// Run one tick: sample, classify, publish
    ///
    /// Returns `Break` once the session reached `Stopped`.
    pub fn tick(&mut self) -> ControlFlow<()> {
        let outcome = self.sample_guarded();
        let verdict = self.classifier.observe(&outcome);
        self.publish(&verdict);

        if self.classifier.state().phase == Phase::Stopped {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    /// Apply an explicit stop, publishing the terminal event once
    pub fn stop_by_user(&mut self) {
        if !self.classifier.stop() {
            return;
        }
        info!(
            "Monitoring of {} stopped by user (session {})",
            self.target.display_name, self.id
        );
        self.emit(LogLevel::Info, "Monitoring stopped by user.");
        self.sink.state_changed(self.id, Phase::Stopped);
    }

    /// Sample without letting a sampler panic escape the tick
    fn sample_guarded(&mut self) -> Result<UsageSample> {
        let handle = self.handle;
        let sampler = &mut self.sampler;
        match panic::catch_unwind(AssertUnwindSafe(|| sampler.sample(handle))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "sampler panicked".to_string());
                error!("Sampler panicked for PID {}: {}", handle, reason);
                Err(GameWatchError::SamplerTransientFault(StringError::new(
                    reason,
                )))
            }
        }
    }

    fn publish(&self, verdict: &Verdict) {
        let name = &self.target.display_name;
        let hang_tick_threshold = self.classifier.hang_tick_threshold();
        match verdict {
            Verdict::Active(sample) => {
                debug!("{} active: {:.1}% CPU", name, sample.cpu_percent);
                self.emit(LogLevel::Metrics, usage_line(name, sample));
            }
            Verdict::Idle {
                sample,
                low_activity_ticks,
            } => {
                debug!(
                    "{} idle for {}/{} samples",
                    name, low_activity_ticks, hang_tick_threshold
                );
                self.emit(
                    LogLevel::Metrics,
                    format!(
                        "{} (idle {}/{})",
                        usage_line(name, sample),
                        low_activity_ticks,
                        hang_tick_threshold
                    ),
                );
            }
            Verdict::HangDetected {
                sample,
                low_activity_ticks,
            } => {
                warn!(
                    "{} (PID {}) hang detected after {} low-activity samples",
                    name, self.handle, low_activity_ticks
                );
                self.emit(
                    LogLevel::Hang,
                    format!(
                        "{} (PID {}) appears unresponsive: CPU below {:.1}% for {} consecutive \
                         samples (last {:.1}%).",
                        name,
                        self.handle,
                        self.classifier.activity_cpu_threshold(),
                        low_activity_ticks,
                        sample.cpu_percent
                    ),
                );
                self.sink.state_changed(self.id, Phase::Hung);
            }
            Verdict::StillHung { sample, .. } => {
                self.emit(
                    LogLevel::Metrics,
                    format!("{} (unresponsive)", usage_line(name, sample)),
                );
            }
            Verdict::Crashed { pid } => {
                warn!("Process {} for {} is gone, ending session {}", pid, name, self.id);
                self.emit(
                    LogLevel::Crash,
                    format!("Process {pid} for {name} is no longer running."),
                );
                self.sink.state_changed(self.id, Phase::Stopped);
            }
            Verdict::Skipped(reason) => {
                warn!("Skipping sample for {}: {}", name, reason);
                self.emit(
                    LogLevel::Warn,
                    format!("Skipped sample for {name}: {reason}"),
                );
            }
            Verdict::Ignored => {}
        }
    }

    fn emit(&self, level: LogLevel, message: impl Into<String>) {
        self.sink.log(&LogLine::now(level, message));
    }
}

fn usage_line(name: &str, sample: &UsageSample) -> String {
    format!(
        "{} CPU: {:.1}% | RAM: {:.0} MB",
        name,
        sample.cpu_percent,
        sample.memory_mb()
    )
}

/// Owner of a running session's worker thread
///
/// Dropping the handle stops the session.
pub struct SessionHandle {
    id: SessionId,
    stop_sender: mpsc::Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Arm the timer: spawn the worker that ticks every `interval`
    pub fn spawn(session: MonitorSession, interval: Duration) -> Result<Self> {
        let id = session.id();
        let (stop_sender, stop_receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name(format!("gamewatch-session-{id}"))
            .spawn(move || run_session(session, &stop_receiver, interval))?;

        Ok(Self {
            id,
            stop_sender,
            worker: Some(worker),
        })
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Whether the worker has exited (crash or stop)
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Disarm the timer and wait for the worker to exit
    ///
    /// Idempotent. When called from the worker thread itself the stop is only signalled,
    /// and the worker exits before its next tick.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        // Fails when the worker already exited after a crash; nothing to signal then
        let _ = self.stop_sender.send(());

        if worker.thread().id() == thread::current().id() {
            debug!("Stop requested from session {} worker, not joining", self.id);
            return;
        }

        if worker.join().is_err() {
            error!("Session {} worker panicked", self.id);
        } else {
            debug!("Session {} worker joined", self.id);
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_session(
    mut session: MonitorSession,
    stop_receiver: &mpsc::Receiver<()>,
    interval: Duration,
) {
    use std::sync::mpsc::RecvTimeoutError;

    loop {
        match stop_receiver.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                if session.tick().is_break() {
                    break;
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                session.stop_by_user();
                break;
            }
        }
    }
    debug!("Session {} worker exiting", session.id());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingSink, ScriptedSampler, Step};

    fn config(hang_ticks: u32) -> MonitorConfig {
        MonitorConfig {
            sample_interval_ms: 100,
            activity_cpu_threshold: 1.0,
            hang_tick_threshold: hang_ticks,
        }
    }

    fn session(steps: Vec<Step>, hang_ticks: u32) -> (MonitorSession, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let target = Target::new("Portal 2", "C:\\Games\\portal2.exe").unwrap();
        let session = MonitorSession::new(
            target,
            ProcessHandle::from_pid(4242),
            Box::new(ScriptedSampler::new(steps)),
            &config(hang_ticks),
            sink.clone(),
        );
        (session, sink)
    }

    #[test]
    fn test_announce_start() {
        let (session, sink) = session(vec![], 5);
        session.announce_start();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].level, LogLevel::Info);
        assert_eq!(lines[0].message, "Monitoring started for Portal 2 (PID: 4242).");
        assert_eq!(sink.transitions(), vec![(session.id(), Phase::Running)]);
    }

    #[test]
    fn test_hang_scenario_publishes_one_hang() {
        let steps = [5.0, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5]
            .into_iter()
            .map(Step::Cpu)
            .collect();
        let (mut session, sink) = session(steps, 5);

        for _ in 0..8 {
            assert!(session.tick().is_continue());
        }

        let levels: Vec<LogLevel> = sink.lines().iter().map(|l| l.level).collect();
        assert_eq!(levels[0], LogLevel::Metrics);
        assert_eq!(levels[5], LogLevel::Hang);
        assert_eq!(levels.iter().filter(|l| **l == LogLevel::Hang).count(), 1);
        assert_eq!(sink.phases(), vec![Phase::Hung]);
        assert_eq!(session.state().phase, Phase::Hung);
    }

    #[test]
    fn test_crash_scenario_breaks_loop() {
        let (mut session, sink) = session(vec![Step::Cpu(2.0), Step::Cpu(2.0), Step::Gone], 5);

        assert!(session.tick().is_continue());
        assert!(session.tick().is_continue());
        assert!(session.tick().is_break());

        let lines = sink.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].level, LogLevel::Crash);
        assert_eq!(
            lines[2].message,
            "Process 4242 for Portal 2 is no longer running."
        );
        assert_eq!(sink.phases(), vec![Phase::Stopped]);

        // Stop after crash emits nothing
        session.stop_by_user();
        assert_eq!(sink.lines().len(), 3);
        assert_eq!(sink.phases(), vec![Phase::Stopped]);
    }

    #[test]
    fn test_sampler_panic_is_a_skipped_tick() {
        let (mut session, sink) = session(vec![Step::Panic, Step::Cpu(3.0)], 5);

        assert!(session.tick().is_continue());
        assert!(session.tick().is_continue());

        let lines = sink.lines();
        assert_eq!(lines[0].level, LogLevel::Warn);
        assert!(lines[0].message.contains("scripted sampler panic"));
        assert_eq!(lines[1].level, LogLevel::Metrics);
        assert_eq!(session.state().phase, Phase::Running);
    }

    #[test]
    fn test_transient_fault_is_logged_not_fatal() {
        let (mut session, sink) = session(vec![Step::Fault, Step::Cpu(0.0)], 5);

        assert!(session.tick().is_continue());
        assert!(session.tick().is_continue());

        let lines = sink.lines();
        assert_eq!(lines[0].level, LogLevel::Warn);
        assert!(sink.phases().is_empty());
        assert_eq!(session.state().low_activity_ticks, 1);
    }

    #[test]
    fn test_activity_while_hung_publishes_no_transition() {
        let steps = vec![Step::Cpu(0.0), Step::Cpu(0.0), Step::Cpu(30.0), Step::Cpu(0.0)];
        let (mut session, sink) = session(steps, 2);
        for _ in 0..4 {
            assert!(session.tick().is_continue());
        }

        assert_eq!(sink.phases(), vec![Phase::Hung]);
        let lines = sink.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2].level, LogLevel::Metrics);
        assert!(lines[3].message.contains("unresponsive"));
        assert_eq!(session.state().phase, Phase::Hung);
    }

    #[test]
    fn test_worker_crash_then_stop_is_noop() {
        let (session, sink) = session(vec![Step::Cpu(2.0), Step::Gone], 5);
        let mut handle = SessionHandle::spawn(session, Duration::from_millis(10)).unwrap();

        assert!(sink.wait_for_phase(Phase::Stopped, Duration::from_secs(5)));
        handle.stop();
        handle.stop();

        assert!(handle.is_finished());
        assert_eq!(sink.phases(), vec![Phase::Stopped]);
        assert_eq!(
            sink.lines()
                .iter()
                .filter(|l| l.message.contains("stopped by user"))
                .count(),
            0
        );
    }

    #[test]
    fn test_worker_stop_emits_user_stopped_once() {
        let (session, sink) = session(vec![], 5);
        let mut handle = SessionHandle::spawn(session, Duration::from_millis(10)).unwrap();

        handle.stop();
        let after_stop = sink.lines().len();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(sink.lines().len(), after_stop, "no ticks after stop returns");
        assert_eq!(sink.phases().last(), Some(&Phase::Stopped));
        assert_eq!(
            sink.phases().iter().filter(|p| **p == Phase::Stopped).count(),
            1
        );
        handle.stop();
        assert_eq!(sink.lines().len(), after_stop);
    }

    #[test]
    fn test_drop_stops_worker() {
        let (session, sink) = session(vec![], 5);
        let handle = SessionHandle::spawn(session, Duration::from_millis(10)).unwrap();
        drop(handle);
        assert_eq!(sink.phases(), vec![Phase::Stopped]);
    }
}
