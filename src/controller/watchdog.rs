//! Watchdog controller implementation
//!
//! Owns the single active monitoring session and exposes the start/stop control surface
//! used by the presentation layer.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::error::{GameWatchError, Result};
use crate::monitor::{
    EventSink, LogLevel, LogLine, MonitorSession, Phase, ProcessBackend, SessionHandle, SessionId,
    Target,
};

/// Single-target crash and hang watchdog
///
/// At most one session is active. Starting a new one stops and joins the previous
/// session first.
pub struct Watchdog {
    config: MonitorConfig,
    backend: Arc<dyn ProcessBackend>,
    sink: Arc<dyn EventSink>,
    /// Handle of the active (or most recently finished) session
    session: Mutex<Option<SessionHandle>>,
}

impl Watchdog {
    /// Create a watchdog; no session is started
    pub fn new(
        config: MonitorConfig,
        backend: Arc<dyn ProcessBackend>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            backend,
            sink,
            session: Mutex::new(None),
        }
    }

    /// Monitoring parameters applied to new sessions
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Start monitoring `target`, replacing any active session
    ///
    /// When no process matches, exactly one `[ERROR]` line is published, no session is
    /// created and the error is returned.
    pub fn start_monitoring(&self, target: Target) -> Result<SessionId> {
        let mut slot = self.session.lock();

        if let Some(mut previous) = slot.take() {
            debug!("Replacing session {}", previous.id());
            previous.stop();
        }

        let handle = match self.backend.resolve(&target) {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not start monitoring {}: {}", target.display_name, e);
                let message = match &e {
                    GameWatchError::TargetNotFound { .. } => format!(
                        "Process {} for {} not found. Is the game running?",
                        target.process_name, target.display_name
                    ),
                    other => format!("Monitoring failed for {}: {other}", target.display_name),
                };
                self.sink.log(&LogLine::now(LogLevel::Error, message));
                return Err(e);
            }
        };

        let sampler = self.backend.open_sampler(handle);
        let session = MonitorSession::new(
            target,
            handle,
            sampler,
            &self.config,
            Arc::clone(&self.sink),
        );
        let id = session.id();
        session.announce_start();

        match SessionHandle::spawn(session, self.config.sample_interval()) {
            Ok(spawned) => {
                info!("Session {} armed ({:?} interval)", id, self.config.sample_interval());
                *slot = Some(spawned);
                Ok(id)
            }
            Err(e) => {
                error!("Failed to spawn session worker: {}", e);
                self.sink.log(&LogLine::now(
                    LogLevel::Error,
                    format!("Monitoring failed: {e}"),
                ));
                self.sink.state_changed(id, Phase::Stopped);
                Err(e)
            }
        }
    }

    /// Stop the active session, if any; idempotent
    ///
    /// Returns after the session worker has exited.
    pub fn stop_monitoring(&self) {
        let previous = self.session.lock().take();
        match previous {
            Some(mut handle) => {
                debug!("Stopping session {}", handle.id());
                handle.stop();
            }
            None => debug!("stop_monitoring called with no session"),
        }
    }

    /// Identifier of the session whose worker is still running
    pub fn active_session(&self) -> Option<SessionId> {
        self.session
            .lock()
            .as_ref()
            .filter(|handle| !handle.is_finished())
            .map(SessionHandle::id)
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}
