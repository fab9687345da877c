//! Hang/crash classifier
//!
//! A pure state machine fed one sampling outcome per tick. It never touches timers or
//! sinks, so debounce and deduplication can be tested without timing.
//!
//! # State machine
//!
//! ```text
//!            low CPU x hang_tick_threshold
//!   Running ------------------------------> Hung
//!      \                                     |
//!       \ ProcessGone / stop                 | ProcessGone / stop
//!        v                                   v
//!      Stopped                             Stopped
//! ```
//!
//! The hang warning fires once when entering `Hung`. `Hung` is left only for `Stopped`:
//! further samples keep counting (an active one resets the counter) but stay silent.

use crate::config::MonitorConfig;
use crate::error::{GameWatchError, Result};
use crate::monitor::events::Phase;
use crate::monitor::probe::UsageSample;

/// Classifier state carried across ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorState {
    /// Consecutive samples below the activity threshold
    pub low_activity_ticks: u32,
    /// Current phase
    pub phase: Phase,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            low_activity_ticks: 0,
            phase: Phase::Running,
        }
    }
}

/// Outcome of classifying one tick
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// CPU at or above the threshold; resets the low-activity counter
    Active(UsageSample),
    /// Low CPU, still below the hang threshold
    Idle {
        /// The sample
        sample: UsageSample,
        /// Consecutive low samples so far
        low_activity_ticks: u32,
    },
    /// Low CPU reached the hang threshold; entered `Hung`
    HangDetected {
        /// The sample
        sample: UsageSample,
        /// Consecutive low samples so far
        low_activity_ticks: u32,
    },
    /// Low CPU while already hung; no new warning
    StillHung {
        /// The sample
        sample: UsageSample,
        /// Consecutive low samples so far
        low_activity_ticks: u32,
    },
    /// The process vanished; entered `Stopped`
    Crashed {
        /// Process id that vanished
        pid: u32,
    },
    /// Sampling failed for another reason; the tick is skipped
    Skipped(String),
    /// The classifier is already stopped
    Ignored,
}

impl Verdict {
    /// The phase entered by this verdict, if it changed
    pub fn phase_change(&self) -> Option<Phase> {
        match self {
            Self::HangDetected { .. } => Some(Phase::Hung),
            Self::Crashed { .. } => Some(Phase::Stopped),
            Self::Active(_)
            | Self::Idle { .. }
            | Self::StillHung { .. }
            | Self::Skipped(_)
            | Self::Ignored => None,
        }
    }
}

/// Debounced hang detector and crash recognizer
#[derive(Debug, Clone)]
pub struct Classifier {
    activity_cpu_threshold: f32,
    hang_tick_threshold: u32,
    state: MonitorState,
}

impl Classifier {
    /// Create a classifier in `Running` with a zero counter
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            activity_cpu_threshold: config.activity_cpu_threshold,
            hang_tick_threshold: config.hang_tick_threshold.max(1),
            state: MonitorState::default(),
        }
    }

    /// Current state
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// CPU percentage at or above which a sample counts as activity
    pub fn activity_cpu_threshold(&self) -> f32 {
        self.activity_cpu_threshold
    }

    /// Consecutive low samples that trigger a hang, never below one
    pub fn hang_tick_threshold(&self) -> u32 {
        self.hang_tick_threshold
    }

    /// Feed one sampling outcome
    pub fn observe(&mut self, outcome: &Result<UsageSample>) -> Verdict {
        if self.state.phase == Phase::Stopped {
            return Verdict::Ignored;
        }

        let sample = match outcome {
            Ok(sample) => *sample,
            Err(GameWatchError::ProcessGone { pid }) => {
                self.state.phase = Phase::Stopped;
                return Verdict::Crashed { pid: *pid };
            }
            Err(other) => return Verdict::Skipped(other.to_string()),
        };

        if sample.cpu_percent >= self.activity_cpu_threshold {
            self.state.low_activity_ticks = 0;
            return Verdict::Active(sample);
        }

        self.state.low_activity_ticks = self.state.low_activity_ticks.saturating_add(1);
        let low_activity_ticks = self.state.low_activity_ticks;

        match self.state.phase {
            Phase::Hung => Verdict::StillHung {
                sample,
                low_activity_ticks,
            },
            _ if low_activity_ticks >= self.hang_tick_threshold => {
                self.state.phase = Phase::Hung;
                Verdict::HangDetected {
                    sample,
                    low_activity_ticks,
                }
            }
            _ => Verdict::Idle {
                sample,
                low_activity_ticks,
            },
        }
    }

    /// Apply an explicit stop
    ///
    /// Returns `false` when already stopped, so the terminal event is emitted once.
    pub fn stop(&mut self) -> bool {
        if self.state.phase == Phase::Stopped {
            return false;
        }
        self.state.phase = Phase::Stopped;
        true
    }
}
