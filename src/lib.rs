//! `GameWatch` - Crash and hang watchdog for installed games
//!
//! Watches one running game, sampling its CPU and memory on a fixed interval. A vanished
//! process is reported as a crash; sustained near-zero CPU is reported once as a hang.
//! The `Watchdog` owns the single active session, `MonitorSession` runs the
//! sample/classify/publish tick on its own worker thread, and every outcome reaches the
//! presentation layer through an `EventSink`.
//!
//! # Collaborators
//!
//! - Steam library discovery for the game list (`discovery`)
//! - Host-wide CPU and memory metrics (`monitor::host_metrics`)

// Module declarations
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod monitor;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use controller::Watchdog;
pub use error::{GameWatchError, Result};
