//! Error types for `GameWatch`
//!
//! This module defines all error types used throughout the watchdog,
//! providing clear error messages and proper error propagation.
//!
//! Error variants use `#[source]` to preserve error chains for better
//! observability and debugging.

use thiserror::Error;

/// Simple error type for wrapping string messages while implementing `std::error::Error`
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StringError(pub String);

impl StringError {
    /// Create a new `StringError` from a string message
    pub fn new(msg: impl Into<String>) -> Box<Self> {
        Box::new(Self(msg.into()))
    }
}

/// Main error type for `GameWatch`
#[derive(Debug, Error)]
pub enum GameWatchError {
    /// No live process matches the target's executable name
    #[error("No running process found for {display_name} ({process_name})")]
    TargetNotFound {
        /// Display name of the target
        display_name: String,
        /// Executable basename that was searched for
        process_name: String,
    },

    /// The monitored process no longer exists
    #[error("Process {pid} is no longer running")]
    ProcessGone {
        /// Identifier of the vanished process
        pid: u32,
    },

    /// Any other sampling-layer fault (permissions, OS hiccups)
    /// Preserves the underlying error source for full error chain transparency
    #[error("Transient sampler fault: {0}")]
    SamplerTransientFault(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The game has no detected executable, so it cannot be monitored
    #[error("No executable detected for {0}")]
    NoExecutable(String),

    /// Game library discovery failed
    /// Preserves the underlying error source for full error chain transparency
    #[error("Game discovery error: {0}")]
    DiscoveryError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration error
    /// Preserves the underlying error source for full error chain transparency
    #[error("Configuration error: {0}")]
    ConfigError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for `GameWatch` operations
pub type Result<T> = std::result::Result<T, GameWatchError>;

/// Convert an error to a user-friendly message
///
/// The messages include troubleshooting hints to help users resolve common issues.
pub fn get_user_friendly_error(error: &GameWatchError) -> String {
    match error {
        GameWatchError::TargetNotFound {
            display_name,
            process_name,
        } => {
            format!(
                "Could not find a running process for {display_name}.\n\n\
                 Please ensure:\n\
                 - The game is running (looking for {process_name})\n\
                 - The game was not started through a launcher with a different executable"
            )
        }
        GameWatchError::ProcessGone { pid } => {
            format!(
                "The monitored process (PID {pid}) is no longer running.\n\n\
                 The game exited or crashed. Start monitoring again after relaunching it."
            )
        }
        GameWatchError::SamplerTransientFault(_) => "Failed to read process usage.\n\n\
             This is usually temporary. If it persists, try running with\n\
             permissions that allow querying other processes."
            .to_string(),
        GameWatchError::NoExecutable(name) => {
            format!(
                "No executable detected for {name}.\n\n\
                 The game cannot be monitored until its executable is known.\n\
                 Try passing the executable name directly."
            )
        }
        GameWatchError::DiscoveryError(_) => "Failed to scan installed games.\n\n\
             Please check that your Steam library folders are readable."
            .to_string(),
        GameWatchError::ConfigError(_) => "Failed to load or save configuration.\n\n\
             Your settings may not persist.\n\
             Check that you have write permissions to the GameWatch config directory."
            .to_string(),
        GameWatchError::IoError(e) => {
            format!(
                "A file system error occurred:\n\n{e}\n\n\
                 Please check file permissions and disk space."
            )
        }
        GameWatchError::JsonError(e) => {
            format!(
                "Configuration file is corrupted:\n\n{e}\n\n\
                 The application will use default settings."
            )
        }
    }
}
