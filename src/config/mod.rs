//! Configuration management module
//!
//! This module handles loading, saving, and validating watchdog configuration.
//! Configuration is stored as JSON in the per-user `GameWatch` directory with atomic
//! writes to prevent corruption.

pub mod manager;
pub mod models;

pub use manager::ConfigManager;
pub use models::{AppConfig, MonitorConfig};
