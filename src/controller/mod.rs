//! Watchdog control module
//!
//! The control surface the presentation layer drives.
//!
//! # Overview
//!
//! The [`Watchdog`] is the single owner of the active monitoring session:
//! - **Start** resolves the target and arms a session, replacing any previous one
//! - **Stop** disarms the timer and joins the worker; safe to call at any time
//! - **Events** flow one way to the configured [`EventSink`](crate::monitor::EventSink)
//!
//! # Event Flow
//!
//! ```text
//! Presentation → start_monitoring(target) → Watchdog → ProcessLocator
//!                                               ↓
//!                                         SessionHandle (worker)
//!                                               ↓
//!                                  EventSink → Presentation
//! ```
//!
//! # Replacement
//!
//! Only one target is monitored at a time. `start_monitoring` while a session is active
//! stops and joins the old worker before the new target is even resolved, so no event
//! of the old session follows the new session's start.
//!
//! Sinks must not call back into the `Watchdog`; the session lock is held while the new
//! session announces itself.

pub mod watchdog;

pub use watchdog::Watchdog;
