//! Process location and usage sampling
//!
//! Resolves a [`Target`] to a live process once at session start, then samples that
//! process on every tick. The default backend uses `sysinfo`, which works the same way
//! on Windows, Linux and macOS.
//!
//! **Known limitation:** a process id reused by the OS after the game exits would be
//! sampled as if it were the game. This is not guarded against.

use serde::{Deserialize, Serialize};
use std::path::Path;
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tracing::debug;

use crate::error::{GameWatchError, Result};
use crate::monitor::target::{ProcessHandle, Target};

/// Point-in-time resource usage of one process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageSample {
    /// CPU utilization in percent; may exceed 100 on multi-core bursts
    pub cpu_percent: f32,
    /// Resident memory in bytes
    pub memory_bytes: u64,
}

impl UsageSample {
    /// Resident memory in megabytes
    #[expect(
        clippy::cast_precision_loss,
        reason = "Conversion to f64 for display purposes; precision loss is acceptable for human-readable memory values"
    )]
    pub fn memory_mb(&self) -> f64 {
        self.memory_bytes as f64 / 1024.0 / 1024.0
    }
}

/// Resolves a target to a live process
pub trait ProcessLocator: Send + Sync {
    /// Find the process to monitor
    ///
    /// Fails with [`GameWatchError::TargetNotFound`] when nothing matches.
    fn resolve(&self, target: &Target) -> Result<ProcessHandle>;
}

/// Retrieves usage snapshots for a resolved process
///
/// Implementations return [`GameWatchError::ProcessGone`] once the process no longer
/// exists. Every other error is treated by the session as a transient fault.
pub trait UsageSampler: Send {
    /// Take one snapshot
    fn sample(&mut self, handle: ProcessHandle) -> Result<UsageSample>;
}

/// A locator that can also open samplers for the processes it resolves
pub trait ProcessBackend: ProcessLocator {
    /// Create a sampler dedicated to one session
    fn open_sampler(&self, handle: ProcessHandle) -> Box<dyn UsageSampler>;
}

/// Pick the process to monitor among `(pid, executable name)` candidates
///
/// When several processes share the executable name the lowest pid wins. That is the
/// longest-lived instance in most cases and keeps the choice deterministic.
pub fn select_first_match<'a, I>(target: &Target, candidates: I) -> Option<ProcessHandle>
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    candidates
        .into_iter()
        .filter(|(_, name)| target.matches(name))
        .map(|(pid, _)| pid)
        .min()
        .map(ProcessHandle::from_pid)
}

/// `sysinfo`-backed locator and sampler factory
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoBackend;

impl ProcessLocator for SysinfoBackend {
    fn resolve(&self, target: &Target) -> Result<ProcessHandle> {
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        // On Linux `name()` is the truncated comm field, so the executable path is
        // consulted first.
        let candidates: Vec<(u32, String)> = system
            .processes()
            .iter()
            .filter(|(_, process)| is_alive(process.status()))
            .map(|(pid, process)| {
                let name = process
                    .exe()
                    .and_then(Path::file_name)
                    .filter(|exe_name| target.matches(&exe_name.to_string_lossy()))
                    .unwrap_or_else(|| process.name());
                (pid.as_u32(), name.to_string_lossy().into_owned())
            })
            .collect();
        debug!("Enumerated {} processes", candidates.len());

        select_first_match(
            target,
            candidates.iter().map(|(pid, name)| (*pid, name.as_str())),
        )
        .ok_or_else(|| GameWatchError::TargetNotFound {
            display_name: target.display_name.clone(),
            process_name: target.process_name.clone(),
        })
    }
}

impl ProcessBackend for SysinfoBackend {
    fn open_sampler(&self, handle: ProcessHandle) -> Box<dyn UsageSampler> {
        Box::new(SysinfoSampler::new(handle))
    }
}

/// Samples a single process with a reusable `System`
///
/// Only the target pid is refreshed per call, so repeated sampling stays cheap.
pub struct SysinfoSampler {
    system: System,
}

impl SysinfoSampler {
    /// Create a sampler and take the baseline measurement CPU deltas are computed from
    pub fn new(handle: ProcessHandle) -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(handle.pid());
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        Self { system }
    }
}

impl UsageSampler for SysinfoSampler {
    fn sample(&mut self, handle: ProcessHandle) -> Result<UsageSample> {
        let pid = Pid::from_u32(handle.pid());
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match self.system.process(pid) {
            Some(process) if is_alive(process.status()) => Ok(UsageSample {
                cpu_percent: process.cpu_usage(),
                memory_bytes: process.memory(),
            }),
            _ => Err(GameWatchError::ProcessGone { pid: handle.pid() }),
        }
    }
}

/// Zombie and dead entries linger in the process table after exit
fn is_alive(status: ProcessStatus) -> bool {
    !matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}
