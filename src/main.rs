//! `GameWatch` command-line front end
//!
//! Lists discovered games and watches one of them for crashes and hangs, printing the
//! watchdog's event stream to the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamewatch::{
    Watchdog,
    config::{AppConfig, ConfigManager},
    discovery::{self, InstalledGame},
    error::{GameWatchError, get_user_friendly_error},
    monitor::{
        ChannelSink, EventSink, FanoutSink, HostMetrics, HostMetricsSampler, LogFileSink,
        LogLevel, LogLine, MonitorEvent, Phase, SessionId, SysinfoBackend, Target,
    },
    utils,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Name of the event log written next to the tool log
const EVENT_LOG_FILE: &str = "events.log";

#[derive(Parser)]
#[command(name = "gamewatch")]
#[command(
    version,
    about = "Crash and hang watchdog for installed games",
    after_help = "EXAMPLES:
    gamewatch games                         # List installed Steam games
    gamewatch watch \"Portal 2\"              # Watch a discovered game
    gamewatch watch portal2.exe --metrics   # Watch by executable, with host metrics
    gamewatch config --init                 # Write the default configuration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List games found in local Steam libraries
    Games,

    /// Watch a running game until it exits or Ctrl-C is pressed
    Watch {
        /// Discovered game name (case-insensitive) or executable name/path
        game: String,

        /// Sampling interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// CPU percentage below which a sample counts as idle
        #[arg(long)]
        cpu_threshold: Option<f32>,

        /// Consecutive idle samples before a hang is reported
        #[arg(long)]
        hang_ticks: Option<u32>,

        /// Also print host-wide CPU and memory usage
        #[arg(long)]
        metrics: bool,
    },

    /// Show the configuration file path and effective settings
    Config {
        /// Write the default configuration if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = ConfigManager::data_dir();
    utils::init_logging(&data_dir).context("Failed to initialize logging system")?;

    let config = ConfigManager::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Games => list_games(),
        Commands::Watch {
            game,
            interval_ms,
            cpu_threshold,
            hang_ticks,
            metrics,
        } => {
            let mut config = config;
            if let Some(interval_ms) = interval_ms {
                config.monitor.sample_interval_ms = interval_ms;
            }
            if let Some(threshold) = cpu_threshold {
                config.monitor.activity_cpu_threshold = threshold;
            }
            if let Some(ticks) = hang_ticks {
                config.monitor.hang_tick_threshold = ticks;
            }
            config.monitor.validate().context("Invalid monitor settings")?;

            watch(&game, &config, metrics)
        }
        Commands::Config { init } => show_config(&config, init),
    }
}

fn list_games() -> Result<()> {
    let games = discovery::list_installed_games();
    if games.is_empty() {
        println!("No Steam games found.");
        return Ok(());
    }

    for game in &games {
        let exe = game
            .executable
            .as_ref()
            .map_or_else(|| "(no executable detected)".to_string(), |p| p.display().to_string());
        println!(
            "{:>8}  {:<40} {}",
            game.app_id.as_deref().unwrap_or("-"),
            game.name,
            exe
        );
    }
    Ok(())
}

/// Pick the monitoring target for a command-line argument
///
/// A game without a detected executable is reported on `sink` as an `[ERROR]` line.
fn resolve_target(
    arg: &str,
    games: &[InstalledGame],
    sink: &dyn EventSink,
) -> gamewatch::Result<Target> {
    let resolved = match discovery::find_by_name(games, arg) {
        Some(game) => Target::from_game(game),
        None => Target::new(arg, arg),
    };
    if let Err(GameWatchError::NoExecutable(name)) = &resolved {
        warn!("No executable detected for {}", name);
        sink.log(&LogLine::now(
            LogLevel::Error,
            format!("No executable detected for {name}. Cannot monitor."),
        ));
    }
    resolved
}

fn watch(game: &str, config: &AppConfig, show_metrics: bool) -> Result<()> {
    let (event_sender, event_receiver) = mpsc::channel();
    let mut fanout = FanoutSink::new().with(Arc::new(ChannelSink::new(event_sender)));
    if config.event_log_enabled {
        let path = ConfigManager::data_dir().join(EVENT_LOG_FILE);
        match LogFileSink::open(&path) {
            Ok(file_sink) => fanout = fanout.with(Arc::new(file_sink)),
            Err(e) => warn!("Event log disabled, cannot open {}: {}", path.display(), e),
        }
    }
    let sink: Arc<dyn EventSink> = Arc::new(fanout);

    let games = discovery::list_installed_games();
    let target = match resolve_target(game, &games, sink.as_ref()) {
        Ok(target) => target,
        Err(e) => {
            print_pending(&event_receiver);
            return Err(report(&e));
        }
    };
    info!(
        "Watch requested for {} ({})",
        target.display_name, target.process_name
    );

    let watchdog = Watchdog::new(config.monitor.clone(), Arc::new(SysinfoBackend), sink);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    let (metrics_sender, metrics_receiver) = mpsc::channel();
    let _metrics_handle = if show_metrics {
        Some(
            HostMetricsSampler::new()
                .start(config.host_metrics_interval(), metrics_sender)
                .context("Failed to start host metrics sampler")?,
        )
    } else {
        drop(metrics_sender);
        None
    };

    let session = match watchdog.start_monitoring(target) {
        Ok(session) => session,
        Err(e) => {
            print_pending(&event_receiver);
            return Err(report(&e));
        }
    };

    run_event_loop(
        &watchdog,
        session,
        &event_receiver,
        &metrics_receiver,
        &interrupted,
    );
    Ok(())
}

/// Print events until the session stops or the user interrupts
fn run_event_loop(
    watchdog: &Watchdog,
    session: SessionId,
    events: &mpsc::Receiver<MonitorEvent>,
    metrics: &mpsc::Receiver<HostMetrics>,
    interrupted: &AtomicBool,
) {
    loop {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if print_event(&event, session) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Event channel disconnected. Exiting event loop.");
                break;
            }
        }

        loop {
            match metrics.try_recv() {
                Ok(snapshot) => print_metrics(&snapshot),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }

        if interrupted.swap(false, Ordering::SeqCst) {
            info!("Interrupted, stopping session {}", session);
            watchdog.stop_monitoring();
            print_pending(events);
            break;
        }
    }
}

/// Print one event; returns true when it ends the session
fn print_event(event: &MonitorEvent, session: SessionId) -> bool {
    match event {
        MonitorEvent::Log(line) => {
            println!("{line}");
            false
        }
        MonitorEvent::StateChanged { session: id, phase } => {
            *id == session && *phase == Phase::Stopped
        }
    }
}

fn print_pending(events: &mpsc::Receiver<MonitorEvent>) {
    while let Ok(event) = events.try_recv() {
        if let MonitorEvent::Log(line) = event {
            println!("{line}");
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "Conversion to f64 for display purposes; precision loss is acceptable for human-readable memory values"
)]
fn print_metrics(metrics: &HostMetrics) {
    const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
    println!(
        "{} [SYSTEM] CPU: {:.1}% | RAM: {:.1}% ({:.1}/{:.1} GB)",
        chrono::Local::now().format("%H:%M:%S"),
        metrics.cpu_percent,
        metrics.memory_used_percent,
        metrics.used_memory_bytes as f64 / GIB,
        metrics.total_memory_bytes as f64 / GIB
    );
}

fn show_config(config: &AppConfig, init: bool) -> Result<()> {
    let path = ConfigManager::get_config_path();
    if init {
        if path.exists() {
            println!("Configuration already exists.");
        } else {
            ConfigManager::save(config).map_err(|e| report(&e))?;
            println!("Default configuration written.");
        }
    }
    println!("{}", path.display());
    println!(
        "{}",
        serde_json::to_string_pretty(config).context("Failed to serialize configuration")?
    );
    Ok(())
}

fn report(error: &GameWatchError) -> anyhow::Error {
    anyhow::anyhow!(get_user_friendly_error(error))
}
