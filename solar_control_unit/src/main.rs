//! # Solar Control Unit Binary
//!
//! Runs the collector loop controller against the configured HAL driver.
//! Status documents go to stdout as JSON lines, logs go to stderr, and
//! commands are read from stdin as `"<topic> <payload>"` lines.
//!
//! # Usage
//!
//! ```bash
//! # Simulation driver, default config
//! solar_control_unit config/solar.toml
//!
//! # Ten fast cycles with debug logs
//! solar_control_unit config/solar.toml --interval-ms 200 --cycles 10 -v
//!
//! # Enable manual mode while running
//! echo 'solar/manual {"state": 1}' | solar_control_unit config/solar.toml
//! ```

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use clap::Parser;
use solar_common::consts::DEFAULT_CONFIG_PATH;
use solar_common::config::LogLevel;
use solar_control_unit::config::load_config;
use solar_control_unit::cycle::CycleRunner;
use solar_control_unit::status::{JsonLinePublisher, StatusPublisher};
use solar_hal::{DriverRegistry, register_builtin_drivers};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Cancellation is checked at least this often while waiting for the next cycle.
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Solar collector loop controller
#[derive(Parser, Debug)]
#[command(name = "solar_control_unit")]
#[command(version)]
#[command(about = "Solar-thermal collector loop controller")]
#[command(long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Stop after this many cycles
    #[arg(long, value_name = "N")]
    cycles: Option<u64>,

    /// Override `[cycle] interval_ms`
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,
}

fn main() {
    if let Err(e) = run() {
        error!("FATAL: {e}");
        eprintln!("solar_control_unit: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(&args.config);
    let config_level = loaded.as_ref().ok().map(|l| l.config.shared.log_level);
    setup_tracing(&args, config_level)?;
    let mut loaded = loaded?;

    info!(
        "Solar control unit v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        args.config.display()
    );

    if let Some(ms) = args.interval_ms {
        loaded.config.cycle.interval_ms = ms;
        loaded.config.cycle.validate()?;
    }
    let interval = loaded.config.cycle.interval();
    let status_every = u64::from(loaded.config.cycle.status_every);

    let mut registry = DriverRegistry::new();
    register_builtin_drivers(&mut registry);
    let driver = registry.create_driver(&loaded.config.driver.name)?;

    let mut runner = CycleRunner::new(loaded, driver)?;

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            cancel.store(true, Ordering::SeqCst);
        })?;
    }

    let commands = spawn_command_reader();
    let mut publisher = JsonLinePublisher::new(std::io::stdout().lock());

    info!(?interval, "entering control loop");
    let mut last_cycle = Instant::now();
    loop {
        let started = Instant::now();
        runner.tick(started.saturating_duration_since(last_cycle));
        last_cycle = started;

        let Some(report) = runner.run_cycle(&cancel) else {
            break;
        };
        if report.cycle % status_every == 0 {
            if let Err(e) = publisher.publish(&report.status()) {
                warn!(error = %e, "status publish failed");
            }
        }
        if args.cycles.is_some_and(|n| report.cycle >= n) {
            info!(cycles = report.cycle, "cycle limit reached");
            break;
        }

        let deadline = started + interval;
        if !wait_for_next_cycle(&mut runner, &commands, deadline, &cancel) {
            break;
        }
    }

    let stats = runner.stats();
    info!(
        cycles = stats.cycles,
        skipped = stats.skipped,
        rejected_commands = stats.rejected_commands,
        actuation_errors = stats.actuation_errors,
        "control loop stopped"
    );
    runner.shutdown()?;
    info!("Solar control unit shutdown complete");
    Ok(())
}

/// Apply commands as they arrive until `deadline`. Returns `false` once
/// cancellation has been requested.
fn wait_for_next_cycle(
    runner: &mut CycleRunner,
    commands: &Receiver<String>,
    deadline: Instant,
    cancel: &AtomicBool,
) -> bool {
    loop {
        if cancel.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        let slice = (deadline - now).min(WAIT_SLICE);
        match commands.recv_timeout(slice) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    // rejections are logged and counted by the runner
                    let _ = runner.handle_line(&line, Instant::now());
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => std::thread::sleep(slice),
        }
    }
}

/// Forward stdin lines over a channel until EOF.
fn spawn_command_reader() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "command input closed");
                    break;
                }
            }
        }
        debug!("command reader finished");
    });
    rx
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(
    args: &Args,
    config_level: Option<LogLevel>,
) -> Result<(), Box<dyn std::error::Error>> {
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config_level.unwrap_or_default()
    };

    let filter = EnvFilter::from_default_env().add_directive(level.as_directive().parse()?);

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
    Ok(())
}
