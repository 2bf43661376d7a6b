//! # Rotator Control
//!
//! Runs the rotator controller against the simulated axis and mount from
//! `rotator_hal`, persisting settings to a file store.
//!
//! Two periodic tasks run on the thread scheduler:
//! - `RotPhys` advances the simulated axis and mount at `--physics-period-ms`
//! - `RotMon` is the controller's 1 Hz monitor
//!
//! Ctrl-C stops both. With `--park-on-exit` the rotator parks first.

use clap::Parser;
use rotator_common::config::LogLevel;
use rotator_common::consts::DEFAULT_CONFIG_PATH;
use rotator_common::pointing::PointingSource;
use rotator_common::rotator::config::RotatorConfig;
use rotator_common::rotator::state::ParkState;
use rotator_common::scheduler::{PeriodicScheduler, TaskPriority};
use rotator_control::config::{ConfigSource, load_config_or_default, render_config};
use rotator_control::error::StartupError;
use rotator_control::rotator::Rotator;
use rotator_control::scheduler::ThreadScheduler;
use rotator_control::service::RotatorService;
use rotator_hal::{FileStore, SimAxisHandle, SimulatedAxis, SimulatedMount};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const PHYSICS_LABEL: &str = "RotPhys";
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const STATUS_INTERVAL: Duration = Duration::from_secs(10);

/// Rotator Control: telescope instrument rotator
#[derive(Parser, Debug)]
#[command(name = "rotator_control")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Instrument rotator controller with park lifecycle and field de-rotation")]
struct Args {
    /// Path to the rotator configuration TOML.
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Park the rotator before exiting.
    #[arg(long)]
    park_on_exit: bool,

    /// Simulation step period in milliseconds.
    #[arg(long, default_value_t = 10)]
    physics_period_ms: u64,

    /// Print the effective configuration and exit.
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let (config, source) = match load_config_or_default(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("FATAL: {}: {e}", args.config.display());
            process::exit(1);
        }
    };

    if args.print_config {
        match render_config(&config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                eprintln!("FATAL: {e}");
                process::exit(1);
            }
        }
        return;
    }

    setup_tracing(&args, config.shared.log_level);
    if source == ConfigSource::Defaults {
        warn!("No config at {}, using defaults", args.config.display());
    }

    info!(
        "Rotator Control v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Rotator Control shutdown complete");
}

fn run(args: &Args, config: &RotatorConfig) -> Result<(), StartupError> {
    let axis = SimAxisHandle::new(SimulatedAxis::new(&config.axis));
    let capacity = config.store.base_address + config.store.record_size;
    let store = FileStore::open(&config.store.path, capacity)?;
    let mount = config.mount.as_ref().map(|m| Arc::new(SimulatedMount::new(m)));

    let mut rotator = Rotator::new(axis.clone(), store, config);
    if let Some(mount) = &mount {
        info!(
            "Mount: {:?}, latitude {:.3}°",
            mount.geometry(),
            mount.latitude().to_degrees()
        );
        rotator = rotator.with_pointing(Arc::clone(mount) as Arc<dyn PointingSource>);
    }

    let monitor_period = Duration::from_millis(config.rotator.monitor_period_ms);
    let service = RotatorService::new(rotator, monitor_period);
    let mut scheduler = ThreadScheduler::new();

    let physics_period = Duration::from_millis(args.physics_period_ms.max(1));
    let physics_axis = axis.clone();
    let physics_mount = mount.clone();
    let mut last = Instant::now();
    let registered = scheduler.add(
        physics_period,
        Duration::ZERO,
        true,
        TaskPriority::Critical,
        Box::new(move || {
            let now = Instant::now();
            physics_axis.update(now - last);
            last = now;
            if let Some(mount) = &physics_mount {
                mount.sync();
            }
        }),
        PHYSICS_LABEL,
    );
    if !registered {
        return Err(StartupError::Task(PHYSICS_LABEL));
    }

    let init_errors = service.init(&mut scheduler);
    if init_errors.is_fatal() {
        return Err(StartupError::Init(init_errors));
    }
    if !init_errors.is_empty() {
        warn!("Rotator running with init errors: {init_errors:?}");
    }
    info!("Rotator ready, state {}", service.park_state());

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    let mut last_status = Instant::now();
    while running.load(Ordering::SeqCst) {
        thread::sleep(POLL_INTERVAL);
        if last_status.elapsed() >= STATUS_INTERVAL {
            last_status = Instant::now();
            let status = service.status();
            debug!(
                state = %status.park_state,
                coordinate = status.coordinate,
                position = status.position,
                slewing = status.slewing,
                persist_failures = status.persist_failures,
                "Rotator status"
            );
        }
    }

    if args.park_on_exit {
        park_before_exit(&service, config);
    }

    scheduler.shutdown();
    Ok(())
}

/// Park and wait for the monitor to confirm. A park that does not finish in
/// time is reported as a park fault.
fn park_before_exit<A, S>(service: &RotatorService<A, S>, config: &RotatorConfig)
where
    A: rotator_common::axis::AxisMotion + 'static,
    S: rotator_common::store::SettingsStore + 'static,
{
    if let Err(e) = service.park() {
        warn!("Park on exit refused: {e}");
        return;
    }

    let timeout = park_timeout(config);

    let started = Instant::now();
    while started.elapsed() < timeout {
        if service.park_state() == ParkState::Parked {
            info!("Parked in {:.1}s", started.elapsed().as_secs_f64());
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }

    error!("Park did not complete within {:.0}s", timeout.as_secs_f64());
    service.report_park_fault();
}

/// Worst-case park time: full travel at slew rate plus both ramps and a few
/// monitor periods for confirmation.
fn park_timeout(config: &RotatorConfig) -> Duration {
    let axis = &config.axis;
    let travel = (axis.limit_max - axis.limit_min) / axis.slew_rate;
    let motion = Duration::try_from_secs_f64(travel + 2.0 * axis.acceleration_time)
        .unwrap_or(Duration::MAX);
    motion.saturating_add(3 * Duration::from_millis(config.rotator.monitor_period_ms))
}

/// Setup tracing subscriber from CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match configured {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
