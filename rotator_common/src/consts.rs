//! System-wide constants for the rotator workspace.
//!
//! Single source of truth for numeric limits and defaults.

/// Largest accepted backlash compensation [steps].
pub const BACKLASH_MAX: i32 = 10_000;

/// Monitor period [ms] (1 Hz).
pub const MONITOR_PERIOD_MS: u64 = 1000;

/// Scheduler label of the monitor task.
pub const MONITOR_LABEL: &str = "RotMon";

/// Default delayed position write [s]. Zero selects strict parking.
pub const WRITE_DELAY_DEFAULT: u64 = 5;

/// Bytes reserved in the settings store for the rotator record.
pub const SETTINGS_RECORD_SIZE: usize = 32;

/// Half width of the parallactic-rate sampling window [degrees of hour angle].
///
/// 0.125° of hour angle is 30 s of time.
pub const PARALLACTIC_HALF_WINDOW_DEG: f64 = 0.125;

/// Total time baseline spanned by the two parallactic samples [s].
pub const PARALLACTIC_BASELINE_S: f64 = 60.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/rotator.toml";

/// Default settings store file name.
pub const DEFAULT_STORE_FILE: &str = "rotator.nv";
