//! Configuration structures for the rotator.
//!
//! All config types use `serde::Deserialize` for TOML loading. Every field
//! has a default so a minimal file only names what differs.
//!
//! ```toml
//! [shared]
//! service_name = "rotator"
//!
//! [axis]
//! limit_min = -180.0
//! limit_max = 180.0
//!
//! [rotator]
//! write_delay = 5
//!
//! [mount]
//! geometry = "alt_azimuth"
//! latitude = 40.0
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DEFAULT_STORE_FILE, MONITOR_PERIOD_MS, SETTINGS_RECORD_SIZE, WRITE_DELAY_DEFAULT,
};
use crate::pointing::MountGeometry;

/// Upper bound for any rate [deg/s].
pub const RATE_MAX: f64 = 90.0;

/// Upper bound for acceleration and stop times [s].
pub const RAMP_TIME_MAX: f64 = 60.0;

/// Upper bound for the motor power-down delay [s].
pub const POWER_DOWN_TIME_MAX: f64 = 3600.0;

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete rotator configuration, loaded from a single TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RotatorConfig {
    /// Logging and instance name.
    #[serde(default)]
    pub shared: SharedConfig,
    /// Axis travel limits, rates and ramp times.
    #[serde(default)]
    pub axis: AxisConfig,
    /// Monitor, persistence and derotation policy.
    #[serde(default)]
    pub rotator: ControllerConfig,
    /// Settings store location.
    #[serde(default)]
    pub store: StoreConfig,
    /// Optional mount/site pointing source. Absent = no derotation.
    #[serde(default)]
    pub mount: Option<MountConfig>,
}

impl RotatorConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.axis.validate().map_err(ConfigError::ValidationError)?;
        self.rotator.validate().map_err(ConfigError::ValidationError)?;
        self.store.validate().map_err(ConfigError::ValidationError)?;
        if let Some(mount) = &self.mount {
            mount.validate().map_err(ConfigError::ValidationError)?;
        }
        Ok(())
    }
}

// ─── Axis ───────────────────────────────────────────────────────────

/// Axis configuration (`[axis]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisConfig {
    /// Minimum travel limit [deg].
    #[serde(default = "default_limit_min")]
    pub limit_min: f64,
    /// Maximum travel limit [deg].
    #[serde(default = "default_limit_max")]
    pub limit_max: f64,
    /// Slew rate, also the maximum rate [deg/s].
    #[serde(default = "default_slew_rate")]
    pub slew_rate: f64,
    /// Minimum rate [deg/s].
    #[serde(default = "default_frequency_min")]
    pub frequency_min: f64,
    /// Acceleration time for slews and gotos [s].
    #[serde(default = "default_acceleration_time")]
    pub acceleration_time: f64,
    /// Deceleration time for an abort [s].
    #[serde(default = "default_rapid_stop_time")]
    pub rapid_stop_time: f64,
    /// Power the motor down after `power_down_time` idle.
    #[serde(default)]
    pub power_down: bool,
    /// Idle time before power-down [s].
    #[serde(default = "default_power_down_time")]
    pub power_down_time: f64,
    /// Motor resolution [steps/deg].
    #[serde(default = "default_steps_per_degree")]
    pub steps_per_degree: f64,
}

fn default_limit_min() -> f64 {
    -180.0
}
fn default_limit_max() -> f64 {
    180.0
}
fn default_slew_rate() -> f64 {
    3.0
}
fn default_frequency_min() -> f64 {
    0.01
}
fn default_acceleration_time() -> f64 {
    2.0
}
fn default_rapid_stop_time() -> f64 {
    1.0
}
fn default_power_down_time() -> f64 {
    30.0
}
fn default_steps_per_degree() -> f64 {
    64.0
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            limit_min: default_limit_min(),
            limit_max: default_limit_max(),
            slew_rate: default_slew_rate(),
            frequency_min: default_frequency_min(),
            acceleration_time: default_acceleration_time(),
            rapid_stop_time: default_rapid_stop_time(),
            power_down: false,
            power_down_time: default_power_down_time(),
            steps_per_degree: default_steps_per_degree(),
        }
    }
}

impl AxisConfig {
    /// Acceleration distance for a goto at slew rate [deg].
    #[inline]
    pub fn goto_ramp(&self) -> f64 {
        self.slew_rate * self.acceleration_time
    }

    /// Whether `degrees` lies within the travel limits.
    #[inline]
    pub fn contains(&self, degrees: f64) -> bool {
        degrees >= self.limit_min && degrees <= self.limit_max
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("limit_min", self.limit_min),
            ("limit_max", self.limit_max),
            ("slew_rate", self.slew_rate),
            ("frequency_min", self.frequency_min),
            ("acceleration_time", self.acceleration_time),
            ("rapid_stop_time", self.rapid_stop_time),
            ("power_down_time", self.power_down_time),
            ("steps_per_degree", self.steps_per_degree),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("axis {name} {value} must be finite"));
        }
        if self.limit_min >= self.limit_max {
            return Err(format!(
                "axis limit_min {} must be below limit_max {}",
                self.limit_min, self.limit_max
            ));
        }
        if !(self.limit_min..=self.limit_max).contains(&0.0) {
            // Repaired settings fall back to 0.0, which must be reachable.
            return Err(format!(
                "axis limits [{}, {}] must include 0.0",
                self.limit_min, self.limit_max
            ));
        }
        if self.slew_rate <= 0.0 || self.slew_rate > RATE_MAX {
            return Err(format!(
                "slew_rate {} out of range (0, {RATE_MAX}]",
                self.slew_rate
            ));
        }
        if self.frequency_min <= 0.0 || self.frequency_min > self.slew_rate {
            return Err(format!(
                "frequency_min {} out of range (0, slew_rate {}]",
                self.frequency_min, self.slew_rate
            ));
        }
        if self.acceleration_time <= 0.0 || self.acceleration_time > RAMP_TIME_MAX {
            return Err(format!(
                "acceleration_time {} out of range (0, {RAMP_TIME_MAX}]",
                self.acceleration_time
            ));
        }
        if self.rapid_stop_time <= 0.0 || self.rapid_stop_time > self.acceleration_time {
            return Err(format!(
                "rapid_stop_time {} out of range (0, acceleration_time {}]",
                self.rapid_stop_time, self.acceleration_time
            ));
        }
        if self.power_down
            && (self.power_down_time <= 0.0 || self.power_down_time > POWER_DOWN_TIME_MAX)
        {
            return Err(format!(
                "power_down_time {} out of range (0, {POWER_DOWN_TIME_MAX}]",
                self.power_down_time
            ));
        }
        if self.steps_per_degree <= 0.0 {
            return Err("steps_per_degree must be positive".to_string());
        }
        Ok(())
    }
}

// ─── Controller ─────────────────────────────────────────────────────

/// Controller policy (`[rotator]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Delayed position write [s]. 0 disables on-the-fly writes and forces
    /// strict parking.
    #[serde(default = "default_write_delay")]
    pub write_delay: u64,
    /// Monitor period [ms].
    #[serde(default = "default_monitor_period_ms")]
    pub monitor_period_ms: u64,
    /// Derotation enabled at startup.
    #[serde(default)]
    pub derotate: bool,
    /// Derotation sign reversed at startup.
    #[serde(default)]
    pub derotate_reverse: bool,
}

fn default_write_delay() -> u64 {
    WRITE_DELAY_DEFAULT
}
fn default_monitor_period_ms() -> u64 {
    MONITOR_PERIOD_MS
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            write_delay: default_write_delay(),
            monitor_period_ms: default_monitor_period_ms(),
            derotate: false,
            derotate_reverse: false,
        }
    }
}

impl ControllerConfig {
    /// Strict parking: unpark only from `Parked`, no delayed writes.
    #[inline]
    pub const fn strict_parking(&self) -> bool {
        self.write_delay == 0
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.monitor_period_ms == 0 {
            return Err("monitor_period_ms must be positive".to_string());
        }
        Ok(())
    }
}

// ─── Store ──────────────────────────────────────────────────────────

/// Settings store location (`[store]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backing file for the file store.
    #[serde(default = "default_store_path")]
    pub path: String,
    /// Offset of the rotator record [bytes].
    #[serde(default)]
    pub base_address: usize,
    /// Bytes reserved for the rotator record.
    #[serde(default = "default_record_size")]
    pub record_size: usize,
}

fn default_store_path() -> String {
    DEFAULT_STORE_FILE.to_string()
}
fn default_record_size() -> usize {
    SETTINGS_RECORD_SIZE
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            base_address: 0,
            record_size: default_record_size(),
        }
    }
}

impl StoreConfig {
    /// Validate parameter bounds.
    ///
    /// A `record_size` smaller than the encoded record is *not* rejected
    /// here: init reports it as `InitError::NV` so the rotator still runs.
    pub fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("store path cannot be empty".to_string());
        }
        if self.record_size == 0 {
            return Err("record_size must be positive".to_string());
        }
        Ok(())
    }
}

// ─── Mount ──────────────────────────────────────────────────────────

/// Simulated mount/site pointing (`[mount]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountConfig {
    /// Mount geometry.
    pub geometry: MountGeometry,
    /// Site latitude [deg].
    pub latitude: f64,
    /// Tracked right ascension [h].
    #[serde(default)]
    pub right_ascension: f64,
    /// Tracked declination [deg].
    #[serde(default)]
    pub declination: f64,
}

impl MountConfig {
    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.latitude.is_finite()
            && self.declination.is_finite()
            && self.right_ascension.is_finite())
        {
            return Err("mount coordinates must be finite".to_string());
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} out of range [-90, 90]", self.latitude));
        }
        if !(-90.0..=90.0).contains(&self.declination) {
            return Err(format!(
                "declination {} out of range [-90, 90]",
                self.declination
            ));
        }
        if !(0.0..24.0).contains(&self.right_ascension) {
            return Err(format!(
                "right_ascension {} out of range [0, 24)",
                self.right_ascension
            ));
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
