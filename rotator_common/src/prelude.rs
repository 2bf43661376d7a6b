//! Prelude module for common re-exports.
//!
//! `use rotator_common::prelude::*;` brings in the types every rotator
//! component touches.

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::rotator::config::{
    AxisConfig, ControllerConfig, MountConfig, RotatorConfig, StoreConfig,
};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{BACKLASH_MAX, MONITOR_LABEL, MONITOR_PERIOD_MS};

// ─── Rotator ────────────────────────────────────────────────────────
pub use crate::rotator::error::{CommandError, InitError};
pub use crate::rotator::settings::{RotatorSettings, SettingsError, SettingsRepair};
pub use crate::rotator::state::ParkState;

// ─── Collaborators ──────────────────────────────────────────────────
pub use crate::axis::{AxisError, AxisMotion, Direction};
pub use crate::pointing::{EquatorialCoordinate, MountGeometry, PointingSource};
pub use crate::scheduler::{PeriodicScheduler, TaskCallback, TaskPriority};
pub use crate::store::{SettingsStore, StoreError, StoreResult};
