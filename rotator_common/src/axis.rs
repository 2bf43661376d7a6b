//! Axis motion interface.
//!
//! The rotator never generates steps itself: it issues intents to an axis
//! motion controller through [`AxisMotion`]. The controller owns
//! acceleration profiles, backlash compensation and step generation; the
//! rotator only relies on the contract documented here.
//!
//! # Units
//!
//! | Quantity              | Unit        |
//! |-----------------------|-------------|
//! | Instrument coordinate | degrees     |
//! | Frequencies / rates   | degrees/s   |
//! | Ramp distance         | degrees     |
//! | Backlash              | motor steps |
//! | Times                 | seconds     |

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the axis motion controller.
///
/// The rotator passes these through unchanged and leaves its own state
/// untouched when one occurs.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AxisError {
    /// Requested target lies below the minimum travel limit.
    #[error("target {target:.3}° below axis minimum limit {limit:.3}°")]
    LimitMin {
        /// Requested target [deg].
        target: f64,
        /// Travel limit [deg].
        limit: f64,
    },

    /// Requested target lies above the maximum travel limit.
    #[error("target {target:.3}° above axis maximum limit {limit:.3}°")]
    LimitMax {
        /// Requested target [deg].
        target: f64,
        /// Travel limit [deg].
        limit: f64,
    },

    /// Motor is disabled (powered down or never enabled).
    #[error("axis motor disabled")]
    Disabled,

    /// A slew or goto is already in progress.
    #[error("axis already in motion")]
    InMotion,

    /// Driver-reported mechanism fault.
    #[error("axis mechanism fault")]
    Fault,

    /// No motion controller present.
    #[error("no motion controller")]
    NoController,
}

/// Direction of a continuous slew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Increasing instrument coordinate.
    Forward,
    /// Decreasing instrument coordinate.
    Reverse,
}

impl Direction {
    /// Sign of motion (+1.0 or -1.0).
    #[inline]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::Forward => 1.0,
            Self::Reverse => -1.0,
        }
    }
}

/// Contract of the single-axis motion controller driven by the rotator.
///
/// Implementations must be fast and non-blocking: every method is called
/// from the monitor tick or from a command handler while the controller's
/// critical section is held.
pub trait AxisMotion: Send {
    /// Bring up the motion controller. Called once from rotator init.
    fn init(&mut self) -> Result<(), AxisError>;

    /// Enable or disable the motor.
    fn enable(&mut self, on: bool);

    /// Current instrument coordinate [deg].
    fn instrument_coordinate(&self) -> f64;

    /// Redefine the current instrument coordinate without motion.
    fn set_instrument_coordinate(&mut self, degrees: f64);

    /// Redefine the current instrument coordinate as the park datum
    /// (snapped to the motor step grid).
    fn set_instrument_coordinate_park(&mut self, degrees: f64);

    /// Set the target for the next `auto_goto`.
    fn set_target_coordinate(&mut self, degrees: f64);

    /// Set the park target for the next `auto_goto` (snapped to the motor
    /// step grid so the parked position is reproducible).
    fn set_target_coordinate_park(&mut self, degrees: f64);

    /// True while a slew or goto is in progress.
    fn is_slewing(&self) -> bool;

    /// True when the last commanded move finished within tolerance.
    fn at_target(&self) -> bool;

    /// Backlash compensation [steps].
    fn set_backlash_steps(&mut self, steps: i32);

    /// Continuous offset rate added to whatever motion is active [deg/s].
    fn set_frequency_base(&mut self, rate: f64);

    /// Maximum rate [deg/s].
    fn set_frequency_max(&mut self, rate: f64);

    /// Minimum rate [deg/s].
    fn set_frequency_min(&mut self, rate: f64);

    /// Rate used by `auto_slew` [deg/s].
    fn set_frequency_slew(&mut self, rate: f64);

    /// Time to reach slew rate for a normal start/stop [s].
    fn set_slew_acceleration_time(&mut self, seconds: f64);

    /// Time to stop from slew rate for an abort [s].
    fn set_slew_acceleration_time_abort(&mut self, seconds: f64);

    /// Start continuous motion in `direction` at `rate` [deg/s].
    fn auto_slew(&mut self, direction: Direction, rate: f64) -> Result<(), AxisError>;

    /// Start a bounded, accelerated move to the current target.
    ///
    /// `ramp` is the acceleration distance [deg] and `max_rate` the peak
    /// rate [deg/s].
    fn auto_goto(&mut self, ramp: f64, max_rate: f64) -> Result<(), AxisError>;

    /// Stop any slew or goto using the abort deceleration.
    fn auto_slew_stop(&mut self);

    /// Mark the axis as following an external rate source.
    fn set_synchronized(&mut self, synchronized: bool);

    /// Whether the axis follows an external rate source.
    fn synchronized(&self) -> bool;

    /// Idle time after which the motor is powered down.
    fn set_power_down_time(&mut self, time: Duration);

    /// Reset the motor step counter.
    fn reset_position_steps(&mut self, steps: i64);

    /// Instrument coordinate in steps (diagnostics).
    fn instrument_coordinate_steps(&self) -> i64;

    /// Raw motor position in steps (diagnostics).
    fn motor_position_steps(&self) -> i64;

    /// Target coordinate in steps (diagnostics).
    fn target_coordinate_steps(&self) -> i64;
}
