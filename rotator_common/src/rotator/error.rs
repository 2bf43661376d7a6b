//! Command and initialization error types.
//!
//! Command entry points return [`CommandError`] synchronously; nothing
//! panics. Initialization problems are collected in the [`InitError`]
//! bitflag set for operator visibility while the rotator keeps running.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::axis::AxisError;

/// Result of a rotator command.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CommandError {
    /// Input outside its documented bound.
    #[error("parameter {value} out of range [{min}, {max}]")]
    ParamRange {
        /// Rejected value.
        value: i64,
        /// Lower bound (inclusive).
        min: i64,
        /// Upper bound (inclusive).
        max: i64,
    },

    /// Rotator is not in the single state that permits the command
    /// (parked, mid-transition or park failed).
    #[error("rotator parked")]
    Parked,

    /// Conflicting park/unpark sequence in progress, or unresolved park
    /// failure.
    #[error("park operation failed")]
    ParkFailed,

    /// Strict parking: unpark requires the rotator to be parked.
    #[error("rotator not parked")]
    NotParked,

    /// Motion request rejected by the axis controller.
    #[error("axis: {0}")]
    Axis(#[from] AxisError),
}

bitflags! {
    /// Initialization error flags.
    ///
    /// Set during init, never cleared by the controller. None of them halt
    /// the rotator except `DRIVER`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct InitError: u8 {
        /// A persisted setting was out of range and repaired.
        const VALUE        = 0x01;
        /// Declared record size too small, or record undecodable.
        const NV           = 0x02;
        /// No motion controller. Init stops.
        const DRIVER       = 0x04;
        /// Scheduler refused the monitor task.
        const MONITOR_TASK = 0x08;
        /// Settings store I/O failed.
        const STORE        = 0x10;
    }
}

impl InitError {
    /// True if init could not complete.
    #[inline]
    pub const fn is_fatal(&self) -> bool {
        self.contains(Self::DRIVER)
    }
}

impl Default for InitError {
    fn default() -> Self {
        Self::empty()
    }
}
