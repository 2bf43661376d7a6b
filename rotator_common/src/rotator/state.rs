//! Park state enum.
//!
//! The persisted record encodes the variant through serde.

use serde::{Deserialize, Serialize};

/// Rotator lifecycle position with respect to the saved park orientation.
///
/// Exactly one value is current. It is the sole gate for motion commands:
/// only [`ParkState::Unparked`] accepts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParkState {
    /// Fully operational; motion commands accepted.
    Unparked,
    /// Moving to the park position.
    Parking,
    /// At the park position, motor disabled.
    Parked,
    /// Moving back from the park datum to the saved position.
    Unparking,
    /// Faulted park sequence. Terminal until external intervention.
    ParkFailed,
}

impl ParkState {
    /// Membership in the motion-blocked set
    /// `{Parked, Parking, Unparking, ParkFailed}`.
    #[inline]
    pub const fn is_motion_blocked(&self) -> bool {
        matches!(
            self,
            Self::Parked | Self::Parking | Self::Unparking | Self::ParkFailed
        )
    }

    /// True while a park or unpark sequence owns the axis.
    #[inline]
    pub const fn is_transition(&self) -> bool {
        matches!(self, Self::Parking | Self::Unparking)
    }

    /// Short upper-case name for logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unparked => "UNPARKED",
            Self::Parking => "PARKING",
            Self::Parked => "PARKED",
            Self::Unparking => "UNPARKING",
            Self::ParkFailed => "PARK_FAILED",
        }
    }
}

impl Default for ParkState {
    fn default() -> Self {
        Self::Unparked
    }
}

impl std::fmt::Display for ParkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
