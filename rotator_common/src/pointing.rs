//! Mount/site pointing interface.
//!
//! De-rotation needs the mount's live equatorial position, the site
//! latitude and the mount geometry. The mount subsystem is optional: a
//! rotator without a [`PointingSource`] never de-rotates.

use serde::{Deserialize, Serialize};

/// Equatorial position in the observer's frame.
///
/// Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EquatorialCoordinate {
    /// Hour angle [rad], positive west of the meridian.
    pub hour_angle: f64,
    /// Declination [rad].
    pub declination: f64,
}

impl EquatorialCoordinate {
    /// Build from degrees.
    pub fn from_degrees(hour_angle: f64, declination: f64) -> Self {
        Self {
            hour_angle: hour_angle.to_radians(),
            declination: declination.to_radians(),
        }
    }

    /// Same position with the hour angle shifted by `degrees`.
    #[inline]
    pub fn offset_hour_angle(&self, degrees: f64) -> Self {
        Self {
            hour_angle: self.hour_angle + degrees.to_radians(),
            declination: self.declination,
        }
    }
}

/// Mount geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountGeometry {
    /// German equatorial mount.
    Equatorial,
    /// Equatorial fork.
    Fork,
    /// Altitude-azimuth mount; the field rotates and needs de-rotation.
    AltAzimuth,
}

impl MountGeometry {
    /// Whether the field of view rotates as the mount tracks.
    #[inline]
    pub const fn needs_derotation(&self) -> bool {
        matches!(self, Self::AltAzimuth)
    }
}

/// Live pointing supplied by the mount/site subsystem.
pub trait PointingSource: Send + Sync {
    /// Current pointing.
    fn position(&self) -> EquatorialCoordinate;

    /// Site latitude [rad].
    fn latitude(&self) -> f64;

    /// Mount geometry.
    fn geometry(&self) -> MountGeometry;
}
