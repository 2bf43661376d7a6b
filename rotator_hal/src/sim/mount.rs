//! Simulated mount tracking a fixed equatorial target.
//!
//! Local sidereal time starts at 0 h when the mount is created, so the
//! initial hour angle is `-right_ascension`. The hour angle then advances
//! at the sidereal rate, either from wall-clock time ([`SimulatedMount::sync`])
//! or explicitly ([`SimulatedMount::advance`]).

use parking_lot::RwLock;
use rotator_common::pointing::{EquatorialCoordinate, MountGeometry, PointingSource};
use rotator_common::rotator::config::MountConfig;
use std::time::{Duration, Instant};
use tracing::trace;

/// Sidereal rate [deg of hour angle per second of time].
pub const SIDEREAL_RATE_DEG_PER_S: f64 = 15.041_067 / 3600.0;

#[derive(Debug)]
struct Tracking {
    /// Hour angle [deg], wrapped to [-180, 180).
    hour_angle: f64,
    last_sync: Instant,
}

/// Mount/site simulation implementing [`PointingSource`].
#[derive(Debug)]
pub struct SimulatedMount {
    geometry: MountGeometry,
    latitude: f64,
    declination: f64,
    tracking: RwLock<Tracking>,
}

impl SimulatedMount {
    /// Build from a `[mount]` config section.
    pub fn new(config: &MountConfig) -> Self {
        Self::with_hour_angle(
            config.geometry,
            config.latitude,
            -config.right_ascension * 15.0,
            config.declination,
        )
    }

    /// Build with an explicit starting hour angle. Angles in degrees.
    pub fn with_hour_angle(
        geometry: MountGeometry,
        latitude: f64,
        hour_angle: f64,
        declination: f64,
    ) -> Self {
        Self {
            geometry,
            latitude: latitude.to_radians(),
            declination: declination.to_radians(),
            tracking: RwLock::new(Tracking {
                hour_angle: wrap_degrees(hour_angle),
                last_sync: Instant::now(),
            }),
        }
    }

    /// Advance the hour angle by `dt` of sidereal tracking.
    pub fn advance(&self, dt: Duration) {
        let mut tracking = self.tracking.write();
        tracking.hour_angle =
            wrap_degrees(tracking.hour_angle + SIDEREAL_RATE_DEG_PER_S * dt.as_secs_f64());
        trace!("Mount hour angle {:.5}°", tracking.hour_angle);
    }

    /// Advance the hour angle by the wall-clock time since the last sync.
    pub fn sync(&self) {
        let elapsed = {
            let mut tracking = self.tracking.write();
            let now = Instant::now();
            let elapsed = now.duration_since(tracking.last_sync);
            tracking.last_sync = now;
            elapsed
        };
        self.advance(elapsed);
    }

    /// Current hour angle [deg].
    pub fn hour_angle_degrees(&self) -> f64 {
        self.tracking.read().hour_angle
    }
}

impl PointingSource for SimulatedMount {
    fn position(&self) -> EquatorialCoordinate {
        EquatorialCoordinate {
            hour_angle: self.tracking.read().hour_angle.to_radians(),
            declination: self.declination,
        }
    }

    fn latitude(&self) -> f64 {
        self.latitude
    }

    fn geometry(&self) -> MountGeometry {
        self.geometry
    }
}

fn wrap_degrees(degrees: f64) -> f64 {
    (degrees + 180.0).rem_euclid(360.0) - 180.0
}

// ─── Tests ──────────────────────────────────────────────────────────
