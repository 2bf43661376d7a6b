//! Field de-rotation math.
//!
//! On an alt-azimuth mount the field rotates at the rate of change of the
//! parallactic angle. The rotator follows it by applying that rate as the
//! axis base rate.
//!
//! ## Rate estimate
//!
//! The rate is a central difference over ±0.125° of hour angle (±30 s of
//! time, 60 s baseline). Near the pole of the `atan2` the two samples can
//! land on opposite sides of ±180°; the trailing or leading sample is then
//! shifted by 360° so the difference stays continuous.

use rotator_common::consts::{PARALLACTIC_BASELINE_S, PARALLACTIC_HALF_WINDOW_DEG};
use rotator_common::pointing::{EquatorialCoordinate, PointingSource};

/// Parallactic angle [deg] in (-180, 180].
///
/// `latitude` in radians.
pub fn parallactic_angle(coordinate: &EquatorialCoordinate, latitude: f64) -> f64 {
    let h = coordinate.hour_angle;
    let d = coordinate.declination;
    h.sin()
        .atan2(d.cos() * latitude.tan() - d.sin() * h.cos())
        .to_degrees()
}

/// Parallactic rate [deg/s].
///
/// `latitude` in radians.
pub fn parallactic_rate(coordinate: &EquatorialCoordinate, latitude: f64) -> f64 {
    let mut ahead = parallactic_angle(
        &coordinate.offset_hour_angle(PARALLACTIC_HALF_WINDOW_DEG),
        latitude,
    );
    let mut behind = parallactic_angle(
        &coordinate.offset_hour_angle(-PARALLACTIC_HALF_WINDOW_DEG),
        latitude,
    );

    if behind > 90.0 && ahead < -90.0 {
        ahead += 360.0;
    }
    if behind < -90.0 && ahead > 90.0 {
        behind += 360.0;
    }

    (ahead - behind) / PARALLACTIC_BASELINE_S
}

// ─── Derotator ──────────────────────────────────────────────────────

/// Runtime de-rotation flags. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Derotator {
    /// De-rotation requested.
    pub enabled: bool,
    /// Apply the rate with opposite sign (mirror in the optical train).
    pub reverse: bool,
}

impl Derotator {
    /// Create with the given flags.
    pub const fn new(enabled: bool, reverse: bool) -> Self {
        Self { enabled, reverse }
    }

    /// Base rate to apply [deg/s], or `None` when de-rotation does not apply
    /// (disabled, no pointing source or a non-rotating mount geometry).
    pub fn base_rate(&self, source: Option<&dyn PointingSource>) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        let source = source?;
        if !source.geometry().needs_derotation() {
            return None;
        }

        let rate = parallactic_rate(&source.position(), source.latitude());
        Some(if self.reverse { -rate } else { rate })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
