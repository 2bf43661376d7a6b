//! Persisted rotator settings record.
//!
//! The record is encoded with `bincode` (fixed-width little-endian
//! integers), so its size does not depend on the values:
//!
//! | Field        | Type        | Bytes |
//! |--------------|-------------|-------|
//! | `backlash`   | `i32`       | 4     |
//! | `position`   | `f64`       | 8     |
//! | `park_state` | variant u32 | 4     |
//!
//! Out-of-range fields found on load are repaired in place by
//! [`RotatorSettings::repair`]; the caller flags `InitError::VALUE`.

use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use thiserror::Error;

use crate::consts::{BACKLASH_MAX, SETTINGS_RECORD_SIZE};

use super::state::ParkState;

/// Record encode/decode error.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Bytes do not decode to a settings record (e.g. unknown park state).
    #[error("settings record undecodable: {0}")]
    Decode(String),

    /// Record could not be encoded.
    #[error("settings record unencodable: {0}")]
    Encode(String),
}

/// Rotator settings persisted across power cycles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotatorSettings {
    /// Backlash compensation [steps], `0..=BACKLASH_MAX`.
    pub backlash: i32,
    /// Last known instrument coordinate [deg], within the axis travel limits.
    pub position: f64,
    /// Park state at the time of the last write.
    pub park_state: ParkState,
}

/// Encoded size of [`RotatorSettings`] [bytes].
pub const ENCODED_LEN: usize = 16;

const_assert!(ENCODED_LEN <= SETTINGS_RECORD_SIZE);

impl Default for RotatorSettings {
    fn default() -> Self {
        Self {
            backlash: 0,
            position: 0.0,
            park_state: ParkState::Unparked,
        }
    }
}

/// A single field repaired by [`RotatorSettings::repair`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingsRepair {
    /// Backlash below zero, reset to 0.
    BacklashBelowMin(i32),
    /// Backlash above [`BACKLASH_MAX`], reset to 0.
    BacklashAboveMax(i32),
    /// Position below the minimum travel limit (or not finite), reset to 0.0.
    PositionBelowMin(f64),
    /// Position above the maximum travel limit, reset to 0.0.
    PositionAboveMax(f64),
}

impl std::fmt::Display for SettingsRepair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BacklashBelowMin(v) => write!(f, "bad NV backlash {v} < 0 steps (set to 0)"),
            Self::BacklashAboveMax(v) => {
                write!(f, "bad NV backlash {v} > {BACKLASH_MAX} steps (set to 0)")
            }
            Self::PositionBelowMin(v) => write!(f, "bad NV park pos {v} < limit min (set to 0.0)"),
            Self::PositionAboveMax(v) => write!(f, "bad NV park pos {v} > limit max (set to 0.0)"),
        }
    }
}

impl RotatorSettings {
    /// Encode to the fixed-size record.
    pub fn encode(&self) -> Result<Vec<u8>, SettingsError> {
        bincode::serialize(self).map_err(|e| SettingsError::Encode(e.to_string()))
    }

    /// Decode from a record. Trailing bytes are ignored.
    pub fn decode(bytes: &[u8]) -> Result<Self, SettingsError> {
        if bytes.len() < ENCODED_LEN {
            return Err(SettingsError::Decode(format!(
                "{} bytes, need {ENCODED_LEN}",
                bytes.len()
            )));
        }
        bincode::deserialize(&bytes[..ENCODED_LEN]).map_err(|e| SettingsError::Decode(e.to_string()))
    }

    /// Repair out-of-range fields in place.
    ///
    /// Returns what was repaired; empty if the record was valid.
    /// `park_state` is trusted as decoded.
    pub fn repair(&mut self, limit_min: f64, limit_max: f64) -> Vec<SettingsRepair> {
        let mut repairs = Vec::new();

        if self.backlash < 0 {
            repairs.push(SettingsRepair::BacklashBelowMin(self.backlash));
            self.backlash = 0;
        } else if self.backlash > BACKLASH_MAX {
            repairs.push(SettingsRepair::BacklashAboveMax(self.backlash));
            self.backlash = 0;
        }

        if !self.position.is_finite() || self.position < limit_min {
            repairs.push(SettingsRepair::PositionBelowMin(self.position));
            self.position = 0.0;
        } else if self.position > limit_max {
            repairs.push(SettingsRepair::PositionAboveMax(self.position));
            self.position = 0.0;
        }

        repairs
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const LIMIT_MIN: f64 = -180.0;
    const LIMIT_MAX: f64 = 180.0;

    #[test]
    fn encoded_len_is_fixed() {
        let a = RotatorSettings::default().encode().unwrap();
        let b = RotatorSettings {
            backlash: BACKLASH_MAX,
            position: -123.456,
            park_state: ParkState::ParkFailed,
        }
        .encode()
        .unwrap();
        assert_eq!(a.len(), ENCODED_LEN);
        assert_eq!(b.len(), ENCODED_LEN);
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let settings = RotatorSettings {
            backlash: 40,
            position: 12.5,
            park_state: ParkState::Parked,
        };
        let mut record = settings.encode().unwrap();
        record.resize(SETTINGS_RECORD_SIZE, 0xFF);
        assert_eq!(RotatorSettings::decode(&record).unwrap(), settings);
    }

    #[test]
    fn decode_rejects_unknown_park_state() {
        let mut record = RotatorSettings::default().encode().unwrap();
        record[12] = 9;
        assert!(matches!(
            RotatorSettings::decode(&record),
            Err(SettingsError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_short_record() {
        assert!(RotatorSettings::decode(&[0u8; 8]).is_err());
    }

    #[test]
    fn valid_record_needs_no_repair() {
        let mut settings = RotatorSettings {
            backlash: BACKLASH_MAX,
            position: LIMIT_MAX,
            park_state: ParkState::Parked,
        };
        assert!(settings.repair(LIMIT_MIN, LIMIT_MAX).is_empty());
        assert_eq!(settings.backlash, BACKLASH_MAX);
        assert_eq!(settings.position, LIMIT_MAX);
    }

    #[test]
    fn nan_position_is_repaired() {
        let mut settings = RotatorSettings {
            position: f64::NAN,
            ..Default::default()
        };
        let repairs = settings.repair(LIMIT_MIN, LIMIT_MAX);
        assert_eq!(repairs.len(), 1);
        assert_eq!(settings.position, 0.0);
    }

    proptest! {
        #[test]
        fn out_of_range_backlash_repaired_to_zero(
            backlash in prop_oneof![i32::MIN..0, (BACKLASH_MAX + 1)..i32::MAX],
            position in LIMIT_MIN..=LIMIT_MAX,
        ) {
            let mut settings = RotatorSettings { backlash, position, park_state: ParkState::Parked };
            let repairs = settings.repair(LIMIT_MIN, LIMIT_MAX);
            prop_assert_eq!(settings.backlash, 0);
            prop_assert_eq!(repairs.len(), 1);
            prop_assert_eq!(settings.position, position);
        }

        #[test]
        fn out_of_range_position_repaired_to_zero(
            position in prop_oneof![-1.0e6..LIMIT_MIN - 1e-9, LIMIT_MAX + 1e-9..1.0e6],
            backlash in 0..=BACKLASH_MAX,
        ) {
            let mut settings = RotatorSettings { backlash, position, park_state: ParkState::Unparked };
            let repairs = settings.repair(LIMIT_MIN, LIMIT_MAX);
            prop_assert_eq!(settings.position, 0.0);
            prop_assert_eq!(repairs.len(), 1);
            prop_assert_eq!(settings.backlash, backlash);
        }

        #[test]
        fn in_range_settings_untouched(
            backlash in 0..=BACKLASH_MAX,
            position in LIMIT_MIN..=LIMIT_MAX,
        ) {
            let original = RotatorSettings { backlash, position, park_state: ParkState::Unparked };
            let mut settings = original;
            prop_assert!(settings.repair(LIMIT_MIN, LIMIT_MAX).is_empty());
            prop_assert_eq!(settings, original);
        }
    }
}
