//! Durable settings store interface.
//!
//! Byte-addressed non-volatile storage with a presence/validity flag, the
//! shape of an EEPROM or flash emulation layer. The store is a passive
//! sink: only the rotator mutates the bytes it owns.

use thiserror::Error;

/// Errors surfaced by a settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Access outside the store capacity.
    #[error("store access out of bounds: offset {offset} + {len} bytes > capacity {capacity}")]
    OutOfBounds {
        /// Start offset.
        offset: usize,
        /// Access length.
        len: usize,
        /// Store capacity.
        capacity: usize,
    },

    /// Read before the store holds a valid key.
    #[error("store has no valid key")]
    InvalidKey,

    /// Backing medium I/O error.
    #[error("store I/O error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Byte-addressed persistent storage.
pub trait SettingsStore: Send {
    /// True once the store has been initialised with a valid key.
    ///
    /// A store without a valid key holds no trustworthy settings.
    fn has_valid_key(&self) -> bool;

    /// Fill `buf` from `offset`.
    ///
    /// Fails with [`StoreError::InvalidKey`] until the key is valid.
    fn read_bytes(&mut self, offset: usize, buf: &mut [u8]) -> StoreResult<()>;

    /// Write `buf` at `offset`, skipping bytes that already match.
    ///
    /// A successful update marks the key valid.
    fn update_bytes(&mut self, offset: usize, buf: &[u8]) -> StoreResult<()>;

    /// Store capacity [bytes].
    fn capacity(&self) -> usize;
}

/// Check an access against a capacity.
pub fn check_bounds(offset: usize, len: usize, capacity: usize) -> StoreResult<()> {
    match offset.checked_add(len) {
        Some(end) if end <= capacity => Ok(()),
        _ => Err(StoreError::OutOfBounds {
            offset,
            len,
            capacity,
        }),
    }
}
