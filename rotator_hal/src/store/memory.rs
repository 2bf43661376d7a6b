//! Volatile settings store.
//!
//! Behaves like an EEPROM image held in RAM. Used by tests and by callers
//! that do not need persistence across process restarts.

use rotator_common::store::{SettingsStore, StoreError, StoreResult, check_bounds};

/// In-memory [`SettingsStore`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    bytes: Vec<u8>,
    key_valid: bool,
    bytes_written: usize,
    fail_io: bool,
}

impl MemoryStore {
    /// Blank store of `capacity` bytes without a valid key.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0; capacity],
            key_valid: false,
            bytes_written: 0,
            fail_io: false,
        }
    }

    /// Store with a valid key holding `record` at `offset`.
    pub fn with_record(capacity: usize, offset: usize, record: &[u8]) -> StoreResult<Self> {
        check_bounds(offset, record.len(), capacity)?;
        let mut store = Self::new(capacity);
        store.bytes[offset..offset + record.len()].copy_from_slice(record);
        store.key_valid = true;
        Ok(store)
    }

    /// Raw image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes actually changed by `update_bytes` so far.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }

    /// Make every subsequent access fail with an I/O error.
    pub fn set_fail_io(&mut self, fail: bool) {
        self.fail_io = fail;
    }

    fn check_io(&self) -> StoreResult<()> {
        if self.fail_io {
            return Err(StoreError::Io {
                source: std::io::Error::other("simulated store failure"),
            });
        }
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn has_valid_key(&self) -> bool {
        self.key_valid
    }

    fn read_bytes(&mut self, offset: usize, buf: &mut [u8]) -> StoreResult<()> {
        self.check_io()?;
        if !self.key_valid {
            return Err(StoreError::InvalidKey);
        }
        check_bounds(offset, buf.len(), self.bytes.len())?;
        buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
        Ok(())
    }

    fn update_bytes(&mut self, offset: usize, buf: &[u8]) -> StoreResult<()> {
        self.check_io()?;
        check_bounds(offset, buf.len(), self.bytes.len())?;
        for (stored, &new) in self.bytes[offset..offset + buf.len()].iter_mut().zip(buf) {
            if *stored != new {
                *stored = new;
                self.bytes_written += 1;
            }
        }
        self.key_valid = true;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
