//! File-backed settings store.
//!
//! The file holds a bincode-encoded [`StoreHeader`] followed by the raw
//! store image. A missing file, a foreign header or a capacity mismatch
//! all read as "no valid key", so the controller writes defaults.
//!
//! Writes go to a temporary sibling file which is synced and then renamed
//! over the store, so the previous image stays intact until the new one is
//! complete on disk.

use rotator_common::store::{SettingsStore, StoreError, StoreResult, check_bounds};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// File header written in front of the store image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreHeader {
    /// Format magic (`"RNV1"`).
    pub magic: u32,
    /// Format version (for migration).
    pub version: u32,
    /// Image size [bytes].
    pub capacity: u32,
}

impl StoreHeader {
    /// Format magic.
    pub const MAGIC: u32 = u32::from_le_bytes(*b"RNV1");
    /// Current format version.
    pub const CURRENT_VERSION: u32 = 1;
    /// Encoded header size [bytes].
    pub const ENCODED_LEN: usize = 12;

    fn for_capacity(capacity: usize) -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::CURRENT_VERSION,
            capacity: capacity as u32,
        }
    }
}

/// [`SettingsStore`] persisted to a single file.
///
/// The whole image is kept in memory; every effective update rewrites the
/// file. The in-memory image only changes once the write has succeeded.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    bytes: Vec<u8>,
    key_valid: bool,
}

impl FileStore {
    /// Open `path`, loading the image if the file carries a valid header.
    ///
    /// # Errors
    ///
    /// Only an unreadable existing file is an error. Foreign or stale
    /// content is discarded with a warning.
    pub fn open<P: AsRef<Path>>(path: P, capacity: usize) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut store = Self {
            path,
            bytes: vec![0; capacity],
            key_valid: false,
        };

        if !store.path.exists() {
            debug!("Store file {:?} does not exist, starting blank", store.path);
            return Ok(store);
        }

        let content = fs::read(&store.path)?;
        let expected = StoreHeader::for_capacity(capacity);
        let header = content
            .get(..StoreHeader::ENCODED_LEN)
            .and_then(|raw| bincode::deserialize::<StoreHeader>(raw).ok());

        match header {
            Some(header) if header == expected => {
                let image = &content[StoreHeader::ENCODED_LEN..];
                if image.len() < capacity {
                    warn!(
                        "Store file {:?} truncated ({} of {} bytes), starting blank",
                        store.path,
                        image.len(),
                        capacity
                    );
                    return Ok(store);
                }
                store.bytes.copy_from_slice(&image[..capacity]);
                store.key_valid = true;
                info!("Loaded {} byte store from {:?}", capacity, store.path);
            }
            Some(header) => {
                warn!(
                    "Store file {:?} header {:?} differs from {:?}, starting blank",
                    store.path, header, expected
                );
            }
            None => {
                warn!("Store file {:?} has no valid header, starting blank", store.path);
            }
        }
        Ok(store)
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_image(&self, image: &[u8]) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            bincode::serialize_into(&mut writer, &StoreHeader::for_capacity(image.len()))
                .map_err(|e| StoreError::Io {
                    source: std::io::Error::other(e.to_string()),
                })?;
            writer.write_all(image)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io { source: e.error })?;
        debug!("Store written to {:?}", self.path);
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn has_valid_key(&self) -> bool {
        self.key_valid
    }

    fn read_bytes(&mut self, offset: usize, buf: &mut [u8]) -> StoreResult<()> {
        if !self.key_valid {
            return Err(StoreError::InvalidKey);
        }
        check_bounds(offset, buf.len(), self.bytes.len())?;
        buf.copy_from_slice(&self.bytes[offset..offset + buf.len()]);
        Ok(())
    }

    fn update_bytes(&mut self, offset: usize, buf: &[u8]) -> StoreResult<()> {
        check_bounds(offset, buf.len(), self.bytes.len())?;
        let end = offset + buf.len();
        if self.key_valid && self.bytes[offset..end] == *buf {
            return Ok(());
        }

        let mut image = self.bytes.clone();
        image[offset..end].copy_from_slice(buf);
        self.write_image(&image)?;
        self.bytes = image;
        self.key_valid = true;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
