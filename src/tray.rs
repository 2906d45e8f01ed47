//! Tray
//!
//! The storage unit for a single key: one file on disk, a cached copy of its
//! encoded bytes, and an expiration check backed by the index.
//!
//! ## States
//! ```text
//!   Unpopulated ──(read / write)──▶ Cached
//!        ▲                            │
//!        └───────────(clear)──────────┘
//! ```
//! Expiration is not a stored state; it is asked of the index on every
//! access, so no stale "expired" flag can survive a rewrite.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::SystemTime;

use bytes::Bytes;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::codec;
use crate::error::{Result, TrayError};
use crate::index::{clamp_to_epoch, ExpiryStatus, Index};

/// Lock-protected part of a tray
#[derive(Debug, Default)]
struct TrayState {
    /// Encoded bytes mirroring the file's last known contents
    cache: Option<Bytes>,

    /// Expiration passed to the last `set` (or loaded from the index)
    expired_at: Option<SystemTime>,

    /// Bumped by every write and clear; lets a disk read detect that it raced
    generation: u64,
}

/// Storage unit for one key
///
/// ## Concurrency:
/// - `state` RwLock guards both the file and the cache
/// - Reads of the same key run in parallel, writes are exclusive
/// - Lock order is tray → index; the index never calls back into a user tray
#[derive(Debug)]
pub struct Tray {
    /// Backing file
    path: PathBuf,

    /// Key this tray serves
    key: String,

    state: RwLock<TrayState>,

    /// Non-owning handle to the index (None for the index's own tray)
    index: Option<Weak<Index>>,
}

impl Tray {
    /// Create a tray without touching the disk
    pub fn new(
        path: impl Into<PathBuf>,
        key: impl Into<String>,
        expired_at: Option<SystemTime>,
        index: Option<&Arc<Index>>,
    ) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            state: RwLock::new(TrayState {
                expired_at,
                ..TrayState::default()
            }),
            index: index.map(Arc::downgrade),
        }
    }

    /// Hydrate the cache from the backing file
    ///
    /// A missing file or an expired key leaves the cache empty and is not an
    /// error.
    pub fn load_from_disk(&self) -> Result<()> {
        let mut state = self.state.write();
        if self.expired_quietly() {
            return Ok(());
        }

        match read_file(&self.path) {
            Ok(bytes) => {
                debug!(key = %self.key, bytes = bytes.len(), "Tray hydrated");
                state.cache = Some(Bytes::from(bytes));
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                state.cache = None;
                Err(e.into())
            }
        }
    }

    /// Ask the index whether this key has expired
    pub fn is_expired(&self) -> Result<ExpiryStatus> {
        self.index()?.is_expired(&self.key)
    }

    /// Read and decode the stored value
    ///
    /// Order:
    /// 1. Expired → reap and return `Expired` (or the reap error)
    /// 2. `use_cache` and cached → decode from memory, no filesystem access
    /// 3. Otherwise read the file (`NoData` if missing) and decode
    ///
    /// The expiration check runs under the read lock, so a concurrent `set`
    /// cannot slip an already-expired value in between check and read.
    pub fn get<T: DeserializeOwned>(&self, use_cache: bool) -> Result<T> {
        let (bytes, generation) = {
            let state = self.state.read();

            if self.expired_quietly() {
                drop(state);
                debug!(key = %self.key, "Tray expired on read, reaping");
                self.clear()?;
                return Err(TrayError::Expired);
            }

            if use_cache {
                if let Some(cache) = &state.cache {
                    return codec::decode(cache);
                }
            }

            let bytes = match read_file(&self.path) {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(TrayError::NoData),
                Err(e) => return Err(e.into()),
            };
            (Bytes::from(bytes), state.generation)
        };

        let value = codec::decode(&bytes)?;

        // Only install what we read if nobody wrote or cleared in between
        let mut state = self.state.write();
        if state.generation == generation {
            state.cache = Some(bytes);
        }

        Ok(value)
    }

    /// Encode and store a value, then record the write in the index
    ///
    /// If the file write succeeds but the index update fails, the value is
    /// durable while the index may be stale until the next successful write.
    ///
    /// Deadlines before the Unix epoch are stored as the epoch itself; both
    /// are already in the past.
    pub fn set<T: Serialize + ?Sized>(&self, value: &T, expired_at: Option<SystemTime>) -> Result<()> {
        let expired_at = expired_at.map(clamp_to_epoch);
        let mut state = self.state.write();

        let encoded = codec::encode(value)?;

        state.generation += 1;
        if let Err(e) = write_file(&self.path, &encoded) {
            state.cache = None;
            return Err(e.into());
        }

        state.cache = Some(Bytes::from(encoded));
        state.expired_at = expired_at;
        debug!(key = %self.key, expires = expired_at.is_some(), "Tray written");

        if let Some(index) = &self.index {
            let Some(index) = index.upgrade() else {
                warn!(key = %self.key, "Value written but index is gone; index is stale for this key");
                return Err(TrayError::IndexUnavailable);
            };
            if let Err(e) = index.record_write(&self.key, expired_at) {
                warn!(key = %self.key, error = %e, "Value written but index update failed; index is stale for this key");
                return Err(e);
            }
        }

        Ok(())
    }

    /// Drop the cache, remove the file, and forget the key in the index
    ///
    /// Used for both explicit deletion and expiration reaping.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write();

        state.cache = None;
        state.generation += 1;

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        debug!(key = %self.key, "Tray cleared");

        if let Some(index) = &self.index {
            let index = index.upgrade().ok_or(TrayError::IndexUnavailable)?;
            index.remove(&self.key)?;
        }

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Expiration given to the last write
    pub fn expired_at(&self) -> Option<SystemTime> {
        self.state.read().expired_at
    }

    /// Whether the tray currently holds cached bytes
    pub fn is_cached(&self) -> bool {
        self.state.read().cache.is_some()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn index(&self) -> Result<Arc<Index>> {
        self.index
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(TrayError::IndexUnavailable)
    }

    /// Expired according to the index; unknown keys and index-less trays
    /// count as not expired
    fn expired_quietly(&self) -> bool {
        matches!(self.is_expired(), Ok(status) if status.is_expired())
    }
}

fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn write_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.flush()
}
