//! Index file
//!
//! RwLock-guarded metadata map persisted through its own tray.

use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, TrayError};
use crate::tray::Tray;

use super::{clamp_to_epoch, ExpiryStatus, IndexEntry, INDEX_KEY};

/// Durable key → metadata map
///
/// ## Concurrency:
/// - `entries` write lock covers both the mutation and the persist step, so
///   updates for different keys never interleave their writes to `.index`
/// - Expiration queries take the read lock and never wait on each other
/// - Every mutation persists synchronously before returning; a failed
///   persist restores the previous entry so memory matches `.index`
#[derive(Debug)]
pub struct Index {
    entries: RwLock<HashMap<String, IndexEntry>>,

    /// Tray holding the encoded map; has no index of its own
    tray: Tray,
}

impl Index {
    /// Load the index from `dir`, or start empty if none was written yet
    ///
    /// Fails with `Corrupt` if the sentinel file exists but cannot be decoded.
    pub fn load(dir: &Path) -> Result<Self> {
        let tray = Tray::new(dir.join(INDEX_KEY), INDEX_KEY, None, None);

        let entries = match tray.get::<HashMap<String, IndexEntry>>(false) {
            Ok(entries) => entries,
            Err(TrayError::NoData) => HashMap::new(),
            Err(e) => return Err(e),
        };
        debug!(entries = entries.len(), "Index loaded");

        Ok(Self {
            entries: RwLock::new(entries),
            tray,
        })
    }

    /// Expiration state of `key`
    ///
    /// - `NoData` if the key has no entry
    /// - `NeverExpires` if the entry has no deadline
    pub fn is_expired(&self, key: &str) -> Result<ExpiryStatus> {
        let entries = self.entries.read();
        let entry = entries.get(key).ok_or(TrayError::NoData)?;
        Ok(entry.status_at(SystemTime::now()))
    }

    /// Upsert the entry for `key` and persist the whole map
    pub fn record_write(&self, key: &str, expired_at: Option<SystemTime>) -> Result<()> {
        let mut entries = self.entries.write();

        let entry = IndexEntry {
            key: key.to_string(),
            expired_at: expired_at.map(clamp_to_epoch),
            updated_at: SystemTime::now(),
        };
        let previous = entries.insert(key.to_string(), entry);

        let result = self.tray.set(&*entries, None);
        if result.is_err() {
            restore(&mut entries, key, previous);
        }
        result
    }

    /// Remove the entry for `key` and persist; no-op if absent
    pub fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write();
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };

        let result = self.tray.set(&*entries, None);
        if result.is_err() {
            restore(&mut entries, key, Some(previous));
        }
        result
    }

    /// Entries that have not expired as of now
    ///
    /// Re-evaluated against the clock on every call.
    pub fn live_entries(&self) -> Vec<IndexEntry> {
        let now = SystemTime::now();
        self.entries
            .read()
            .values()
            .filter(|entry| entry.key != INDEX_KEY && !entry.status_at(now).is_expired())
            .cloned()
            .collect()
    }

    /// Entries whose deadline has passed
    pub fn expired_entries(&self) -> Vec<IndexEntry> {
        let now = SystemTime::now();
        self.entries
            .read()
            .values()
            .filter(|entry| entry.status_at(now).is_expired())
            .cloned()
            .collect()
    }

    /// Copy of the entry for `key`
    pub fn entry(&self, key: &str) -> Option<IndexEntry> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Put back what a failed mutation replaced
fn restore(entries: &mut HashMap<String, IndexEntry>, key: &str, previous: Option<IndexEntry>) {
    match previous {
        Some(entry) => {
            entries.insert(key.to_string(), entry);
        }
        None => {
            entries.remove(key);
        }
    }
}
