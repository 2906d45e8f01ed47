//! Storage Module
//!
//! The facade that maps keys to trays.
//!
//! ## Responsibilities
//! - Prepare the data directory
//! - Load the index and rebuild a tray for every live entry on startup
//! - Route every keyed operation to exactly one tray per key
//! - Create trays on first write

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, TrayError};
use crate::index::{ExpiryStatus, Index, INDEX_KEY};
use crate::tray::Tray;

/// File-backed key-value storage with per-key caching and expiration
///
/// ## Concurrency Model
///
/// - `trays`: RwLock over the key → tray map. Lookups share the read lock;
///   first-write insertion takes the write lock and goes through the map's
///   entry API, so racing first writers end up with one tray.
/// - Tray operations run after the map lock is released. Each tray has its
///   own RwLock, so different keys never contend.
/// - `index`: owned here; trays only hold weak handles to it.
pub struct FileStorage {
    /// Storage configuration
    config: Config,

    /// Durable key metadata
    index: Arc<Index>,

    /// One tray per key, never replaced once created
    trays: RwLock<HashMap<String, Arc<Tray>>>,
}

impl FileStorage {
    /// Open or create storage with the given config
    ///
    /// On startup:
    /// 1. Create the data directory (fail if the path is not a directory)
    /// 2. Load the index
    /// 3. Build a tray for every live entry, hydrating its cache if
    ///    `eager_load` is set
    pub fn open(config: Config) -> Result<Self> {
        let dir = config.data_dir.as_path();

        // Step 1: Prepare directory
        match fs::metadata(dir) {
            Ok(meta) if !meta.is_dir() => {
                return Err(TrayError::InvalidDirectory(dir.to_path_buf()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => fs::create_dir_all(dir)?,
            Err(e) => return Err(e.into()),
        }

        // Step 2: Load index
        let index = Arc::new(Index::load(dir)?);

        // Step 3: Materialize live trays
        let mut trays = HashMap::new();
        for entry in index.live_entries() {
            let tray = Tray::new(dir.join(&entry.key), entry.key.clone(), entry.expired_at, Some(&index));
            if config.eager_load {
                tray.load_from_disk()?;
            }
            trays.insert(entry.key, Arc::new(tray));
        }

        info!(
            data_dir = %dir.display(),
            live = trays.len(),
            indexed = index.len(),
            "Storage opened"
        );

        Ok(Self {
            config,
            index,
            trays: RwLock::new(trays),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(Config::builder().data_dir(path.as_ref()).build())
    }

    /// Get a value, serving from the cache when possible
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.tray(key)?.get(true)
    }

    /// Get a value straight from its file, bypassing the cache
    pub fn get_no_cache<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.tray(key)?.get(false)
    }

    /// Expiration state of a key
    pub fn is_expired(&self, key: &str) -> Result<ExpiryStatus> {
        self.tray(key)?.is_expired()
    }

    /// Store a value with an optional expiration instant
    ///
    /// This is the only place new keys enter the storage.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, expired_at: Option<SystemTime>) -> Result<()> {
        validate_key(key)?;

        let tray = {
            let mut trays = self.trays.write();
            match trays.entry(key.to_string()) {
                Entry::Occupied(slot) => Arc::clone(slot.get()),
                Entry::Vacant(slot) => {
                    debug!(key, "Creating tray");
                    let tray = Tray::new(self.config.data_dir.join(key), key, expired_at, Some(&self.index));
                    Arc::clone(slot.insert(Arc::new(tray)))
                }
            }
        };

        tray.set(value, expired_at)
    }

    /// Store a value that expires `ttl` from now
    pub fn set_with_ttl<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        self.set(key, value, Some(SystemTime::now() + ttl))
    }

    /// Delete a key's file, cache and index entry
    ///
    /// The tray stays registered as an empty shell and is reused by a later
    /// `set` of the same key.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.tray(key)?.clear()
    }

    /// Reap every key whose expiration has passed
    ///
    /// Also removes files of keys that expired while the storage was closed.
    /// Returns the number of keys reaped.
    pub fn purge_expired(&self) -> Result<usize> {
        let expired = self.index.expired_entries();

        for entry in &expired {
            let tray = {
                let mut trays = self.trays.write();
                let tray = trays.entry(entry.key.clone()).or_insert_with(|| {
                    Arc::new(Tray::new(
                        self.config.data_dir.join(&entry.key),
                        entry.key.clone(),
                        entry.expired_at,
                        Some(&self.index),
                    ))
                });
                Arc::clone(tray)
            };
            tray.clear()?;
        }

        if !expired.is_empty() {
            info!(reaped = expired.len(), "Purged expired keys");
        }
        Ok(expired.len())
    }

    /// Keys with a live index entry, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.index.live_entries().into_iter().map(|e| e.key).collect();
        keys.sort();
        keys
    }

    /// True if the key has a live index entry
    pub fn contains_key(&self, key: &str) -> bool {
        matches!(self.index.is_expired(key), Ok(status) if !status.is_expired())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Number of registered trays, including cleared shells
    pub fn tray_count(&self) -> usize {
        self.trays.read().len()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn tray(&self, key: &str) -> Result<Arc<Tray>> {
        validate_key(key)?;
        self.trays.read().get(key).cloned().ok_or(TrayError::NoData)
    }
}

/// Reject keys that cannot be used as a file name inside the data directory
fn validate_key(key: &str) -> Result<()> {
    if key == INDEX_KEY {
        return Err(TrayError::ReservedKey(key.to_string()));
    }
    if key.is_empty() || key == "." || key == ".." || key.contains(|c: char| matches!(c, '/' | '\\' | '\0')) {
        return Err(TrayError::InvalidKey(key.to_string()));
    }
    Ok(())
}
