//! Index Module
//!
//! Durable per-key metadata: expiration and last update time.
//!
//! ## Responsibilities
//! - Answer "is this key expired?" for every tray
//! - Record each write and deletion
//! - Survive restarts so expiration state is not lost
//! - List live entries so the storage can rebuild its trays on open
//!
//! ## Persistence
//! The whole map is encoded and written to the reserved key [`INDEX_KEY`]
//! through an ordinary tray, so it goes through the same encode/write/read
//! path as user values:
//! ```text
//! {data_dir}/
//!   ├── .index     HashMap<String, IndexEntry> (bincode)
//!   ├── alpha
//!   └── beta
//! ```

mod file;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub use file::Index;

/// Reserved key holding the encoded index
pub const INDEX_KEY: &str = ".index";

/// Move instants before the Unix epoch up to the epoch
///
/// The codec cannot represent pre-epoch `SystemTime`s. Any such deadline is
/// already in the past, so the epoch keeps its meaning.
pub fn clamp_to_epoch(at: SystemTime) -> SystemTime {
    at.max(UNIX_EPOCH)
}

/// Metadata for one stored key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The key this entry describes
    pub key: String,

    /// When the value expires (None = never expires)
    pub expired_at: Option<SystemTime>,

    /// Time of the last recorded write
    pub updated_at: SystemTime,
}

impl IndexEntry {
    /// Expiration state of this entry relative to `now`
    pub fn status_at(&self, now: SystemTime) -> ExpiryStatus {
        match self.expired_at {
            None => ExpiryStatus::NeverExpires,
            Some(at) if at < now => ExpiryStatus::Expired,
            Some(_) => ExpiryStatus::Live,
        }
    }
}

/// Result of an expiration query
///
/// `NeverExpires` is informational: the key exists and has no deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// Has a deadline that has not passed yet
    Live,

    /// Deadline is strictly before now
    Expired,

    /// No deadline was set
    NeverExpires,
}

impl ExpiryStatus {
    pub fn is_expired(self) -> bool {
        self == ExpiryStatus::Expired
    }
}
