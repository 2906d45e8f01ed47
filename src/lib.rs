//! # TrayStore
//!
//! A file-backed key-value store with:
//! - One file per key, with its encoded bytes cached in memory
//! - Optional per-key expiration, reaped on access
//! - A durable metadata index so presence and expiration survive restarts
//! - Per-key reader/writer locking
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FileStorage                            │
//! │               (key → Tray map, RwLock)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐   weak    ┌─────────────┐
//!   │    Tray     │──────────▶│    Index    │
//!   │ file+cache  │           │  (RwLock)   │
//!   └──────┬──────┘           └──────┬──────┘
//!          │                         │ persists through its own tray
//!          ▼                         ▼
//!   {data_dir}/<key>          {data_dir}/.index
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use traystore::FileStorage;
//!
//! let storage = FileStorage::open_path("./data")?;
//! storage.set("greeting", "hello", None)?;
//! let value: String = storage.get("greeting")?;
//! assert_eq!(value, "hello");
//! # Ok::<(), traystore::TrayError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod index;
pub mod tray;
pub mod storage;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{TrayError, Result};
pub use config::Config;
pub use index::{ExpiryStatus, IndexEntry};
pub use storage::FileStorage;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of TrayStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
