//! Error types for TrayStore
//!
//! Provides a unified error type for all operations.
//!
//! Callers must be able to tell "never had this key" (`NoData`) apart from
//! "had it, reaped on expiration" (`Expired`) and from unreadable bytes
//! (`Corrupt`), so those are never folded into one variant.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using TrayError
pub type Result<T> = std::result::Result<T, TrayError>;

/// Unified error type for TrayStore operations
#[derive(Debug, Error)]
pub enum TrayError {
    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("no data")]
    NoData,

    #[error("expired")]
    Expired,

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("index is not available")]
    IndexUnavailable,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("encode error: {0}")]
    Encode(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("invalid directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("invalid key: {0:?}")]
    InvalidKey(String),

    #[error("reserved key: {0:?}")]
    ReservedKey(String),
}

impl TrayError {
    /// True for `NoData`
    pub fn is_no_data(&self) -> bool {
        matches!(self, TrayError::NoData)
    }

    /// True for `Expired`
    pub fn is_expired(&self) -> bool {
        matches!(self, TrayError::Expired)
    }
}
