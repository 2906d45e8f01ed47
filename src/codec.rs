//! Value codec
//!
//! Turns any serde value into the opaque byte envelope stored in tray files
//! and back. The engine never looks inside the envelope; it only cares
//! whether decoding succeeded.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, TrayError};

/// Encode a value to bytes
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| TrayError::Encode(e.to_string()))
}

/// Decode bytes into a typed value
///
/// Any failure (truncated input, wrong shape, trailing garbage in a length
/// prefix) is reported as `Corrupt`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes).map_err(|e| TrayError::Corrupt(e.to_string()))
}
