//! # Store Errors
//!
//! Failures of the durable slots behind the local stores.
//!
//! These never reach the user: a failed load yields an empty collection and a
//! failed save is logged and dropped.

use thiserror::Error;

/// Errors from key-value slots and payload encoding.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the slot failed.
    #[error("Slot I/O error for '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The collection could not be encoded.
    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The slot holds something that is not a valid payload.
    #[error("Malformed payload in '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The slot key cannot be used (e.g. it would escape the data directory).
    #[error("Invalid slot key: '{0}'")]
    InvalidKey(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
