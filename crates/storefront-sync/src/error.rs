//! # Sync Error Types
//!
//! Error types for catalog operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Remote (retry)│  │     Caller              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Remote         │  │  Validation             │ │
//! │  │  ConfigLoad     │  │  Transport      │  │  NotFound               │ │
//! │  │                 │  │  Decode         │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │                       RetriesExhausted: refresh gave up                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use storefront_core::ValidationError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while talking to the CRUD backend.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    /// Input rejected before any backend call.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The backend has no product with this id.
    #[error("Product not found: {0}")]
    NotFound(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// The request never got an answer (connect, timeout, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The answer could not be decoded.
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Every refresh attempt failed.
    #[error("Catalog refresh failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Decode(err.to_string())
        } else {
            SyncError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidConfig(format!("invalid URL: {}", err))
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if the failed call may succeed when repeated.
    ///
    /// Every failure to obtain a usable answer counts: non-2xx statuses,
    /// transport errors and undecodable bodies.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Remote { .. } | SyncError::Transport(_) | SyncError::Decode(_)
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_) | SyncError::ConfigLoadFailed(_)
        )
    }
}
