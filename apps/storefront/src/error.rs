//! # App Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Command Function ─── Result<T, AppError>                               │
//! │         │                                                               │
//! │         ├── SyncError::NotFound ───────────┐                            │
//! │         ├── SyncError::RetriesExhausted ───┤                            │
//! │         ├── ValidationError ───────────────┼──► AppError { code, msg }  │
//! │         ├── ExportError::Empty ────────────┤         │                  │
//! │         └── StoreError ────────────────────┘         ▼                  │
//! │                                              stderr: [NotFound] ...     │
//! │                                              exit status 1              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal details (I/O paths, decode errors) are logged, and the user gets
//! a short message.

use serde::Serialize;
use storefront_core::{ExportError, ValidationError};
use storefront_store::StoreError;
use storefront_sync::SyncError;

/// Result type alias for commands.
pub type AppResult<T> = Result<T, AppError>;

/// Error returned by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product (or other resource) not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// The catalog backend failed or could not be reached
    RemoteError,

    /// Nothing to export
    ExportEmpty,

    /// Encoding or decoding failed
    SerializationError,

    /// Anything else
    Internal,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::Internal, message)
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Validation(e) => AppError::from(e),
            SyncError::NotFound(id) => AppError::not_found("Product", &id),
            SyncError::Remote { status, message } => AppError::new(
                ErrorCode::RemoteError,
                format!("Catalog service returned {}: {}", status, message),
            ),
            SyncError::Transport(e) => {
                tracing::error!("Catalog transport failed: {}", e);
                AppError::new(ErrorCode::RemoteError, "Catalog service unreachable")
            }
            SyncError::Decode(e) => {
                tracing::error!("Catalog response undecodable: {}", e);
                AppError::new(
                    ErrorCode::SerializationError,
                    "Catalog service sent an invalid response",
                )
            }
            SyncError::RetriesExhausted {
                attempts,
                last_error,
            } => AppError::new(
                ErrorCode::RemoteError,
                format!(
                    "Catalog unavailable after {} attempts: {}",
                    attempts, last_error
                ),
            ),
            SyncError::InvalidConfig(e) | SyncError::ConfigLoadFailed(e) => {
                AppError::internal(format!("Configuration error: {}", e))
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Empty => AppError::new(ErrorCode::ExportEmpty, "Nothing to export"),
            ExportError::InvalidData(e) => {
                AppError::new(ErrorCode::SerializationError, format!("Export failed: {}", e))
            }
            ExportError::UnknownTable(_) | ExportError::UnsupportedFormat(_) => {
                AppError::validation(err.to_string())
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Local storage failed: {}", err);
        match err {
            StoreError::Encode { .. } | StoreError::Decode { .. } => {
                AppError::new(ErrorCode::SerializationError, "Local data could not be read")
            }
            StoreError::Io { .. } | StoreError::InvalidKey(_) => {
                AppError::internal("Local storage operation failed")
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::new(ErrorCode::SerializationError, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_errors_map_to_codes() {
        let err = AppError::from(SyncError::NotFound("p9".into()));
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: p9");

        let err = AppError::from(SyncError::RetriesExhausted {
            attempts: 3,
            last_error: "Backend returned 503: down".into(),
        });
        assert_eq!(err.code, ErrorCode::RemoteError);

        let err = AppError::from(SyncError::Validation(ValidationError::EmptyUpdate));
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_export_errors_map_to_codes() {
        assert_eq!(AppError::from(ExportError::Empty).code, ErrorCode::ExportEmpty);
        assert_eq!(
            AppError::from(ExportError::UnknownTable("orders".into())).code,
            ErrorCode::ValidationError
        );
        assert_eq!(
            AppError::from(ExportError::InvalidData("bad".into())).code,
            ErrorCode::SerializationError
        );
    }

    #[test]
    fn test_serializes_screaming_code() {
        let json = serde_json::to_value(AppError::from(ExportError::Empty)).unwrap();
        assert_eq!(json["code"], "EXPORT_EMPTY");
        assert_eq!(json["message"], "Nothing to export");
    }

    #[test]
    fn test_display() {
        let err = AppError::not_found("Product", "p1");
        assert_eq!(err.to_string(), "[NotFound] Product not found: p1");
    }
}
