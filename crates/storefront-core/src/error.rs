//! # Error Types
//!
//! Domain-specific error types for storefront-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storefront-core errors (this file)                                    │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ExportError      - Database export failures                       │
//! │                                                                         │
//! │  storefront-store errors (separate crate)                              │
//! │  └── StoreError       - Local slot failures (never shown to users)     │
//! │                                                                         │
//! │  storefront-sync errors (separate crate)                               │
//! │  └── SyncError        - CRUD backend and retry failures                │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── AppError         - What the user sees (code + message)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any backend call is made, and when a remote record does not
/// have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., malformed record, non-finite price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// An update carried no fields.
    #[error("update must change at least one field")]
    EmptyUpdate,
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn non_negative(field: &str) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        }
    }
}

// =============================================================================
// Export Error
// =============================================================================

/// Database export errors.
///
/// ## User Workflow
/// ```text
/// Admin picks tables + format
///      │
///      ▼
/// No table selected / all empty? ──► Empty ("nothing to export")
///      │
///      ▼
/// Redact sensitive fields
///      │
///      ▼
/// Encoder fails? ──────────────────► InvalidData (no partial output)
///      │
///      ▼
/// ExportOutput { content, filename }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// No tables were requested, or every requested table is empty.
    #[error("Nothing to export")]
    Empty,

    /// The snapshot could not be encoded.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Requested table is not part of the exportable set.
    #[error("Unknown table: '{0}'. Valid options: products, messages, users")]
    UnknownTable(String),

    /// Requested format is neither json nor csv.
    #[error("Unsupported export format: '{0}'. Valid options: json, csv")]
    UnsupportedFormat(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for export Results.
pub type ExportResult<T> = Result<T, ExportError>;

// =============================================================================
// Unit Tests
// =============================================================================
