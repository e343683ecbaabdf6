//! # storefront-core: Pure Domain Logic for the Storefront
//!
//! This crate is the **heart** of the storefront. It holds the domain types
//! shared by the local stores, the remote catalog mirror and the admin export,
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Storefront Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     apps/storefront (CLI)                       │   │
//! │  │     catalog ──► cart ──► favorites ──► export                  │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────┐  ┌────────────▼────────────────────┐  │
//! │  │      storefront-store       │  │        storefront-sync          │  │
//! │  │  CartStore, FavoritesStore  │  │  CatalogStore + CRUD backend    │  │
//! │  └──────────────┬──────────────┘  └────────────┬────────────────────┘  │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────────────────▼───────────────────┐   │
//! │  │               ★ storefront-core (THIS CRATE) ★                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  search   │  │  export   │  │   │
//! │  │   │  Product  │  │   Money   │  │  query    │  │ JSON/CSV  │  │   │
//! │  │   │ CartLine  │  │  decimal  │  │ category  │  │ redaction │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO STORAGE • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, NewProduct, ProductPatch, CartLine)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`search`] - Catalog filtering by free text and category
//! - [`export`] - Database snapshot export to JSON or CSV
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//!
//! // Prices arrive from the backend as decimals and are kept in cents
//! let price = Money::from_decimal(450.99).unwrap();
//! assert_eq!(price.cents(), 45099);
//!
//! // Line totals use integer math
//! assert_eq!(price.multiply_quantity(2).cents(), 90198);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod export;
pub mod money;
pub mod search;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ExportError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Image used when a product is created or received without one.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.svg";

/// Maximum length of a free-text catalog query.
pub const MAX_QUERY_LEN: usize = 100;
