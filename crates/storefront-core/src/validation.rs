//! # Validation Module
//!
//! Input validation for everything that crosses the backend boundary.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Outbound (before a CRUD call)                                         │
//! │  ├── validate_new_product   - POST body                                │
//! │  └── validate_patch         - PUT body                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  CRUD backend (owns the records)                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Inbound (every record in a list/get response)                         │
//! │  └── validate_product       - invalid records are dropped              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::validation::{validate_product_name, validate_stock};
//!
//! validate_product_name("Ventilador de pie").unwrap();
//! assert!(validate_stock(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewProduct, Product, ProductPatch};
use crate::MAX_QUERY_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a category name (required, at most 100 characters).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    let category = category.trim();

    if category.is_empty() {
        return Err(ValidationError::required("category"));
    }

    if category.chars().count() > MAX_CATEGORY_LEN {
        return Err(ValidationError::TooLong {
            field: "category".to_string(),
            max: MAX_CATEGORY_LEN,
        });
    }

    Ok(())
}

/// Validates a product id received from the user or the backend.
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (matches everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed, lowercased query.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LEN {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LEN,
        });
    }

    Ok(query.to_lowercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price (must not be negative; zero is allowed).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::non_negative("price"));
    }
    Ok(())
}

/// Validates a stock level (must not be negative).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::non_negative("stock"));
    }
    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a decoded product record.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_id(product.id.as_str())?;
    validate_product_name(&product.name)?;
    validate_category(&product.category)?;
    validate_price(product.price)?;
    validate_stock(product.stock)?;
    Ok(())
}

/// Validates a create payload.
///
/// Description is required on create even though remote records may omit it.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;

    if product.description.trim().is_empty() {
        return Err(ValidationError::required("description"));
    }

    validate_category(&product.category)?;
    validate_price(product.price)?;
    validate_stock(product.stock)?;
    Ok(())
}

/// Validates a partial update. Empty patches are rejected.
pub fn validate_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if patch.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }

    if let Some(name) = &patch.name {
        validate_product_name(name)?;
    }
    if let Some(category) = &patch.category {
        validate_category(category)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Notebook Lenovo").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  Lava ").unwrap(), "lava");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_cents(-1)).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(matches!(
            validate_stock(-5),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_new_product_requires_description() {
        let product = NewProduct::new("Fan", "", Money::from_cents(3525), "misc");
        assert_eq!(
            validate_new_product(&product),
            Err(ValidationError::required("description"))
        );

        let product = NewProduct::new("Fan", "Pedestal fan", Money::from_cents(3525), "misc");
        assert!(validate_new_product(&product).is_ok());
    }

    #[test]
    fn test_validate_patch() {
        assert_eq!(
            validate_patch(&ProductPatch::default()),
            Err(ValidationError::EmptyUpdate)
        );

        let negative = ProductPatch {
            stock: Some(-1),
            ..Default::default()
        };
        assert!(validate_patch(&negative).is_err());

        let ok = ProductPatch {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(validate_patch(&ok).is_ok());
    }
}
