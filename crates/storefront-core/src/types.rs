//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   NewProduct    │   │  ProductPatch   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  (no id)        │   │  every field    │       │
//! │  │  name, price    │   │  POST body      │   │  optional       │       │
//! │  │  stock, ...     │   │                 │   │  PUT body       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │   ProductId     │   │    CartLine     │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  opaque string  │   │  id, quantity   │                             │
//! │  │  (backend owns) │   │  quantity >= 1  │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shape
//! Products travel as flat JSON objects; prices are decimals:
//! ```json
//! { "id": "ckx1", "name": "Notebook Lenovo", "description": "...",
//!   "price": 620, "stock": 3, "category": "notebooks", "image": "/img.jpg" }
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation;
use crate::PLACEHOLDER_IMAGE;

// =============================================================================
// Product Id
// =============================================================================

/// Identifier of a product, assigned by the CRUD backend.
///
/// Opaque to the client: the backend may use cuid, UUID or integers rendered
/// as strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        ProductId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        ProductId(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        ProductId(id)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

fn placeholder_image() -> String {
    PLACEHOLDER_IMAGE.to_string()
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// ## Invariants
/// - `price >= 0`
/// - `stock >= 0`
///
/// Both are checked by [`Product::from_remote`]; records that fail are
/// dropped from the catalog instead of failing a whole refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Backend-assigned identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Free-text description (empty when the backend omits it).
    #[serde(default)]
    pub description: String,

    /// Unit price, carried on the wire as a decimal.
    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub price: Money,

    /// Units available.
    #[ts(type = "number")]
    pub stock: i64,

    /// Category name.
    pub category: String,

    /// Image path or URL.
    #[serde(default = "placeholder_image")]
    pub image: String,
}

impl Product {
    /// Decodes and validates a record received from the CRUD backend.
    ///
    /// ## Rejected Records
    /// - Missing `id`, `name`, `price`, `stock` or `category`
    /// - Mistyped fields (e.g. `"price": "12"`)
    /// - Negative price or stock
    ///
    /// ## Example
    /// ```rust
    /// use serde_json::json;
    /// use storefront_core::Product;
    ///
    /// let ok = json!({"id": "1", "name": "Fan", "price": 35.25, "stock": 10, "category": "misc"});
    /// assert!(Product::from_remote(ok).is_ok());
    ///
    /// let bad = json!({"id": "2", "name": "Fan", "price": -1, "stock": 10, "category": "misc"});
    /// assert!(Product::from_remote(bad).is_err());
    /// ```
    pub fn from_remote(value: serde_json::Value) -> Result<Product, ValidationError> {
        let product: Product =
            serde_json::from_value(value).map_err(|e| ValidationError::InvalidFormat {
                field: "product".to_string(),
                reason: e.to_string(),
            })?;

        validation::validate_product(&product)?;
        Ok(product)
    }

    /// Price of `quantity` units.
    #[inline]
    pub fn line_total(&self, quantity: i64) -> Money {
        self.price.multiply_quantity(quantity)
    }
}

// =============================================================================
// New Product
// =============================================================================

/// Payload for creating a product (`POST /products`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub price: Money,
    #[serde(default)]
    #[ts(type = "number")]
    pub stock: i64,
    pub category: String,
    #[serde(default = "placeholder_image")]
    pub image: String,
}

impl NewProduct {
    /// Builds a payload with zero stock and the placeholder image.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        category: impl Into<String>,
    ) -> Self {
        NewProduct {
            name: name.into(),
            description: description.into(),
            price,
            stock: 0,
            category: category.into(),
            image: placeholder_image(),
        }
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Attaches a backend-assigned id.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            category: self.category,
            image: self.image,
        }
    }
}

// =============================================================================
// Product Patch
// =============================================================================

/// Partial update for a product (`PUT /products/{id}`).
///
/// Only the fields that are `Some` are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::money::decimal_option"
    )]
    #[ts(type = "number | null")]
    pub price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "number | null")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductPatch {
    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category.is_none()
            && self.image.is_none()
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the shopping cart.
///
/// ## Invariants
/// - Unique by `product_id` within a cart
/// - `quantity >= 1` (setting 0 removes the line instead)
///
/// Persisted as `{"id": "...", "quantity": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[ts(type = "number")]
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<ProductId>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_json() -> serde_json::Value {
        json!({
            "id": "p1",
            "name": "Notebook Lenovo",
            "description": "ThinkPad",
            "price": 620.0,
            "stock": 3,
            "category": "notebooks",
            "image": "/images/lava10.jpg"
        })
    }

    #[test]
    fn test_from_remote_accepts_valid_record() {
        let product = Product::from_remote(product_json()).unwrap();
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.price.cents(), 62000);
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn test_from_remote_fills_optional_fields() {
        let product = Product::from_remote(json!({
            "id": "p2", "name": "Fan", "price": 35.25, "stock": 10, "category": "misc"
        }))
        .unwrap();
        assert_eq!(product.description, "");
        assert_eq!(product.image, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_from_remote_rejects_bad_shapes() {
        let mut missing = product_json();
        missing.as_object_mut().unwrap().remove("category");
        assert!(Product::from_remote(missing).is_err());

        let mut mistyped = product_json();
        mistyped["stock"] = json!("three");
        assert!(Product::from_remote(mistyped).is_err());

        let mut negative = product_json();
        negative["stock"] = json!(-1);
        assert!(Product::from_remote(negative).is_err());
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let patch = ProductPatch {
            price: Some(Money::from_cents(1050)),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({"price": 10.5}));
        assert!(ProductPatch::default().is_empty());
    }

    #[test]
    fn test_cart_line_wire_shape() {
        let line = CartLine::new("p1", 2);
        assert_eq!(
            serde_json::to_value(&line).unwrap(),
            json!({"id": "p1", "quantity": 2})
        );
    }

    #[test]
    fn test_product_id_borrows_as_str() {
        let mut ids = std::collections::HashSet::new();
        ids.insert(ProductId::from("p1"));
        assert!(ids.contains("p1"));
    }
}
