//! # Catalog Backend
//!
//! The seam between the catalog cache and the product CRUD service.
//!
//! ```text
//! ┌──────────────────────────┐
//! │  CatalogBackend (trait)  │   GET    /products        list()
//! │                          │   GET    /products/{id}   get()
//! │  returns raw JSON values │   POST   /products        create()
//! │  (validated by the       │   PUT    /products/{id}   update()
//! │   caller, per record)    │   DELETE /products/{id}   delete()
//! └──────────────────────────┘
//!        ▲              ▲
//!        │              │
//!  HttpCatalogBackend   MemoryCatalogBackend
//! ```
//!
//! Records come back as `serde_json::Value` so one malformed product does not
//! fail a whole listing; `CatalogStore` decodes them one at a time.

use async_trait::async_trait;
use serde_json::Value;

use storefront_core::{NewProduct, ProductId, ProductPatch};

use crate::error::SyncResult;

/// Product CRUD service.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Every product record.
    async fn list(&self) -> SyncResult<Vec<Value>>;

    /// One product record. `SyncError::NotFound` when it does not exist.
    async fn get(&self, id: &ProductId) -> SyncResult<Value>;

    /// Creates a product and returns the stored record (with its new id).
    async fn create(&self, product: &NewProduct) -> SyncResult<Value>;

    /// Applies a partial update and returns the stored record.
    async fn update(&self, id: &ProductId, patch: &ProductPatch) -> SyncResult<Value>;

    /// Deletes a product.
    async fn delete(&self, id: &ProductId) -> SyncResult<()>;
}
