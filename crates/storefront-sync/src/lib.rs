//! # storefront-sync: Remote Catalog Mirror
//!
//! Mirrors the product catalog held by the CRUD backend and applies admin
//! edits to it.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         storefront-sync                                 │
//! │                                                                         │
//! │   ┌─────────────────────────────────────────────────────────────────┐  │
//! │   │                      CatalogStore                               │  │
//! │   │  refresh() ── retry 3× / 2s ──┐     create / update / delete    │  │
//! │   │  cache: RwLock<Vec<Product>>  │     ──► apply_local_patch       │  │
//! │   │  search / by_category / price_index / status / subscribe        │  │
//! │   └───────────────────────────────┼─────────────────────────────────┘  │
//! │                                   ▼                                     │
//! │   ┌─────────────────────────────────────────────────────────────────┐  │
//! │   │            CatalogBackend (async trait)                         │  │
//! │   │   HttpCatalogBackend (reqwest)    MemoryCatalogBackend          │  │
//! │   └─────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │   StorefrontConfig: TOML + STOREFRONT_* env ──► RetryPolicy, backend   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_store::NoOpSink;
//! use storefront_sync::{CatalogStore, HttpCatalogBackend, StorefrontConfig};
//!
//! # async fn run() -> storefront_sync::SyncResult<()> {
//! let config = StorefrontConfig::load(None)?;
//! let backend = Arc::new(HttpCatalogBackend::from_config(&config)?);
//! let catalog = CatalogStore::new(backend, config.retry_policy(), Arc::new(NoOpSink));
//!
//! catalog.refresh().await?;
//! println!("{} products", catalog.len());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod retry;

pub use backend::CatalogBackend;
pub use catalog::{
    CatalogChange, CatalogStatus, CatalogStore, CatalogSubscription, LocalPatch, RefreshOutcome,
};
pub use config::StorefrontConfig;
pub use error::{SyncError, SyncResult};
pub use http::HttpCatalogBackend;
pub use memory::MemoryCatalogBackend;
pub use retry::{RetryDecision, RetryPolicy, RetryState};
