//! # Application State
//!
//! The stores one CLI invocation works with, built once from configuration
//! and handed to every command.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         AppState                                        │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │  CatalogStore    │ │    CartStore     │ │   FavoritesStore     │   │
//! │  │                  │ │                  │ │                      │   │
//! │  │  HTTP backend or │ │  FileSlot        │ │  FileSlot            │   │
//! │  │  in-memory file  │ │  storefront-cart │ │  storefront-favorites│   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                                                                         │
//! │  Notices from every store go to stderr (StderrSink).                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use storefront_store::{
    CartStore, FavoritesStore, FileSlot, KeyValueSlot, Notice, NoticeSink, NoticeVariant,
};
use storefront_sync::{
    CatalogBackend, CatalogStore, HttpCatalogBackend, MemoryCatalogBackend, RetryPolicy,
    StorefrontConfig,
};

use crate::error::{AppError, AppResult};

/// Prints notices on stderr so they never mix with command output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl NoticeSink for StderrSink {
    fn notify(&self, notice: &Notice) {
        let marker = match notice.variant {
            NoticeVariant::Info => "*",
            NoticeVariant::Destructive => "!",
        };
        eprintln!("{} {}: {}", marker, notice.title, notice.description);
    }
}

/// Everything a command can touch.
pub struct AppState {
    pub catalog: CatalogStore,
    pub cart: CartStore,
    pub favorites: FavoritesStore,
}

impl AppState {
    /// Wires the stores over explicit collaborators.
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        policy: RetryPolicy,
        slot: Arc<dyn KeyValueSlot>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        AppState {
            catalog: CatalogStore::new(backend, policy, Arc::clone(&notices)),
            cart: CartStore::load(Arc::clone(&slot), notices),
            favorites: FavoritesStore::load(slot),
        }
    }

    /// Builds the state described by `config`.
    ///
    /// With `catalog_file`, the catalog is served from that JSON array in
    /// memory instead of the HTTP backend; edits then last for this run only.
    pub fn from_config(config: &StorefrontConfig, catalog_file: Option<&Path>) -> AppResult<Self> {
        let data_dir = config
            .data_dir()
            .ok_or_else(|| AppError::internal("Could not determine the data directory"))?;

        let backend: Arc<dyn CatalogBackend> = match catalog_file {
            Some(path) => {
                info!(path = %path.display(), "Serving catalog from file");
                Arc::new(MemoryCatalogBackend::with_records(read_records(path)?))
            }
            None => Arc::new(HttpCatalogBackend::from_config(config)?),
        };

        info!(data_dir = %data_dir.display(), backend = config.backend_url(), "State initialized");

        Ok(AppState::new(
            backend,
            config.retry_policy(),
            Arc::new(FileSlot::new(data_dir)),
            Arc::new(StderrSink),
        ))
    }
}

fn read_records(path: &Path) -> AppResult<Vec<Value>> {
    let contents = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&contents)? {
        Value::Array(records) => Ok(records),
        _ => Err(AppError::validation(format!(
            "{} must hold a JSON array of products",
            path.display()
        ))),
    }
}
