//! # Catalog Store
//!
//! Local mirror of the product catalog. The CRUD backend owns the products;
//! this store keeps the last known good copy for reads.
//!
//! ## Refresh Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         refresh()                                       │
//! │                                                                         │
//! │   backend.list() ──ok──► decode each record ──► replace_all(cache)     │
//! │        │                 (invalid ones dropped)   Replaced { count }    │
//! │        │ err                                                            │
//! │        ▼                                                                │
//! │   retry.record_failure()                                                │
//! │        ├── RetryAfter(2s) ──► sleep ──► backend.list() ...              │
//! │        └── GiveUp ──► notice "Catalog unavailable"                      │
//! │                       Err(RetriesExhausted), cache left as it was       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Mutation Flow
//! ```text
//! create / update / delete
//!      │
//!      ▼
//! validate locally ──fail──► Err(Validation)      (no backend call)
//!      │
//!      ▼
//! backend call ──────fail──► Err(...)             (cache untouched, no retry)
//!      │
//!      ▼
//! apply_local_patch(Insert | Replace | Remove)
//! ```
//!
//! ## Concurrency
//! The cache lock is only held while copying in or out of memory, never
//! across an `.await`. Refreshes are not coalesced: two concurrent refreshes
//! both hit the backend and the last one to finish wins.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use storefront_core::search::{self, CatalogQuery};
use storefront_core::validation::{validate_new_product, validate_patch, validate_product_id};
use storefront_core::{Money, NewProduct, Product, ProductId, ProductPatch, ValidationError};
use storefront_store::{Notice, NoticeSink};

use crate::backend::CatalogBackend;
use crate::error::{SyncError, SyncResult};
use crate::retry::{RetryDecision, RetryPolicy};

// =============================================================================
// Changes & Status
// =============================================================================

/// What changed in the catalog cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogChange {
    /// The whole cache was replaced by a refresh.
    Replaced { count: usize },
    Inserted(ProductId),
    Updated(ProductId),
    Removed(ProductId),
}

/// A local edit mirroring a successful backend mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalPatch {
    Insert(Product),
    Replace(Product),
    Remove(ProductId),
}

/// Outcome of the most recent refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshOutcome {
    #[default]
    NeverRefreshed,
    Succeeded,
    Failed,
}

/// Health of the mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatus {
    pub last_outcome: RefreshOutcome,
    /// Failed backend calls since the last successful refresh.
    pub consecutive_failures: u32,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Handle returned by [`CatalogStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogSubscription(u64);

type CatalogListener = Box<dyn Fn(&CatalogChange) + Send + Sync>;

// =============================================================================
// Catalog Store
// =============================================================================

/// Cached view of the remote product catalog.
pub struct CatalogStore {
    backend: Arc<dyn CatalogBackend>,
    policy: RetryPolicy,
    notices: Arc<dyn NoticeSink>,
    cache: RwLock<Vec<Product>>,
    status: Mutex<CatalogStatus>,
    listeners: Mutex<Vec<(CatalogSubscription, CatalogListener)>>,
    next_subscription: AtomicU64,
}

impl CatalogStore {
    /// Creates an empty store. Call [`CatalogStore::refresh`] to fill it.
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        policy: RetryPolicy,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        CatalogStore {
            backend,
            policy,
            notices,
            cache: RwLock::new(Vec::new()),
            status: Mutex::new(CatalogStatus::default()),
            listeners: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Reloads the whole catalog from the backend.
    ///
    /// Returns the number of products now cached. After the retry budget is
    /// spent, returns `RetriesExhausted` and keeps the previous cache.
    pub async fn refresh(&self) -> SyncResult<usize> {
        let mut retry = self.policy.start();

        loop {
            let error = match self.backend.list().await {
                Ok(records) => {
                    let products = ingest(records);
                    let count = products.len();

                    self.replace_all(products);
                    retry.reset();
                    self.record_success();
                    return Ok(count);
                }
                Err(e) => e,
            };

            self.record_failure(&error);

            match retry.record_failure() {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        attempt = retry.attempts(),
                        max_attempts = self.policy.max_attempts,
                        retryable = error.is_retryable(),
                        error = %error,
                        ?delay,
                        "Catalog refresh failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp => {
                    error!(
                        attempts = retry.attempts(),
                        error = %error,
                        "Catalog refresh failed, giving up"
                    );
                    self.notices.notify(&Notice::destructive(
                        "Catalog unavailable",
                        format!("The products could not be loaded: {}", error),
                    ));
                    return Err(SyncError::RetriesExhausted {
                        attempts: retry.attempts(),
                        last_error: error.to_string(),
                    });
                }
            }
        }
    }

    /// Replaces the whole cache.
    pub fn replace_all(&self, products: Vec<Product>) {
        let count = products.len();
        *self.cache.write().unwrap_or_else(PoisonError::into_inner) = products;

        info!(count, "Catalog cache replaced");
        self.notify(&CatalogChange::Replaced { count });
    }

    /// Applies a single-record edit to the cache.
    ///
    /// `Insert` and `Replace` both upsert; `Remove` of an unknown id is a no-op.
    pub fn apply_local_patch(&self, patch: LocalPatch) {
        let change = {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            match patch {
                LocalPatch::Insert(product) | LocalPatch::Replace(product) => {
                    let id = product.id.clone();
                    match cache.iter().position(|p| p.id == id) {
                        Some(i) => {
                            cache[i] = product;
                            CatalogChange::Updated(id)
                        }
                        None => {
                            cache.push(product);
                            CatalogChange::Inserted(id)
                        }
                    }
                }
                LocalPatch::Remove(id) => match cache.iter().position(|p| p.id == id) {
                    Some(i) => {
                        cache.remove(i);
                        CatalogChange::Removed(id)
                    }
                    None => return,
                },
            }
        };

        debug!(?change, "Local catalog patch applied");
        self.notify(&change);
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates a product on the backend and inserts it locally.
    pub async fn create(&self, product: NewProduct) -> SyncResult<Product> {
        validate_new_product(&product)?;

        let record = self.backend.create(&product).await?;
        let created = decode_response(record)?;

        info!(product_id = %created.id, name = %created.name, "Product created");
        self.apply_local_patch(LocalPatch::Insert(created.clone()));
        Ok(created)
    }

    /// Updates a product on the backend and replaces it locally.
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> SyncResult<Product> {
        validate_product_id(id.as_str())?;
        validate_patch(&patch)?;

        let record = self.backend.update(id, &patch).await?;
        let updated = decode_response(record)?;

        info!(product_id = %updated.id, "Product updated");
        self.apply_local_patch(LocalPatch::Replace(updated.clone()));
        Ok(updated)
    }

    /// Deletes a product on the backend and removes it locally.
    pub async fn delete(&self, id: &ProductId) -> SyncResult<()> {
        validate_product_id(id.as_str())?;

        self.backend.delete(id).await?;

        info!(product_id = %id, "Product deleted");
        self.apply_local_patch(LocalPatch::Remove(id.clone()));
        Ok(())
    }

    /// Fetches one product and upserts it in the cache.
    pub async fn fetch(&self, id: &ProductId) -> SyncResult<Product> {
        validate_product_id(id.as_str())?;

        let record = self.backend.get(id).await?;
        let product = decode_response(record)?;

        self.apply_local_patch(LocalPatch::Replace(product.clone()));
        Ok(product)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Cached products in backend order.
    pub fn products(&self) -> Vec<Product> {
        self.read_cache().clone()
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.read_cache().iter().find(|p| p.id.as_str() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read_cache().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_cache().is_empty()
    }

    /// Case-insensitive search over name, description and category.
    pub fn search(&self, text: &str) -> SyncResult<Vec<Product>> {
        self.query(&CatalogQuery::text(text))
    }

    /// Runs a full query (text, category, ordering) over the cache.
    pub fn query(&self, query: &CatalogQuery) -> SyncResult<Vec<Product>> {
        let cache = self.read_cache();
        let results = query.apply(&cache)?;
        Ok(results.into_iter().cloned().collect())
    }

    pub fn by_category(&self, category: &str) -> Vec<Product> {
        let cache = self.read_cache();
        search::by_category(&cache, category)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Distinct category names, sorted.
    pub fn categories(&self) -> Vec<String> {
        self.read_cache()
            .iter()
            .map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Current price of every cached product.
    pub fn price_index(&self) -> HashMap<ProductId, Money> {
        self.read_cache()
            .iter()
            .map(|p| (p.id.clone(), p.price))
            .collect()
    }

    pub fn status(&self) -> CatalogStatus {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, Vec<Product>> {
        self.cache.read().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Registers a listener called after every cache change.
    ///
    /// Listeners run on the mutating task and must not subscribe or
    /// unsubscribe from inside the callback.
    pub fn subscribe<F>(&self, listener: F) -> CatalogSubscription
    where
        F: Fn(&CatalogChange) + Send + Sync + 'static,
    {
        let id = CatalogSubscription(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: CatalogSubscription) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    fn notify(&self, change: &CatalogChange) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, listener) in listeners.iter() {
            listener(change);
        }
    }

    // =========================================================================
    // Status Bookkeeping
    // =========================================================================

    fn record_success(&self) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        status.last_outcome = RefreshOutcome::Succeeded;
        status.consecutive_failures = 0;
        status.last_success = Some(Utc::now());
        status.last_error = None;
    }

    fn record_failure(&self, error: &SyncError) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        status.last_outcome = RefreshOutcome::Failed;
        status.consecutive_failures += 1;
        status.last_error = Some(error.to_string());
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes a listing, dropping records that are malformed or duplicated.
fn ingest(records: Vec<Value>) -> Vec<Product> {
    let total = records.len();
    let mut seen = HashSet::new();
    let mut products = Vec::with_capacity(total);

    for record in records {
        match Product::from_remote(record) {
            Ok(product) if seen.insert(product.id.clone()) => products.push(product),
            Ok(product) => warn!(product_id = %product.id, "Dropping duplicate product record"),
            Err(e) => warn!(error = %e, "Dropping invalid product record"),
        }
    }

    if products.len() < total {
        warn!(kept = products.len(), total, "Catalog listing partially ingested");
    }
    products
}

/// Decodes the record returned by a mutation.
fn decode_response(record: Value) -> SyncResult<Product> {
    Product::from_remote(record).map_err(|e: ValidationError| {
        SyncError::Decode(format!("backend returned an invalid product: {}", e))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
