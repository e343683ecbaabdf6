//! # storefront-store: Persisted Local State
//!
//! The client-side state that survives restarts.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         storefront-store                                │
//! │                                                                         │
//! │   ┌─────────────────┐              ┌─────────────────┐                 │
//! │   │   CartStore     │              │ FavoritesStore  │                 │
//! │   │  add / set /    │              │  toggle / add / │                 │
//! │   │  remove / clear │              │  remove         │                 │
//! │   └────────┬────────┘              └────────┬────────┘                 │
//! │            │         NoticeSink ◄───────────┤ (cart only)              │
//! │            ▼                                ▼                           │
//! │   ┌─────────────────────────────────────────────────────────────────┐  │
//! │   │        PersistentCollectionStore<V: Keyed>                      │  │
//! │   │   ordered map • write-through • subscribe / unsubscribe         │  │
//! │   └────────────────────────────┬────────────────────────────────────┘  │
//! │                                ▼                                        │
//! │   ┌─────────────────────────────────────────────────────────────────┐  │
//! │   │   KeyValueSlot: MemorySlot | FileSlot                           │  │
//! │   │   "storefront-cart"  "storefront-favorites"                     │  │
//! │   └─────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use storefront_store::{CartStore, MemorySlot, NoOpSink};
//!
//! let slot = Arc::new(MemorySlot::new());
//! let mut cart = CartStore::load(slot.clone(), Arc::new(NoOpSink));
//! cart.add_item("p1");
//! cart.add_item("p1");
//!
//! // A fresh store over the same slot sees the same lines
//! let reloaded = CartStore::load(slot, Arc::new(NoOpSink));
//! assert_eq!(reloaded.quantity_of("p1"), 2);
//! ```

pub mod cart;
pub mod collection;
pub mod error;
pub mod favorites;
pub mod notice;
pub mod slot;

pub use cart::{CartStore, CART_SLOT_KEY};
pub use collection::{Change, Keyed, PersistentCollectionStore, SubscriptionId};
pub use error::{StoreError, StoreResult};
pub use favorites::{FavoritesStore, FAVORITES_SLOT_KEY};
pub use notice::{CollectingSink, NoOpSink, Notice, NoticeSink, NoticeVariant};
pub use slot::{FileSlot, KeyValueSlot, MemorySlot};
