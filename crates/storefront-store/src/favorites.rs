//! # Favorites Store
//!
//! The set of favorite products, persisted under the `storefront-favorites`
//! slot as a JSON array of ids.

use std::sync::Arc;

use tracing::debug;

use storefront_core::ProductId;

use crate::collection::{Change, PersistentCollectionStore, SubscriptionId};
use crate::slot::KeyValueSlot;

/// Slot key holding the favorite ids.
pub const FAVORITES_SLOT_KEY: &str = "storefront-favorites";

/// Favorite products (set semantics, insertion ordered).
pub struct FavoritesStore {
    ids: PersistentCollectionStore<ProductId>,
}

impl FavoritesStore {
    pub fn load(slot: Arc<dyn KeyValueSlot>) -> Self {
        FavoritesStore {
            ids: PersistentCollectionStore::load(slot, FAVORITES_SLOT_KEY),
        }
    }

    /// Flips membership and returns the new state (`true` = now a favorite).
    pub fn toggle(&mut self, product_id: impl Into<ProductId>) -> bool {
        let product_id = product_id.into();
        let now_favorite = if self.ids.delete(product_id.as_str()).is_some() {
            false
        } else {
            self.ids.set(product_id.clone())
        };

        debug!(product_id = %product_id, favorite = now_favorite, "Favorite toggled");
        now_favorite
    }

    /// Marks a product as favorite (no-op when it already is).
    pub fn add(&mut self, product_id: impl Into<ProductId>) {
        let product_id = product_id.into();
        if !self.ids.contains(product_id.as_str()) {
            self.ids.set(product_id);
        }
    }

    /// Unmarks a product (no-op when it is not a favorite).
    pub fn remove(&mut self, product_id: &str) {
        self.ids.delete(product_id);
    }

    pub fn is_favorite(&self, product_id: &str) -> bool {
        self.ids.contains(product_id)
    }

    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// Favorite ids in the order they were added.
    pub fn ids(&self) -> Vec<ProductId> {
        self.ids.all().into_iter().cloned().collect()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Change<ProductId>) + Send + 'static,
    {
        self.ids.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.ids.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemorySlot;

    fn favorites(slot: &MemorySlot) -> FavoritesStore {
        FavoritesStore::load(Arc::new(slot.clone()))
    }

    #[test]
    fn test_toggle_is_observed_immediately() {
        let slot = MemorySlot::new();
        let mut favs = favorites(&slot);

        assert!(favs.toggle("p1"));
        assert!(favs.is_favorite("p1"));
        assert!(!favs.toggle("p1"));
        assert!(!favs.is_favorite("p1"));
    }

    #[test]
    fn test_double_toggle_restores_state() {
        let slot = MemorySlot::new();
        let mut favs = favorites(&slot);
        favs.add("a");
        favs.add("b");
        let before = favs.ids();

        favs.toggle("c");
        favs.toggle("c");
        favs.toggle("a");
        favs.toggle("a");

        let mut after = favs.ids();
        let mut expected = before.clone();
        after.sort();
        expected.sort();
        assert_eq!(after, expected);
        assert_eq!(favs.count(), 2);
    }

    #[test]
    fn test_add_and_remove_are_idempotent() {
        let slot = MemorySlot::new();
        let mut favs = favorites(&slot);

        favs.add("p1");
        favs.add("p1");
        assert_eq!(favs.count(), 1);

        favs.remove("p1");
        favs.remove("p1");
        assert_eq!(favs.count(), 0);
    }

    #[test]
    fn test_persisted_as_id_array() {
        let slot = MemorySlot::new();
        let mut favs = favorites(&slot);
        favs.toggle("p2");
        favs.toggle("p1");

        assert_eq!(
            slot.read(FAVORITES_SLOT_KEY).unwrap().as_deref(),
            Some(r#"["p2","p1"]"#)
        );

        let reloaded = favorites(&slot);
        assert_eq!(reloaded.ids(), vec![ProductId::from("p2"), ProductId::from("p1")]);
    }

    #[test]
    fn test_malformed_slot_loads_empty() {
        let slot = MemorySlot::new();
        slot.write(FAVORITES_SLOT_KEY, "not json").unwrap();
        assert_eq!(favorites(&slot).count(), 0);
    }
}
