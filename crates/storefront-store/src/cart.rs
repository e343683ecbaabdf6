//! # Cart Store
//!
//! The shopping cart: quantity-tracked product lines, persisted under the
//! `storefront-cart` slot.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  User Action              Operation               Effect + Notice       │
//! │  ───────────              ─────────               ───────────────       │
//! │                                                                         │
//! │  Click "Add" ────────────► add_item() ──────────► qty += 1             │
//! │                                                   "Product added"       │
//! │                                                                         │
//! │  Change Quantity ────────► set_quantity() ──────► qty = n               │
//! │                             (n < 1 ⇒ remove_item, absent ⇒ no-op)      │
//! │                                                                         │
//! │  Click Remove ───────────► remove_item() ───────► line deleted         │
//! │                                                   "Product removed" ⚠   │
//! │                                                                         │
//! │  Click Clear ────────────► clear() ─────────────► all lines deleted    │
//! │                                                   "Cart emptied" ⚠      │
//! │                                                                         │
//! │  Every mutation is written through to the slot before it returns.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines hold only a product id and a quantity. Prices are looked up at
//! total time, so a line whose product left the catalog simply stops
//! counting towards [`CartStore::resolved_total`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use storefront_core::{CartLine, Money, ProductId};

use crate::collection::{Change, PersistentCollectionStore, SubscriptionId};
use crate::notice::{Notice, NoticeSink};
use crate::slot::KeyValueSlot;

/// Slot key holding the cart lines.
pub const CART_SLOT_KEY: &str = "storefront-cart";

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by product id (adding the same product increments)
/// - Every line has quantity >= 1
pub struct CartStore {
    lines: PersistentCollectionStore<CartLine>,
    notices: Arc<dyn NoticeSink>,
}

impl CartStore {
    /// Loads the cart from `slot`.
    pub fn load(slot: Arc<dyn KeyValueSlot>, notices: Arc<dyn NoticeSink>) -> Self {
        CartStore {
            lines: PersistentCollectionStore::load(slot, CART_SLOT_KEY),
            notices,
        }
    }

    /// Adds one unit of a product, returning the new quantity.
    pub fn add_item(&mut self, product_id: impl Into<ProductId>) -> i64 {
        let product_id = product_id.into();
        let quantity = self.quantity_of(product_id.as_str()).saturating_add(1);

        self.lines.set(CartLine::new(product_id.clone(), quantity));
        debug!(product_id = %product_id, quantity, "Cart item added");

        self.notices.notify(&Notice::info(
            "Product added",
            "The product has been added to the cart",
        ));
        quantity
    }

    /// Overwrites the quantity of an existing line.
    ///
    /// A quantity below 1 removes the line. Products that are not in the
    /// cart are left out; returns `false` when nothing was updated.
    pub fn set_quantity(&mut self, product_id: impl Into<ProductId>, quantity: i64) -> bool {
        let product_id = product_id.into();
        if quantity < 1 {
            return self.remove_item(product_id.as_str());
        }
        if !self.lines.contains(product_id.as_str()) {
            debug!(product_id = %product_id, "Quantity change for a product not in the cart");
            return false;
        }

        self.lines.set(CartLine::new(product_id.clone(), quantity));
        debug!(product_id = %product_id, quantity, "Cart quantity set");
        true
    }

    /// Removes a line. Returns `false` when the product was not in the cart.
    pub fn remove_item(&mut self, product_id: &str) -> bool {
        if self.lines.delete(product_id).is_none() {
            return false;
        }

        debug!(product_id = %product_id, "Cart item removed");
        self.notices.notify(&Notice::destructive(
            "Product removed",
            "The product has been removed from the cart",
        ));
        true
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        let removed = self.lines.len();
        self.lines.clear();

        debug!(removed, "Cart cleared");
        self.notices.notify(&Notice::destructive(
            "Cart emptied",
            "All products have been removed from the cart",
        ));
    }

    /// Quantity of a product in the cart (0 when absent).
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.lines.get(product_id).map_or(0, |line| line.quantity)
    }

    /// Lines in the order they were first added.
    pub fn lines(&self) -> Vec<CartLine> {
        self.lines.all().into_iter().cloned().collect()
    }

    /// Sum of all quantities, saturating at `i64::MAX`.
    pub fn total_quantity(&self) -> i64 {
        self.lines
            .all()
            .iter()
            .fold(0i64, |total, line| total.saturating_add(line.quantity))
    }

    /// Sum of quantity × price over lines whose product has a known price.
    ///
    /// Lines for products missing from `prices` are skipped.
    pub fn resolved_total(&self, prices: &HashMap<ProductId, Money>) -> Money {
        self.lines
            .all()
            .iter()
            .filter_map(|line| {
                prices
                    .get(&line.product_id)
                    .map(|price| price.multiply_quantity(line.quantity))
            })
            .sum()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Change<ProductId>) + Send + 'static,
    {
        self.lines.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.lines.unsubscribe(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::CollectingSink;
    use crate::slot::MemorySlot;

    fn cart_with_sink(slot: &MemorySlot) -> (CartStore, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        let cart = CartStore::load(Arc::new(slot.clone()), sink.clone());
        (cart, sink)
    }

    fn cart(slot: &MemorySlot) -> CartStore {
        cart_with_sink(slot).0
    }

    #[test]
    fn test_add_item_increments() {
        let slot = MemorySlot::new();
        let mut cart = cart(&slot);

        assert_eq!(cart.add_item("p1"), 1);
        assert_eq!(cart.add_item("p1"), 2);
        cart.add_item("p2");

        assert_eq!(cart.quantity_of("p1"), 2);
        assert_eq!(cart.quantity_of("missing"), 0);
        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_set_quantity_overwrites_and_removes() {
        let slot = MemorySlot::new();
        let mut cart = cart(&slot);
        cart.add_item("p1");

        assert!(cart.set_quantity("p1", 5));
        assert_eq!(cart.quantity_of("p1"), 5);

        assert!(cart.set_quantity("p1", 2));
        assert_eq!(cart.quantity_of("p1"), 2);

        assert!(cart.set_quantity("p1", 0));
        assert!(cart.is_empty());

        assert!(!cart.set_quantity("p2", -3));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_ignores_products_not_in_cart() {
        let slot = MemorySlot::new();
        let (mut cart, sink) = cart_with_sink(&slot);
        cart.add_item("p1");

        assert!(!cart.set_quantity("p2", 5));
        assert_eq!(cart.quantity_of("p2"), 0);
        assert_eq!(cart.line_count(), 1);
        assert_eq!(
            slot.read(CART_SLOT_KEY).unwrap().as_deref(),
            Some(r#"[{"id":"p1","quantity":1}]"#)
        );
        assert_eq!(sink.titles(), vec!["Product added"]);
    }

    #[test]
    fn test_quantities_saturate_instead_of_overflowing() {
        let slot = MemorySlot::new();
        let mut cart = cart(&slot);
        cart.add_item("p1");
        cart.add_item("p2");

        assert!(cart.set_quantity("p1", i64::MAX));
        assert_eq!(cart.add_item("p1"), i64::MAX);
        assert_eq!(cart.quantity_of("p1"), i64::MAX);
        assert_eq!(cart.total_quantity(), i64::MAX);

        assert!(cart.set_quantity("p1", i64::MAX / 10));
        let mut prices = HashMap::new();
        prices.insert(ProductId::from("p1"), Money::from_decimal(450.99).unwrap());
        prices.insert(ProductId::from("p2"), Money::from_cents(100));
        assert_eq!(cart.resolved_total(&prices), Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_mixed_operations_keep_invariants() {
        let slot = MemorySlot::new();
        let mut cart = cart(&slot);

        cart.add_item("a");
        cart.add_item("b");
        cart.add_item("a");
        cart.add_item("c");
        cart.set_quantity("c", 4);
        cart.remove_item("b");
        cart.set_quantity("a", 0);
        cart.add_item("a");
        cart.set_quantity("c", 7);
        cart.set_quantity("e", 3);
        cart.add_item("d");

        let lines = cart.lines();
        assert!(lines.iter().all(|l| l.quantity >= 1));
        assert_eq!(
            cart.total_quantity(),
            lines.iter().map(|l| l.quantity).sum::<i64>()
        );
        assert_eq!(cart.total_quantity(), 9);
        let ids: Vec<&str> = lines.iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "d"]);
    }

    #[test]
    fn test_reload_restores_identical_cart() {
        let slot = MemorySlot::new();
        let mut cart = cart(&slot);
        cart.add_item("p1");
        cart.add_item("p2");
        cart.set_quantity("p2", 3);
        let before = cart.lines();
        drop(cart);

        let reloaded = self::cart(&slot);
        assert_eq!(reloaded.lines(), before);
        assert_eq!(
            slot.read(CART_SLOT_KEY).unwrap().as_deref(),
            Some(r#"[{"id":"p1","quantity":1},{"id":"p2","quantity":3}]"#)
        );
    }

    #[test]
    fn test_resolved_total_skips_unknown_products() {
        let slot = MemorySlot::new();
        let mut cart = cart(&slot);
        cart.add_item("A");
        cart.add_item("A");
        cart.add_item("B");

        let mut prices = HashMap::new();
        prices.insert(ProductId::from("A"), Money::from_cents(1000));

        assert_eq!(cart.resolved_total(&prices), Money::from_cents(2000));
        assert_eq!(cart.resolved_total(&HashMap::new()), Money::zero());
    }

    #[test]
    fn test_notices() {
        let slot = MemorySlot::new();
        let (mut cart, sink) = cart_with_sink(&slot);

        cart.add_item("p1");
        cart.set_quantity("p1", 3);
        assert!(cart.remove_item("p1"));
        assert!(!cart.remove_item("p1"));
        cart.clear();

        assert_eq!(
            sink.titles(),
            vec!["Product added", "Product removed", "Cart emptied"]
        );
        let notices = sink.notices();
        assert!(!notices[0].is_destructive());
        assert!(notices[1].is_destructive());
        assert!(notices[2].is_destructive());
    }

    #[test]
    fn test_subscribe_delegates() {
        let slot = MemorySlot::new();
        let mut cart = cart(&slot);
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));

        let counter = count.clone();
        let id = cart.subscribe(move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        cart.add_item("p1");
        cart.clear();
        cart.unsubscribe(id);
        cart.add_item("p2");

        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
