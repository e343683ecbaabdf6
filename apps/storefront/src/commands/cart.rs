//! # Cart Commands
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────┐   cart add / set   ┌──────────┐                           │
//! │  │  Empty   │───────────────────►│ In Cart  │◄──┐ cart add / set        │
//! │  │  Cart    │◄───────────────────│          │───┘ cart remove           │
//! │  └──────────┘    cart clear      └──────────┘                           │
//! │                  (or last line removed)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `cart show` prices lines against the catalog. When the catalog cannot be
//! loaded the lines are still shown, unpriced.

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use storefront_core::validation::validate_product_id;
use storefront_core::{CartLine, Money, ProductId};

use super::to_output;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Subcommand)]
pub enum CartCommand {
    /// Show lines and the total
    Show,

    /// Add one unit of a product
    Add { id: String },

    /// Set the quantity of a product (0 or less removes it)
    Set {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Remove a product from the cart
    Remove { id: String },

    /// Empty the cart
    Clear,
}

/// One cart line, priced when the product is known.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub id: ProductId,
    pub quantity: i64,
    pub name: Option<String>,
    #[serde(with = "storefront_core::money::decimal_option")]
    pub unit_price: Option<Money>,
    #[serde(with = "storefront_core::money::decimal_option")]
    pub line_total: Option<Money>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLineView>,
    pub total_quantity: i64,
    /// Sum over lines whose product is in the catalog.
    #[serde(with = "storefront_core::money::decimal")]
    pub total: Money,
    /// False when the catalog could not be loaded.
    pub priced: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub id: ProductId,
    /// 0 when the line is gone.
    pub quantity: i64,
    pub total_quantity: i64,
}

pub async fn run(state: &mut AppState, command: CartCommand) -> AppResult<Value> {
    match command {
        CartCommand::Show => to_output(show(state).await),
        CartCommand::Add { id } => to_output(add(state, &id)?),
        CartCommand::Set { id, quantity } => to_output(set(state, &id, quantity)?),
        CartCommand::Remove { id } => to_output(remove(state, &id)?),
        CartCommand::Clear => to_output(clear(state)),
    }
}

/// Lists the cart, priced against a fresh catalog when one is available.
pub async fn show(state: &AppState) -> CartResponse {
    debug!("cart show command");

    let priced = match state.catalog.refresh().await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Showing cart without prices");
            false
        }
    };

    let prices = state.catalog.price_index();
    let lines = state
        .cart
        .lines()
        .into_iter()
        .map(|line| view(state, line))
        .collect();

    CartResponse {
        lines,
        total_quantity: state.cart.total_quantity(),
        total: state.cart.resolved_total(&prices),
        priced,
    }
}

pub fn add(state: &mut AppState, id: &str) -> AppResult<CartLineResponse> {
    debug!(id, "cart add command");
    validate_product_id(id)?;

    let quantity = state.cart.add_item(id);
    Ok(line_response(state, id, quantity))
}

pub fn set(state: &mut AppState, id: &str, quantity: i64) -> AppResult<CartLineResponse> {
    debug!(id, quantity, "cart set command");
    validate_product_id(id)?;

    state.cart.set_quantity(id, quantity);
    let quantity = state.cart.quantity_of(id);
    Ok(line_response(state, id, quantity))
}

pub fn remove(state: &mut AppState, id: &str) -> AppResult<CartLineResponse> {
    debug!(id, "cart remove command");
    validate_product_id(id)?;

    state.cart.remove_item(id);
    Ok(line_response(state, id, 0))
}

pub fn clear(state: &mut AppState) -> CartResponse {
    debug!("cart clear command");
    state.cart.clear();

    CartResponse {
        lines: Vec::new(),
        total_quantity: 0,
        total: Money::zero(),
        priced: false,
    }
}

fn view(state: &AppState, line: CartLine) -> CartLineView {
    let product = state.catalog.get(line.product_id.as_str());

    CartLineView {
        name: product.as_ref().map(|p| p.name.clone()),
        unit_price: product.as_ref().map(|p| p.price),
        line_total: product.as_ref().map(|p| p.line_total(line.quantity)),
        id: line.product_id,
        quantity: line.quantity,
    }
}

fn line_response(state: &AppState, id: &str, quantity: i64) -> CartLineResponse {
    CartLineResponse {
        id: ProductId::from(id),
        quantity,
        total_quantity: state.cart.total_quantity(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use storefront_store::{CollectingSink, KeyValueSlot, MemorySlot};
    use storefront_sync::{MemoryCatalogBackend, RetryPolicy};

    fn state_over(
        slot: Arc<MemorySlot>,
        backend: Arc<MemoryCatalogBackend>,
        sink: Arc<CollectingSink>,
    ) -> AppState {
        AppState::new(
            backend,
            RetryPolicy::new(3, Duration::from_secs(2)),
            slot as Arc<dyn KeyValueSlot>,
            sink,
        )
    }

    fn backend() -> Arc<MemoryCatalogBackend> {
        Arc::new(MemoryCatalogBackend::with_records(vec![
            json!({"id": "A", "name": "Fan", "price": 10.0, "stock": 5, "category": "misc"}),
        ]))
    }

    #[tokio::test]
    async fn test_show_excludes_unknown_products_from_total() {
        let sink = Arc::new(CollectingSink::new());
        let mut state = state_over(Arc::new(MemorySlot::new()), backend(), sink);

        add(&mut state, "A").unwrap();
        add(&mut state, "A").unwrap();
        add(&mut state, "B").unwrap();

        let response = show(&state).await;
        assert!(response.priced);
        assert_eq!(response.total_quantity, 3);
        assert_eq!(response.total, Money::from_cents(2000));

        let b = response.lines.iter().find(|l| l.id.as_str() == "B").unwrap();
        assert!(b.name.is_none());
        assert!(b.line_total.is_none());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["total"], json!(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_without_catalog_is_unpriced() {
        let backend = backend();
        backend.fail_next(3);
        let sink = Arc::new(CollectingSink::new());
        let mut state = state_over(Arc::new(MemorySlot::new()), backend, Arc::clone(&sink));

        add(&mut state, "A").unwrap();
        let response = show(&state).await;

        assert!(!response.priced);
        assert_eq!(response.total, Money::zero());
        assert_eq!(response.lines.len(), 1);
        assert!(sink.titles().contains(&"Catalog unavailable".to_string()));
    }

    #[test]
    fn test_set_remove_clear_persist() {
        let slot = Arc::new(MemorySlot::new());
        let sink = Arc::new(CollectingSink::new());
        let mut state = state_over(Arc::clone(&slot), backend(), Arc::clone(&sink));

        add(&mut state, "A").unwrap();
        assert_eq!(set(&mut state, "A", 4).unwrap().quantity, 4);
        assert_eq!(set(&mut state, "B", 0).unwrap().quantity, 0);
        assert_eq!(set(&mut state, "D", 2).unwrap().quantity, 0);
        assert!(!state.cart.lines().iter().any(|l| l.product_id.as_str() == "D"));
        assert_eq!(remove(&mut state, "A").unwrap().total_quantity, 0);

        add(&mut state, "C").unwrap();
        let reloaded = state_over(Arc::clone(&slot), backend(), Arc::new(CollectingSink::new()));
        assert_eq!(reloaded.cart.quantity_of("C"), 1);

        clear(&mut state);
        assert!(state.cart.is_empty());
        assert!(sink.titles().contains(&"Cart emptied".to_string()));
    }

    #[test]
    fn test_blank_id_is_rejected() {
        let mut state = state_over(
            Arc::new(MemorySlot::new()),
            backend(),
            Arc::new(CollectingSink::new()),
        );
        assert_eq!(add(&mut state, "  ").unwrap_err().code, ErrorCode::ValidationError);
        assert!(state.cart.is_empty());
    }
}
