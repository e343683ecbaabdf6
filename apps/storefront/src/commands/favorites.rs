//! # Favorites Commands

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use storefront_core::validation::validate_product_id;
use storefront_core::ProductId;

use super::to_output;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List favorite product ids
    List,

    /// Add a product to favorites, or remove it if already there
    Toggle { id: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesResponse {
    pub ids: Vec<ProductId>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub id: ProductId,
    pub favorite: bool,
}

pub async fn run(state: &mut AppState, command: FavoritesCommand) -> AppResult<Value> {
    match command {
        FavoritesCommand::List => to_output(list(state)),
        FavoritesCommand::Toggle { id } => to_output(toggle(state, &id)?),
    }
}

pub fn list(state: &AppState) -> FavoritesResponse {
    FavoritesResponse {
        ids: state.favorites.ids(),
        count: state.favorites.count(),
    }
}

pub fn toggle(state: &mut AppState, id: &str) -> AppResult<ToggleResponse> {
    debug!(id, "favorites toggle command");
    validate_product_id(id)?;

    let favorite = state.favorites.toggle(id);
    Ok(ToggleResponse {
        id: ProductId::from(id),
        favorite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use storefront_store::{MemorySlot, NoOpSink};
    use storefront_sync::{MemoryCatalogBackend, RetryPolicy};

    fn state(slot: &MemorySlot) -> AppState {
        AppState::new(
            Arc::new(MemoryCatalogBackend::new()),
            RetryPolicy::default(),
            Arc::new(slot.clone()),
            Arc::new(NoOpSink),
        )
    }

    #[test]
    fn test_toggle_twice_restores() {
        let slot = MemorySlot::new();
        let mut state = state(&slot);

        assert!(toggle(&mut state, "p1").unwrap().favorite);
        assert_eq!(list(&state).count, 1);

        assert!(!toggle(&mut state, "p1").unwrap().favorite);
        assert_eq!(list(&state).count, 0);
    }

    #[test]
    fn test_favorites_survive_reload() {
        let slot = MemorySlot::new();
        let mut first = state(&slot);
        toggle(&mut first, "p2").unwrap();

        let second = state(&slot);
        assert_eq!(list(&second).ids, vec![ProductId::from("p2")]);
    }
}
