//! # Commands Module
//!
//! One submodule per top-level subcommand.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (dispatch)
//! ├── catalog.rs    ◄─── Browse and edit the remote catalog
//! ├── cart.rs       ◄─── Cart manipulation
//! ├── favorites.rs  ◄─── Favorites list
//! └── export.rs     ◄─── Snapshot export to JSON/CSV
//! ```
//!
//! ## How Commands Work
//! ```text
//! storefront cart add p1
//!         │
//!         ▼
//! Command::Cart(CartCommand::Add { id })
//!         │
//!         ▼
//! cart::add(&mut state, "p1") ──► AppResult<CartLineResponse>
//!         │
//!         ▼
//! serde_json::to_value ──► printed on stdout
//! ```
//!
//! Each command returns a serializable response; `AppError` on failure.

pub mod cart;
pub mod catalog;
pub mod export;
pub mod favorites;

use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppResult;
use crate::state::AppState;

pub use cart::CartCommand;
pub use catalog::CatalogCommand;
pub use export::ExportArgs;
pub use favorites::FavoritesCommand;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse and edit the product catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Inspect and change the cart
    #[command(subcommand)]
    Cart(CartCommand),

    /// Inspect and change the favorites list
    #[command(subcommand)]
    Favorites(FavoritesCommand),

    /// Export a data snapshot to JSON or CSV
    Export(ExportArgs),
}

/// Runs one command against `state`.
pub async fn execute(state: &mut AppState, command: Command) -> AppResult<Value> {
    match command {
        Command::Catalog(cmd) => catalog::run(state, cmd).await,
        Command::Cart(cmd) => cart::run(state, cmd).await,
        Command::Favorites(cmd) => favorites::run(state, cmd).await,
        Command::Export(args) => export::run(state, args).await,
    }
}

pub(crate) fn to_output<T: Serialize>(response: T) -> AppResult<Value> {
    Ok(serde_json::to_value(response)?)
}
