//! # Storefront CLI Library
//!
//! Argument parsing, startup and command dispatch for the `storefront`
//! binary. Kept in a library so the commands can be tested in-process.
//!
//! ## Module Organization
//! ```text
//! storefront_app/
//! ├── lib.rs          ◄─── You are here (Cli, startup, run)
//! ├── state.rs        ◄─── AppState: catalog, cart, favorites
//! ├── commands/
//! │   ├── mod.rs      ◄─── Command enum + dispatch
//! │   ├── catalog.rs  ◄─── list, show, search, categories, add, update, remove
//! │   ├── cart.rs     ◄─── show, add, set, remove, clear
//! │   ├── favorites.rs◄─── list, toggle
//! │   └── export.rs   ◄─── JSON/CSV export
//! └── error.rs        ◄─── AppError for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize Logging ── tracing-subscriber, RUST_LOG or the default  │
//! │  2. Load Config ───────── storefront.toml + STOREFRONT_* overrides     │
//! │  3. Build State ───────── backend, slots in the data dir, notices      │
//! │  4. Execute Command ───── result printed as JSON on stdout             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront_sync::StorefrontConfig;

use commands::Command;
use error::AppResult;
use state::AppState;

/// Storefront command-line client.
#[derive(Debug, Parser)]
#[command(name = "storefront", version, about)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Serve the catalog from a JSON array file instead of the backend
    #[arg(long, global = true)]
    pub catalog_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Runs one CLI invocation and returns what it printed.
pub async fn run(cli: Cli) -> AppResult<Value> {
    let config = StorefrontConfig::load(cli.config)?;
    info!(backend = config.backend_url(), "Configuration loaded");

    let mut state = AppState::from_config(&config, cli.catalog_file.as_deref())?;
    commands::execute(&mut state, cli.command).await
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=storefront_sync=trace` - Trace the catalog client only
/// - Default: INFO, DEBUG for the storefront crates
///
/// Logs go to stderr; stdout carries command output only.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
