//! # Storefront CLI Entry Point
//!
//! ```text
//! storefront [--config FILE] [--catalog-file FILE] <catalog|cart|favorites|export> ...
//! ```
//!
//! Command output is printed as JSON on stdout. Failures are reported on
//! stderr and the process exits with status 1.

use anyhow::Context;
use clap::Parser;

use storefront_app::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    storefront_app::init_tracing();

    let output = storefront_app::run(cli)
        .await
        .context("storefront command failed")?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
