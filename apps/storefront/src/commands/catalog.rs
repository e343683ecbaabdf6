//! # Catalog Commands
//!
//! Read commands refresh the catalog first and fail with `REMOTE_ERROR` when
//! the backend stays unavailable. Edit commands validate locally, call the
//! backend once, then patch the local copy.

use clap::{Args, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use storefront_core::search::{CatalogQuery, SortOrder};
use storefront_core::{Money, NewProduct, Product, ProductId, ProductPatch, PLACEHOLDER_IMAGE};

use super::to_output;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// List products, optionally filtered by category
    List {
        #[arg(long)]
        category: Option<String>,

        /// featured, price-asc, price-desc, name-asc, stock-asc, stock-desc
        #[arg(long, default_value = "featured")]
        sort: SortOrder,
    },

    /// Show one product, fetched fresh from the backend
    Show { id: String },

    /// Search name, description and category
    Search {
        query: String,

        #[arg(long, default_value = "featured")]
        sort: SortOrder,
    },

    /// List distinct category names
    Categories,

    /// Create a product
    Add(NewProductArgs),

    /// Change fields of a product
    Update(UpdateProductArgs),

    /// Delete a product
    Remove { id: String },
}

#[derive(Debug, Args)]
pub struct NewProductArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub description: String,

    /// Decimal price, e.g. 35.25
    #[arg(long)]
    pub price: f64,

    #[arg(long, default_value_t = 0)]
    pub stock: i64,

    #[arg(long)]
    pub category: String,

    #[arg(long, default_value = PLACEHOLDER_IMAGE)]
    pub image: String,
}

#[derive(Debug, Args)]
pub struct UpdateProductArgs {
    pub id: String,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub price: Option<f64>,

    #[arg(long)]
    pub stock: Option<i64>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovedResponse {
    pub id: ProductId,
}

pub async fn run(state: &mut AppState, command: CatalogCommand) -> AppResult<Value> {
    match command {
        CatalogCommand::List { category, sort } => to_output(list(state, category, sort).await?),
        CatalogCommand::Show { id } => to_output(show(state, &id).await?),
        CatalogCommand::Search { query, sort } => to_output(search(state, &query, sort).await?),
        CatalogCommand::Categories => to_output(categories(state).await?),
        CatalogCommand::Add(args) => to_output(add(state, args).await?),
        CatalogCommand::Update(args) => to_output(update(state, args).await?),
        CatalogCommand::Remove { id } => to_output(remove(state, &id).await?),
    }
}

pub async fn list(
    state: &AppState,
    category: Option<String>,
    sort: SortOrder,
) -> AppResult<Vec<Product>> {
    debug!(?category, ?sort, "catalog list command");
    state.catalog.refresh().await?;

    let mut query = CatalogQuery::default().sorted_by(sort);
    if let Some(category) = category {
        query = query.in_category(category);
    }
    Ok(state.catalog.query(&query)?)
}

pub async fn show(state: &AppState, id: &str) -> AppResult<Product> {
    debug!(id, "catalog show command");
    Ok(state.catalog.fetch(&ProductId::from(id)).await?)
}

pub async fn search(state: &AppState, text: &str, sort: SortOrder) -> AppResult<Vec<Product>> {
    debug!(text, ?sort, "catalog search command");
    state.catalog.refresh().await?;
    Ok(state
        .catalog
        .query(&CatalogQuery::text(text).sorted_by(sort))?)
}

pub async fn categories(state: &AppState) -> AppResult<Vec<String>> {
    state.catalog.refresh().await?;
    Ok(state.catalog.categories())
}

pub async fn add(state: &AppState, args: NewProductArgs) -> AppResult<Product> {
    debug!(name = %args.name, "catalog add command");
    let price = parse_price(args.price)?;

    let product = NewProduct::new(args.name, args.description, price, args.category)
        .with_stock(args.stock)
        .with_image(args.image);

    Ok(state.catalog.create(product).await?)
}

pub async fn update(state: &AppState, args: UpdateProductArgs) -> AppResult<Product> {
    debug!(id = %args.id, "catalog update command");
    let patch = ProductPatch {
        name: args.name,
        description: args.description,
        price: args.price.map(parse_price).transpose()?,
        stock: args.stock,
        category: args.category,
        image: args.image,
    };

    Ok(state
        .catalog
        .update(&ProductId::from(args.id), patch)
        .await?)
}

pub async fn remove(state: &AppState, id: &str) -> AppResult<RemovedResponse> {
    debug!(id, "catalog remove command");
    let id = ProductId::from(id);
    state.catalog.delete(&id).await?;
    Ok(RemovedResponse { id })
}

fn parse_price(amount: f64) -> AppResult<Money> {
    Money::from_decimal(amount)
        .ok_or_else(|| AppError::validation(format!("Invalid price: {}", amount)))
}
