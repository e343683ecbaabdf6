//! # Catalog Search
//!
//! Filtering and ordering of a product list, as used by the search box and
//! the category pages.
//!
//! ```text
//! products ──► category filter ──► text filter ──► sort ──► results
//!              (exact, no case)    (substring in           (stable)
//!                                   name/description/
//!                                   category, no case)
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Product;
use crate::validation::{validate_search_query, ValidationResult};

// =============================================================================
// Sort Order
// =============================================================================

/// Ordering applied to search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum SortOrder {
    /// Backend order.
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    NameAsc,
    StockAsc,
    StockDesc,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "featured" => Ok(SortOrder::Featured),
            "price-asc" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            "name-asc" => Ok(SortOrder::NameAsc),
            "stock-asc" => Ok(SortOrder::StockAsc),
            "stock-desc" => Ok(SortOrder::StockDesc),
            other => Err(ValidationError::InvalidFormat {
                field: "sort".to_string(),
                reason: format!("unknown sort order '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Query
// =============================================================================

/// A catalog query: optional free text, optional category, ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub text: String,
    pub category: Option<String>,
    pub sort: SortOrder,
}

impl CatalogQuery {
    pub fn text(text: impl Into<String>) -> Self {
        CatalogQuery {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn sorted_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Runs the query over `products`, returning matches in result order.
    pub fn apply<'a>(&self, products: &'a [Product]) -> ValidationResult<Vec<&'a Product>> {
        let needle = validate_search_query(&self.text)?;

        let mut results: Vec<&Product> = products
            .iter()
            .filter(|p| match &self.category {
                Some(category) => in_category(p, category),
                None => true,
            })
            .filter(|p| matches_text(p, &needle))
            .collect();

        sort_products(&mut results, self.sort);
        Ok(results)
    }
}

// =============================================================================
// Predicates
// =============================================================================

/// Case-insensitive substring match over name, description and category.
///
/// `needle` must already be trimmed and lowercased; an empty needle matches
/// every product.
pub fn matches_text(product: &Product, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }

    product.name.to_lowercase().contains(needle)
        || product.description.to_lowercase().contains(needle)
        || product.category.to_lowercase().contains(needle)
}

/// Whole-name category match, ignoring case and surrounding whitespace.
pub fn in_category(product: &Product, category: &str) -> bool {
    product.category.trim().to_lowercase() == category.trim().to_lowercase()
}

/// Free-text search in backend order.
pub fn search<'a>(products: &'a [Product], query: &str) -> ValidationResult<Vec<&'a Product>> {
    CatalogQuery::text(query).apply(products)
}

/// Products of one category in backend order.
pub fn by_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| in_category(p, category)).collect()
}

fn sort_products(products: &mut [&Product], order: SortOrder) {
    match order {
        SortOrder::Featured => {}
        SortOrder::PriceAsc => products.sort_by_key(|p| p.price),
        SortOrder::PriceDesc => products.sort_by_key(|p| std::cmp::Reverse(p.price)),
        SortOrder::NameAsc => products.sort_by_key(|p| p.name.to_lowercase()),
        SortOrder::StockAsc => products.sort_by_key(|p| p.stock),
        SortOrder::StockDesc => products.sort_by_key(|p| std::cmp::Reverse(p.stock)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{NewProduct, ProductId};

    fn product(id: &str, name: &str, category: &str, cents: i64, stock: i64) -> Product {
        NewProduct::new(name, format!("{} description", name), Money::from_cents(cents), category)
            .with_stock(stock)
            .into_product(ProductId::from(id))
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Lavarropas Drean", "lavarropas", 58550, 4),
            product("2", "Notebook Lenovo", "notebooks", 62000, 2),
            product("3", "Ventilador de pie", "ventiladores", 3525, 10),
        ]
    }

    #[test]
    fn test_search_is_case_insensitive_and_trimmed() {
        let products = catalog();
        let results = search(&products, "  LENOVO ").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id.as_str(), "2");
    }

    #[test]
    fn test_search_matches_category_and_description() {
        let products = catalog();
        assert_eq!(search(&products, "ventiladores").unwrap().len(), 1);
        assert_eq!(search(&products, "description").unwrap().len(), 3);
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let products = catalog();
        assert_eq!(search(&products, "   ").unwrap().len(), 3);
    }

    #[test]
    fn test_by_category() {
        let products = catalog();
        let results = by_category(&products, "Notebooks");
        assert_eq!(results.len(), 1);
        assert!(by_category(&products, "note").is_empty());
    }

    #[test]
    fn test_query_sorting() {
        let products = catalog();
        let results = CatalogQuery::default()
            .sorted_by(SortOrder::PriceAsc)
            .apply(&products)
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);

        let results = CatalogQuery::default()
            .sorted_by(SortOrder::StockDesc)
            .apply(&products)
            .unwrap();
        assert_eq!(results[0].id.as_str(), "3");
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("price-desc".parse::<SortOrder>().unwrap(), SortOrder::PriceDesc);
        assert!("cheapest".parse::<SortOrder>().is_err());
    }
}
