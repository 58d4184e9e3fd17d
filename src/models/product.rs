//! Catalog domain models
//!
//! Shapes returned by the upstream catalog API and served back by the facade.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single catalog record.
///
/// Only the fields the proxy reasons about are typed; everything else the
/// upstream sends is kept in `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    /// Creates a bare product with just an id and title.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            price: None,
            discount_percentage: None,
            rating: None,
            stock: None,
            brand: None,
            category: None,
            thumbnail: None,
            images: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Sets the category slug.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Case-insensitive category comparison.
    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(category))
    }
}

/// One page of a product collection.
///
/// Upstream is offset based, so a page is described by `skip` and `limit`
/// rather than a page number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPage {
    #[serde(rename = "products", default)]
    pub items: Vec<Product>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

impl ProductPage {
    pub fn new(items: Vec<Product>, total: u64, skip: u64, limit: u64) -> Self {
        Self {
            items,
            total,
            skip,
            limit,
        }
    }

    /// Finds the first record with the given id.
    pub fn find(&self, id: u64) -> Option<&Product> {
        self.items.iter().find(|p| p.id == id)
    }

    /// Keeps only records in `category` and recomputes the page metadata
    /// over the filtered set.
    pub fn retain_category(&mut self, category: &str, skip: u64, limit: u64) {
        self.items.retain(|p| p.in_category(category));
        self.total = self.items.len() as u64;
        self.skip = skip;
        self.limit = limit;
    }
}

/// A product category as listed by `/products/categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub url: String,
}
