//! Cache Key Module
//!
//! Deterministic keys derived from normalized request parameters.

use std::fmt;

use serde::Serialize;

use crate::models::{ProductParams, SortOrder};

/// Key under which a request's result is cached.
///
/// Keys are created once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

/// Fields that identify a collection request, in serialization order.
///
/// `delay` is not part of the key.
#[derive(Serialize)]
struct CollectionKey<'a> {
    q: Option<&'a str>,
    category: Option<&'a str>,
    sort: Option<&'a str>,
    order: Option<SortOrder>,
    page: u32,
    limit: u32,
}

impl CacheKey {
    /// Key for a collection page.
    ///
    /// Absent fields serialize as `null`, so `{q: "x"}` and `{category: "x"}`
    /// never share a key.
    pub fn products(params: &ProductParams) -> Self {
        let key = CollectionKey {
            q: params.q.as_deref(),
            category: params.category.as_deref(),
            sort: params.sort.as_deref(),
            order: params.order,
            page: params.page,
            limit: params.limit,
        };
        // A struct of strings and integers always serializes.
        Self(serde_json::to_string(&key).unwrap_or_default())
    }

    /// Key for a single record fetched on its own.
    pub fn product(id: u64) -> Self {
        Self(format!("product{}", id))
    }

    /// Key for the category list.
    pub fn categories() -> Self {
        Self("categories".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
