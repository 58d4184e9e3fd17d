//! Request DTOs for the catalog facade
//!
//! Raw query strings are accepted as text and validated here, so a bad
//! `page` produces our own 400 message instead of an extractor rejection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

/// Page size used when a request does not carry `limit`.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Message for non-positive or non-numeric `page`/`limit`.
pub const INVALID_PAGINATION: &str = "Invalid pagination parameters";

/// Message for an unsupported `order` value.
pub const INVALID_ORDER: &str = "Invalid sort order";

/// Message for a search without `q`.
pub const MISSING_QUERY: &str = "Query parameter 'q' is required";

/// Message for a non-numeric product id.
pub const INVALID_PRODUCT_ID: &str = "Invalid product ID";

// == Sort Order ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parses `asc`/`desc`, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Product Params ==
/// Normalized parameters of a collection request.
///
/// Every field except `delay` takes part in the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductParams {
    /// Free-text search
    pub q: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Upstream sort field, sent as `sortBy`
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Simulated latency in milliseconds before fetching
    pub delay: Option<u64>,
}

impl Default for ProductParams {
    fn default() -> Self {
        Self::with_limit(DEFAULT_PAGE_LIMIT)
    }
}

impl ProductParams {
    /// First page with the given page size and no filters.
    pub fn with_limit(limit: u32) -> Self {
        Self {
            q: None,
            category: None,
            sort: None,
            order: None,
            page: 1,
            limit,
            delay: None,
        }
    }

    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.q = normalize(Some(q.into()));
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = normalize(Some(category.into()));
        self
    }

    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = normalize(Some(field.into()));
        self.order = Some(order);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn delay_ms(mut self, delay: u64) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Upstream offset for this page.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

// == Product Query ==
/// Raw query string of `/api/products` and `/api/products/search`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub delay: Option<String>,
}

impl ProductQuery {
    /// Validates and normalizes the raw query.
    ///
    /// `page` and `limit` must be positive integers when present; `order`
    /// must be `asc` or `desc`. An unparsable `delay` is ignored.
    pub fn into_params(self, default_limit: u32) -> Result<ProductParams> {
        let page = parse_positive(self.page.as_deref())?.unwrap_or(1);
        let limit = parse_positive(self.limit.as_deref())?.unwrap_or(default_limit);

        let order = match normalize(self.order) {
            Some(raw) => Some(
                SortOrder::parse(&raw)
                    .ok_or_else(|| CatalogError::InvalidRequest(INVALID_ORDER.to_string()))?,
            ),
            None => None,
        };

        let delay = normalize(self.delay)
            .and_then(|d| d.parse::<u64>().ok())
            .filter(|d| *d > 0);

        Ok(ProductParams {
            q: normalize(self.q),
            category: normalize(self.category),
            sort: normalize(self.sort),
            order,
            page,
            limit,
            delay,
        })
    }

    /// Like [`ProductQuery::into_params`] but additionally requires `q`.
    pub fn into_search_params(self, default_limit: u32) -> Result<ProductParams> {
        let params = self.into_params(default_limit)?;
        if params.q.is_none() {
            return Err(CatalogError::InvalidRequest(MISSING_QUERY.to_string()));
        }
        Ok(params)
    }
}

/// Parses a product id the way the cross-index compares them.
pub fn parse_product_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

fn parse_positive(raw: Option<&str>) -> Result<Option<u32>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => match s.parse::<u32>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(CatalogError::InvalidRequest(INVALID_PAGINATION.to_string())),
        },
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ProductQuery {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::from(*v)))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let params = ProductQuery::default().into_params(DEFAULT_PAGE_LIMIT).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 10);
        assert_eq!(params.skip(), 0);
        assert!(params.order.is_none());
    }

    #[test]
    fn test_page_and_limit_map_to_skip() {
        let params = query(&[("page", "3"), ("limit", "20")])
            .into_params(DEFAULT_PAGE_LIMIT)
            .unwrap();
        assert_eq!(params.skip(), 40);
    }

    #[test]
    fn test_rejects_non_positive_page() {
        for bad in ["0", "-1", "abc", "1.5"] {
            let err = query(&[("page", bad)]).into_params(10).unwrap_err();
            assert!(
                matches!(err, CatalogError::InvalidRequest(ref m) if m == INVALID_PAGINATION),
                "page={} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_rejects_zero_limit() {
        let err = query(&[("limit", "0")]).into_params(10).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(_)));
    }

    #[test]
    fn test_order_validation() {
        let params = query(&[("order", "DESC")]).into_params(10).unwrap();
        assert_eq!(params.order, Some(SortOrder::Desc));

        let err = query(&[("order", "sideways")]).into_params(10).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(ref m) if m == INVALID_ORDER));
    }

    #[test]
    fn test_blank_values_are_absent() {
        let params = query(&[("q", "  "), ("category", "")]).into_params(10).unwrap();
        assert!(params.q.is_none());
        assert!(params.category.is_none());
    }

    #[test]
    fn test_invalid_delay_is_ignored() {
        let params = query(&[("delay", "soon")]).into_params(10).unwrap();
        assert!(params.delay.is_none());
    }

    #[test]
    fn test_search_requires_query() {
        let err = ProductQuery::default().into_search_params(10).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(ref m) if m == MISSING_QUERY));
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id(" 12 "), Some(12));
        assert_eq!(parse_product_id("abc"), None);
        assert_eq!(parse_product_id("-3"), None);
    }
}
