//! Upstream endpoint and query-parameter conventions.

use reqwest::Url;
use tracing::debug;

use crate::error::{CatalogError, Result};
use crate::models::ProductParams;

/// Base URL of a DummyJSON-compatible catalog API.
#[derive(Debug, Clone)]
pub struct Upstream {
    base: Url,
}

impl Upstream {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base)
            .map_err(|err| CatalogError::Internal(format!("invalid upstream URL {base}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(CatalogError::Internal(format!(
                "upstream URL cannot be a base: {base}"
            )));
        }
        Ok(Self { base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Collection URL for `params`.
    ///
    /// `q` selects the search endpoint, otherwise `category` selects the
    /// category endpoint, otherwise the plain listing. The category is only
    /// ever part of the path, never a query parameter.
    pub fn products_url(&self, params: &ProductParams) -> Result<Url> {
        let mut url = match (&params.q, &params.category) {
            (Some(_), _) => self.endpoint(&["products", "search"])?,
            (None, Some(category)) => self.endpoint(&["products", "category", category.as_str()])?,
            (None, None) => self.endpoint(&["products"])?,
        };

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("limit", &params.limit.to_string())
                .append_pair("skip", &params.skip().to_string());
            if let Some(q) = &params.q {
                query.append_pair("q", q);
            }
            if let Some(sort) = &params.sort {
                query.append_pair("sortBy", sort);
            }
            if let Some(order) = params.order {
                query.append_pair("order", order.as_str());
            }
        }

        debug!(%url, "collection endpoint selected");
        Ok(url)
    }

    pub fn product_url(&self, id: u64) -> Result<Url> {
        self.endpoint(&["products", id.to_string().as_str()])
    }

    pub fn categories_url(&self) -> Result<Url> {
        self.endpoint(&["products", "categories"])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| CatalogError::Internal(format!("upstream URL cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
