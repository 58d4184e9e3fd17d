//! API Handlers
//!
//! HTTP request handlers for each facade endpoint. Parameter validation
//! happens here, before anything reaches the catalog.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::fetch::AbortSignal;
use crate::models::requests::INVALID_PRODUCT_ID;
use crate::models::{
    parse_product_id, Category, HealthResponse, Product, ProductPage, ProductQuery, StatsResponse,
};

/// `Cache-Control` sent with the category list.
pub const CATEGORIES_CACHE_CONTROL: &str = "public, max-age=300";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

impl AppState {
    /// Creates a new AppState around a catalog.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    /// Creates a new AppState from configuration, talking to the real upstream.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(Catalog::from_config(config)?))
    }
}

/// Server requests have no consumer that could go away mid-flight, so they
/// never abort; `None` from the catalog cannot happen here.
fn completed<T>(value: Option<T>) -> Result<T> {
    value.ok_or_else(|| CatalogError::Internal("request was cancelled".to_string()))
}

/// Handler for GET /api/products
pub async fn products_handler(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let params = query.into_params(state.catalog.default_limit())?;
    let page = state
        .catalog
        .products(&params, &AbortSignal::never())
        .await?;

    Ok(Json(completed(page)?))
}

/// Handler for GET /api/products/search
///
/// Same as the listing, but `q` is mandatory.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ProductPage>> {
    let params = query.into_search_params(state.catalog.default_limit())?;
    let page = state
        .catalog
        .products(&params, &AbortSignal::never())
        .await?;

    Ok(Json(completed(page)?))
}

/// Handler for GET /api/product/:id
pub async fn product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    let id = parse_product_id(&id)
        .ok_or_else(|| CatalogError::InvalidRequest(INVALID_PRODUCT_ID.to_string()))?;
    let product = state.catalog.product(id, &AbortSignal::never()).await?;

    Ok(Json(completed(product)?))
}

/// Handler for GET /api/categories
pub async fn categories_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let categories: Vec<Category> =
        completed(state.catalog.categories(&AbortSignal::never()).await?)?;

    Ok((
        [(header::CACHE_CONTROL, CATEGORIES_CACHE_CONTROL)],
        Json(categories),
    ))
}

/// Handler for GET /stats
///
/// Statistics of the collection cache.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.catalog.stats().await))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
