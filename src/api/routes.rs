//! API Routes
//!
//! Configures the Axum router with all facade endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    categories_handler, health_handler, product_handler, products_handler, search_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/products` - One page of products
/// - `GET /api/products/search` - Full-text search, `q` required
/// - `GET /api/product/:id` - A single product
/// - `GET /api/categories` - Category list
/// - `GET /stats` - Collection cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/products", get(products_handler))
        .route("/api/products/search", get(search_handler))
        .route("/api/product/:id", get(product_handler))
        .route("/api/categories", get(categories_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
