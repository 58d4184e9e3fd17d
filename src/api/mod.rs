//! API Module
//!
//! HTTP handlers and routing for the read-only catalog facade.
//!
//! # Endpoints
//! - `GET /api/products` - One page of products
//! - `GET /api/products/search` - Full-text search
//! - `GET /api/product/:id` - A single product
//! - `GET /api/categories` - Category list
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
