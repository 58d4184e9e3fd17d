//! Request and Response models for the catalog facade
//!
//! Catalog records, validated request parameters and the facade's own
//! response bodies.

pub mod product;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use product::{Category, Product, ProductPage};
pub use requests::{
    parse_product_id, ProductParams, ProductQuery, SortOrder, DEFAULT_PAGE_LIMIT,
};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
