//! Error types for the catalog proxy
//!
//! Provides unified error handling using thiserror.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Resource ==
/// What a fetch was trying to load; only used to word failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Products,
    Product,
    Categories,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Resource::Products => "products",
            Resource::Product => "product",
            Resource::Categories => "categories",
        })
    }
}

// == Fetch Error ==
/// Terminal outcome of a fetch whose retries ran out.
///
/// Display strings are shown to end users verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// Upstream answered 429
    #[error("Too many requests. Please try again later.")]
    RateLimited,

    /// Any other non-success status, transport failure or undecodable body
    #[error("Failed to fetch {resource}.")]
    Failed { resource: Resource },
}

// == Catalog Error Enum ==
/// Unified error type for the catalog proxy.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Request rejected at the boundary before reaching the cache layer
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream fetch failed and no cached value could stand in
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CatalogError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CatalogError::Fetch(FetchError::RateLimited) => {
                (StatusCode::TOO_MANY_REQUESTS, self.to_string())
            }
            CatalogError::Fetch(FetchError::Failed { .. }) => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            CatalogError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the catalog proxy.
pub type Result<T> = std::result::Result<T, CatalogError>;
