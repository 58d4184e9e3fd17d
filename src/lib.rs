//! Catalog Proxy - a read-through caching proxy for a product catalog API
//!
//! Serves collections, single products and categories from TTL caches,
//! retrying failed upstream fetches and falling back to stale data when
//! retries run out.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod tasks;
#[doc(hidden)]
pub mod testing;

pub use api::{create_router, AppState};
pub use catalog::{Catalog, LoadState, ProductsHandle};
pub use config::Config;
pub use error::{CatalogError, FetchError, Result};
pub use tasks::spawn_cleanup_task;
