//! Catalog Module
//!
//! The cache layer proper: a [`Catalog`] owns the stores and the fetch
//! executor and serves collections, single products and categories through
//! them.
//!
//! # Flow
//! - Collections: cache key from the parameters, store lookup, fetch with
//!   retry on a miss, write-through on success, stale value on failure
//! - Single product: cross-index over cached pages first, then its own store
//!   and a dedicated fetch
//! - Categories: one cached list

mod handle;
mod lookup;
mod read_through;
mod resolver;
mod upstream;

pub use handle::{LoadHandle, LoadState};
pub use lookup::{find_cached, find_in_pages};
pub use resolver::CollectionResolver;
pub use upstream::Upstream;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::cache::{
    shared, system_clock, CacheKey, CacheStats, MemoryStorage, PersistedStore, SharedClock,
    SharedStore, TtlStore,
};
use crate::config::{CacheBackend, Config};
use crate::error::{CatalogError, Resource, Result};
use crate::fetch::{AbortController, AbortSignal, FetchExecutor, ReqwestTransport, Transport};
use crate::models::{Category, Product, ProductPage, ProductParams};
use read_through::read_through;

/// Handle returned by [`Catalog::watch_products`].
pub type ProductsHandle = LoadHandle<ProductPage>;

pub struct Catalog {
    resolver: CollectionResolver,
    products: SharedStore<Product>,
    categories: SharedStore<Vec<Category>>,
    executor: FetchExecutor,
    upstream: Upstream,
    backend: CacheBackend,
    default_limit: u32,
}

impl Catalog {
    /// Creates a catalog talking to the real upstream over HTTP.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout())
            .map_err(|err| CatalogError::Internal(format!("failed to build HTTP client: {err}")))?;
        Self::with_transport(config, Arc::new(transport), system_clock())
    }

    /// Creates a catalog over any transport and clock.
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
        clock: SharedClock,
    ) -> Result<Self> {
        let upstream = Upstream::new(&config.upstream_url)?;
        let executor = FetchExecutor::new(transport, config.retry_policy());

        let collections: SharedStore<ProductPage> = match config.cache_backend {
            CacheBackend::Memory => shared(TtlStore::new(config.cache_ttl(), clock.clone())),
            CacheBackend::Session => shared(PersistedStore::new(
                MemoryStorage::with_quota(config.session_quota_bytes),
                config.session_namespace.clone(),
                config.session_cache_ttl(),
                clock.clone(),
            )),
        };
        info!(
            backend = ?config.cache_backend,
            upstream = %upstream.base(),
            "catalog initialized"
        );

        Ok(Self {
            resolver: CollectionResolver::new(collections, executor.clone(), upstream.clone()),
            products: shared(TtlStore::new(config.cache_ttl(), clock.clone())),
            categories: shared(TtlStore::new(config.cache_ttl(), clock)),
            executor,
            upstream,
            backend: config.cache_backend,
            default_limit: config.default_page_limit,
        })
    }

    /// Page size used when a request names none.
    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    /// Store of collection pages.
    pub fn collections(&self) -> &SharedStore<ProductPage> {
        self.resolver.store()
    }

    /// Store of individually fetched products.
    pub fn product_store(&self) -> &SharedStore<Product> {
        &self.products
    }

    pub fn category_store(&self) -> &SharedStore<Vec<Category>> {
        &self.categories
    }

    /// One page of products. `Ok(None)` means `signal` fired.
    pub async fn products(
        &self,
        params: &ProductParams,
        signal: &AbortSignal,
    ) -> Result<Option<ProductPage>> {
        self.resolver.resolve(params, signal).await
    }

    /// A single product, preferring any cached page that already holds it.
    pub async fn product(&self, id: u64, signal: &AbortSignal) -> Result<Option<Product>> {
        if let Some(product) =
            lookup::find_cached_id(id, std::slice::from_ref(self.collections())).await
        {
            debug!(id, "product served from a cached page");
            return Ok(Some(product));
        }

        let url = self.upstream.product_url(id)?;
        read_through(&self.products, &CacheKey::product(id), || {
            self.executor.fetch_json(&url, signal, Resource::Product)
        })
        .await
    }

    pub async fn categories(&self, signal: &AbortSignal) -> Result<Option<Vec<Category>>> {
        let url = self.upstream.categories_url()?;
        read_through(&self.categories, &CacheKey::categories(), || {
            self.executor.fetch_json(&url, signal, Resource::Categories)
        })
        .await
    }

    /// Cross-index lookup of `id` in the cached collection pages.
    pub async fn find_cached(&self, id: &str) -> Option<Product> {
        find_cached(id, std::slice::from_ref(self.collections())).await
    }

    /// Starts loading a page in the background.
    ///
    /// The handle starts in [`LoadState::Loading`] and moves to `Loaded` or
    /// `Failed` once. Dropping it cancels the load.
    pub fn watch_products(self: &Arc<Self>, params: ProductParams) -> ProductsHandle {
        let controller = AbortController::new();
        let signal = controller.signal();
        let (tx, rx) = watch::channel(LoadState::Loading);
        let catalog = Arc::clone(self);

        let task = tokio::spawn(async move {
            // Once per mount.
            catalog.cleanup().await;
            let outcome = catalog.products(&params, &signal).await;
            if signal.is_aborted() {
                debug!("products load cancelled");
                return;
            }
            match outcome {
                Ok(Some(page)) => {
                    tx.send_replace(LoadState::Loaded(page));
                }
                Ok(None) => debug!("products load cancelled"),
                Err(err) => {
                    tx.send_replace(LoadState::Failed(err.to_string()));
                }
            }
        });

        LoadHandle::new(rx, controller, task)
    }

    /// Sweeps expired and unreadable entries from the session-backed
    /// collection store. Returns how many were removed.
    ///
    /// In-memory stores are never swept: their expired entries stay until
    /// overwritten or cleared, and serve as the fallback when upstream fails.
    pub async fn cleanup(&self) -> usize {
        match self.backend {
            CacheBackend::Session => self.collections().write().await.purge_expired(),
            CacheBackend::Memory => 0,
        }
    }

    /// Empties every store.
    pub async fn clear(&self) {
        self.collections().write().await.clear();
        self.products.write().await.clear();
        self.categories.write().await.clear();
    }

    /// Statistics of the collection store.
    pub async fn stats(&self) -> CacheStats {
        self.collections().read().await.stats()
    }
}
