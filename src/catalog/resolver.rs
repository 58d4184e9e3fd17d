//! Collection Resolver
//!
//! Turns a [`ProductParams`] into a cached [`ProductPage`]: picks the
//! upstream endpoint, maps pagination, and wraps the fetch executor with
//! read-through caching and stale-on-error fallback.

use std::time::Duration;

use tracing::debug;

use crate::cache::{CacheKey, SharedStore};
use crate::catalog::read_through::read_through;
use crate::catalog::Upstream;
use crate::error::{Resource, Result};
use crate::fetch::{AbortSignal, FetchExecutor};
use crate::models::{ProductPage, ProductParams};

#[derive(Clone)]
pub struct CollectionResolver {
    store: SharedStore<ProductPage>,
    executor: FetchExecutor,
    upstream: Upstream,
}

impl CollectionResolver {
    pub fn new(store: SharedStore<ProductPage>, executor: FetchExecutor, upstream: Upstream) -> Self {
        Self {
            store,
            executor,
            upstream,
        }
    }

    pub fn store(&self) -> &SharedStore<ProductPage> {
        &self.store
    }

    /// Resolves one page of products.
    ///
    /// Returns `Ok(None)` when `signal` fires before the page is available;
    /// the cache is not touched in that case.
    ///
    /// When both `q` and `category` are set, the search endpoint is queried
    /// and its page is narrowed to `category` locally, so `total` counts the
    /// filtered records only.
    pub async fn resolve(
        &self,
        params: &ProductParams,
        signal: &AbortSignal,
    ) -> Result<Option<ProductPage>> {
        let key = CacheKey::products(params);
        let url = self.upstream.products_url(params)?;

        read_through(&self.store, &key, || async {
            if let Some(delay) = params.delay {
                if !simulate_latency(Duration::from_millis(delay), signal).await {
                    return Ok(None);
                }
            }

            self.executor
                .fetch_json::<ProductPage>(&url, signal, Resource::Products)
                .await
                .map(|page| page.map(|page| narrow(page, params)))
        })
        .await
    }
}

/// Applies the local category filter of a search-plus-category request.
fn narrow(mut page: ProductPage, params: &ProductParams) -> ProductPage {
    if let (Some(_), Some(category)) = (&params.q, &params.category) {
        let upstream_total = page.total;
        page.retain_category(category, params.skip(), u64::from(params.limit));
        debug!(
            category = %category,
            upstream_total,
            total = page.total,
            "search results filtered by category"
        );
    }
    page
}

/// Sleeps for `delay` unless `signal` fires first. Returns `false` if aborted.
async fn simulate_latency(delay: Duration, signal: &AbortSignal) -> bool {
    tokio::select! {
        biased;
        _ = signal.aborted() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{shared, ManualClock, TtlStore, CACHE_DURATION};
    use crate::error::{CatalogError, FetchError};
    use crate::fetch::{AbortController, RetryPolicy};
    use crate::models::{Product, SortOrder};
    use crate::testing::ScriptedTransport;
    use serde_json::json;
    use std::sync::Arc;

    struct Fixture {
        clock: ManualClock,
        transport: Arc<ScriptedTransport>,
        resolver: CollectionResolver,
    }

    fn fixture(transport: ScriptedTransport) -> Fixture {
        let clock = ManualClock::new(1_700_000_000_000);
        let transport = Arc::new(transport);
        let store = shared(TtlStore::new(CACHE_DURATION, Arc::new(clock.clone())));
        let executor = FetchExecutor::new(transport.clone(), RetryPolicy::default());
        let upstream = Upstream::new("https://upstream.test").unwrap();
        Fixture {
            clock,
            transport,
            resolver: CollectionResolver::new(store, executor, upstream),
        }
    }

    fn page_body(ids: &[u64]) -> serde_json::Value {
        let products: Vec<_> = ids
            .iter()
            .map(|id| json!({"id": id, "title": format!("Product {id}")}))
            .collect();
        json!({"products": products, "total": 100, "skip": 0, "limit": 10})
    }

    fn ids(page: &ProductPage) -> Vec<u64> {
        page.items.iter().map(|p| p.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_resolve_within_ttl_is_cached() {
        let fx = fixture(ScriptedTransport::new().push_json(200, &page_body(&[1, 2])));
        let params = ProductParams::default();
        let never = AbortSignal::never();

        let first = fx.resolver.resolve(&params, &never).await.unwrap();
        fx.clock.advance(Duration::from_secs(60));
        let second = fx.resolver.resolve(&params, &never).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(ids(&first.unwrap()), vec![1, 2]);
        assert_eq!(fx.transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_six_minutes() {
        let fx = fixture(
            ScriptedTransport::new()
                .push_json(200, &page_body(&[1]))
                .push_json(200, &page_body(&[2])),
        );
        let params = ProductParams::default();
        let never = AbortSignal::never();

        let first = fx.resolver.resolve(&params, &never).await.unwrap().unwrap();
        fx.clock.advance(Duration::from_secs(6 * 60));
        let second = fx.resolver.resolve(&params, &never).await.unwrap().unwrap();

        assert_eq!(fx.transport.calls(), 2);
        assert_eq!(ids(&first), vec![1]);
        assert_eq!(ids(&second), vec![2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_within_retry_budget() {
        let fx = fixture(
            ScriptedTransport::new()
                .push_status(500)
                .push_status(502)
                .push_json(200, &page_body(&[9])),
        );

        let page = fx
            .resolver
            .resolve(&ProductParams::default(), &AbortSignal::never())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ids(&page), vec![9]);
        assert_eq!(fx.transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_without_cache() {
        let fx = fixture(ScriptedTransport::new().with_fallback(500, ""));

        let err = fx
            .resolver
            .resolve(&ProductParams::default(), &AbortSignal::never())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch products.");
        assert_eq!(fx.transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_rate_limited() {
        let fx = fixture(ScriptedTransport::new().with_fallback(429, ""));

        let err = fx
            .resolver
            .resolve(&ProductParams::default(), &AbortSignal::never())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Fetch(FetchError::RateLimited)));
        assert_eq!(err.to_string(), "Too many requests. Please try again later.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_falls_back_to_cached_page() {
        let fx = fixture(
            ScriptedTransport::new()
                .push_json(200, &page_body(&[5, 6]))
                .with_fallback(503, ""),
        );
        let params = ProductParams::default().page(2);
        let never = AbortSignal::never();

        let cached = fx.resolver.resolve(&params, &never).await.unwrap();
        fx.clock.advance(Duration::from_secs(10 * 60));
        let fallback = fx.resolver.resolve(&params, &never).await.unwrap();

        assert_eq!(fallback, cached);
        assert_eq!(fx.transport.calls(), 1 + 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_with_category_filters_locally() {
        let body = json!({
            "products": [
                {"id": 1, "title": "iPhone", "category": "smartphones"},
                {"id": 2, "title": "Phone case", "category": "mobile-accessories"},
                {"id": 3, "title": "Galaxy", "category": "Smartphones"},
            ],
            "total": 57,
            "skip": 10,
            "limit": 10
        });
        let fx = fixture(ScriptedTransport::new().push_json(200, &body));
        let params = ProductParams::default()
            .query("phone")
            .category("smartphones")
            .page(2);

        let page = fx
            .resolver
            .resolve(&params, &AbortSignal::never())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ids(&page), vec![1, 3]);
        assert_eq!(page.total, 2);
        assert_eq!(page.skip, 10);
        assert_eq!(page.limit, 10);
        assert_eq!(
            fx.transport.requests(),
            vec!["https://upstream.test/products/search?limit=10&skip=10&q=phone".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_only_is_not_filtered_locally() {
        let body = json!({
            "products": [{"id": 4, "title": "Lamp", "category": "lighting"}],
            "total": 30,
            "skip": 0,
            "limit": 10
        });
        let fx = fixture(ScriptedTransport::new().push_json(200, &body));
        let params = ProductParams::default()
            .category("furniture")
            .sort("title", SortOrder::Asc);

        let page = fx
            .resolver
            .resolve(&params, &AbortSignal::never())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(page.total, 30);
        assert_eq!(
            fx.transport.requests(),
            vec![
                "https://upstream.test/products/category/furniture?limit=10&skip=0&sortBy=title&order=asc"
                    .to_string()
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_params_do_not_share_entries() {
        let fx = fixture(
            ScriptedTransport::new()
                .push_json(200, &page_body(&[1]))
                .push_json(200, &page_body(&[2])),
        );
        let never = AbortSignal::never();

        let limit_10 = fx
            .resolver
            .resolve(&ProductParams::default(), &never)
            .await
            .unwrap();
        let limit_20 = fx
            .resolver
            .resolve(&ProductParams::with_limit(20), &never)
            .await
            .unwrap();

        assert_ne!(limit_10, limit_20);
        assert_eq!(fx.transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_not_part_of_the_key() {
        let fx = fixture(ScriptedTransport::new().push_json(200, &page_body(&[1])));
        let never = AbortSignal::never();

        let started = tokio::time::Instant::now();
        let slow = fx
            .resolver
            .resolve(&ProductParams::default().delay_ms(2000), &never)
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(2000));

        let fast = fx
            .resolver
            .resolve(&ProductParams::default(), &never)
            .await
            .unwrap();

        assert_eq!(slow, fast);
        assert_eq!(fx.transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_during_delay_skips_fetch_and_cache() {
        let fx = fixture(ScriptedTransport::new().push_json(200, &page_body(&[1])));
        let controller = AbortController::new();
        let params = ProductParams::default().delay_ms(5000);

        let resolver = fx.resolver.clone();
        let signal = controller.signal();
        let task = tokio::spawn(async move { resolver.resolve(&params, &signal).await });

        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.abort();

        assert!(task.await.unwrap().unwrap().is_none());
        assert_eq!(fx.transport.calls(), 0);
        assert!(fx.resolver.store().read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_mid_retry_keeps_cache_and_error_silent() {
        let fx = fixture(ScriptedTransport::new().with_fallback(500, ""));
        let controller = AbortController::new();

        let resolver = fx.resolver.clone();
        let signal = controller.signal();
        let task = tokio::spawn(async move {
            resolver
                .resolve(&ProductParams::default(), &signal)
                .await
        });

        tokio::time::sleep(Duration::from_millis(2500)).await;
        controller.abort();

        assert!(task.await.unwrap().unwrap().is_none());
        assert!(fx.resolver.store().read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_identical_requests_both_fetch() {
        let fx = fixture(
            ScriptedTransport::new()
                .push_json(200, &page_body(&[1]))
                .push_json(200, &page_body(&[1])),
        );
        let never = AbortSignal::never();
        let params = ProductParams::default().delay_ms(10);

        let (a, b) = tokio::join!(
            fx.resolver.resolve(&params, &never),
            fx.resolver.resolve(&params, &never)
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(fx.transport.calls(), 2);
        let cached: Option<ProductPage> = fx
            .resolver
            .store()
            .write()
            .await
            .get(CacheKey::products(&params).as_str());
        assert_eq!(cached.map(|p| p.items), Some(vec![Product::new(1, "Product 1")]));
    }
}
