//! Fetch-with-retry executor.
//!
//! Performs one logical GET with a bounded number of retries and a fixed
//! backoff, and gives up immediately and silently when its signal fires.
//! It knows nothing about caching; callers wrap it.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{FetchError, Resource};
use crate::fetch::{AbortSignal, Transport};

/// Retries after the first attempt.
pub const DEFAULT_RETRIES: u32 = 3;

/// Wait between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `retries + 1`
    pub retries: u32,
    /// Fixed delay before each retry
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

#[derive(Clone)]
pub struct FetchExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl FetchExecutor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetches `url` and decodes the JSON body as `T`.
    ///
    /// Returns `Ok(None)` when `signal` fires at any point: before an
    /// attempt, while a request is in flight, after a failure or during the
    /// backoff. The error after the last attempt reflects that attempt:
    /// 429 becomes [`FetchError::RateLimited`], anything else
    /// [`FetchError::Failed`].
    pub async fn fetch_json<T>(
        &self,
        url: &Url,
        signal: &AbortSignal,
        resource: Resource,
    ) -> Result<Option<T>, FetchError>
    where
        T: DeserializeOwned,
    {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 0;

        loop {
            if signal.is_aborted() {
                debug!(%url, "fetch aborted");
                return Ok(None);
            }
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = signal.aborted() => {
                    debug!(%url, attempt, "fetch aborted in flight");
                    return Ok(None);
                }
                outcome = self.attempt::<T>(url, resource) => outcome,
            };

            let err = match outcome {
                Ok(value) => return Ok(Some(value)),
                Err(err) => err,
            };

            // Cancellation wins over retrying.
            if signal.is_aborted() {
                debug!(%url, "fetch aborted");
                return Ok(None);
            }

            let attempts_left = max_attempts.saturating_sub(attempt);
            if attempts_left == 0 {
                warn!(%url, attempts = attempt, error = %err, "fetch failed, giving up");
                return Err(err);
            }

            warn!(
                %url,
                error = %err,
                "Fetch failed, retrying... ({} attempts left)",
                attempts_left
            );

            tokio::select! {
                biased;
                _ = signal.aborted() => {
                    debug!(%url, "fetch aborted during backoff");
                    return Ok(None);
                }
                _ = tokio::time::sleep(self.policy.delay) => {}
            }
        }
    }

    /// One GET, with the status interpreted.
    async fn attempt<T>(&self, url: &Url, resource: Resource) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
    {
        let response = self.transport.get(url).await.map_err(|err| {
            debug!(%url, error = %err, "transport error");
            FetchError::Failed { resource }
        })?;

        if response.status == 429 {
            return Err(FetchError::RateLimited);
        }
        if !response.is_success() {
            debug!(%url, status = response.status, "non-success status");
            return Err(FetchError::Failed { resource });
        }

        serde_json::from_str(&response.body).map_err(|err| {
            warn!(%url, error = %err, "undecodable response body");
            FetchError::Failed { resource }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::AbortController;
    use crate::testing::ScriptedTransport;
    use serde_json::json;

    fn url() -> Url {
        Url::parse("https://upstream.test/products").unwrap()
    }

    fn executor(transport: &Arc<ScriptedTransport>) -> FetchExecutor {
        FetchExecutor::new(transport.clone(), RetryPolicy::default())
    }

    #[test]
    fn test_max_attempts_saturates() {
        assert_eq!(RetryPolicy::default().max_attempts(), 4);

        let policy = RetryPolicy {
            retries: u32::MAX,
            delay: Duration::ZERO,
        };
        assert_eq!(policy.max_attempts(), u32::MAX);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let transport = Arc::new(ScriptedTransport::new().push_json(200, &json!({"ok": true})));

        let value: Option<serde_json::Value> = executor(&transport)
            .fetch_json(&url(), &AbortSignal::never(), Resource::Products)
            .await
            .unwrap();

        assert_eq!(value, Some(json!({"ok": true})));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_within_retry_budget() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .push_status(500)
                .push_network_error()
                .push_json(200, &json!([1, 2, 3])),
        );

        let started = tokio::time::Instant::now();
        let value: Option<Vec<u32>> = executor(&transport)
            .fetch_json(&url(), &AbortSignal::never(), Resource::Products)
            .await
            .unwrap();

        assert_eq!(value, Some(vec![1, 2, 3]));
        assert_eq!(transport.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_four_attempts() {
        let transport = Arc::new(ScriptedTransport::new().with_fallback(500, "oops"));

        let err = executor(&transport)
            .fetch_json::<serde_json::Value>(&url(), &AbortSignal::never(), Resource::Products)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch products.");
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_uses_same_budget() {
        let transport = Arc::new(ScriptedTransport::new().with_fallback(429, ""));

        let err = executor(&transport)
            .fetch_json::<serde_json::Value>(&url(), &AbortSignal::never(), Resource::Products)
            .await
            .unwrap_err();

        assert_eq!(err, FetchError::RateLimited);
        assert_eq!(err.to_string(), "Too many requests. Please try again later.");
        assert_eq!(transport.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_attempt_decides_the_message() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .push_status(429)
                .push_status(429)
                .push_status(429)
                .push_status(503),
        );

        let err = executor(&transport)
            .fetch_json::<serde_json::Value>(&url(), &AbortSignal::never(), Resource::Categories)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to fetch categories.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_body_is_retried() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .push_raw(200, "<html>")
                .push_json(200, &json!({"id": 1})),
        );

        let value: Option<serde_json::Value> = executor(&transport)
            .fetch_json(&url(), &AbortSignal::never(), Resource::Product)
            .await
            .unwrap();

        assert_eq!(value, Some(json!({"id": 1})));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_aborted_makes_no_request() {
        let transport = Arc::new(ScriptedTransport::new().push_json(200, &json!(1)));
        let controller = AbortController::new();
        controller.abort();

        let value = executor(&transport)
            .fetch_json::<u32>(&url(), &controller.signal(), Resource::Products)
            .await
            .unwrap();

        assert!(value.is_none());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_during_backoff_stops_retrying() {
        let transport = Arc::new(ScriptedTransport::new().with_fallback(500, ""));
        let controller = AbortController::new();
        let signal = controller.signal();
        let exec = executor(&transport);

        let task = tokio::spawn(async move {
            exec.fetch_json::<u32>(&url(), &signal, Resource::Products)
                .await
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        controller.abort();

        let result = task.await.unwrap();
        assert_eq!(result, Ok(None));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_while_in_flight() {
        let transport = Arc::new(ScriptedTransport::new().push_hang());
        let controller = AbortController::new();
        let signal = controller.signal();
        let exec = executor(&transport);

        let task = tokio::spawn(async move {
            exec.fetch_json::<u32>(&url(), &signal, Resource::Products)
                .await
        });

        tokio::time::sleep(Duration::from_secs(30)).await;
        controller.abort();

        assert_eq!(task.await.unwrap(), Ok(None));
        assert_eq!(transport.calls(), 1);
    }
}
