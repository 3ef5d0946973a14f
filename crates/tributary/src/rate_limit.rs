//! Proactive client-side rate limiting.
//!
//! The [`RateLimitBackoff`](crate::retry::backoff::RateLimitBackoff) policy
//! reacts after the server rejects a request; this layer spaces requests out
//! so that rejection is rare in the first place.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default request budgets (requests per second).
pub mod rate_limits {
    /// GitHub: 5000 requests/hour = ~1.4/sec, we use 10/sec to allow bursts.
    pub const GITHUB_DEFAULT_RPS: u32 = 10;
    /// Jira Cloud does not publish a fixed budget; stay conservative.
    pub const JIRA_DEFAULT_RPS: u32 = 5;
}

/// A rate-limited wrapper around any [`HttpTransport`].
///
/// Every request waits for the limiter before being handed to the inner
/// transport. Clones share the same budget.
pub struct RateLimitedTransport<T> {
    inner: T,
    rate_limiter: Arc<GovernorRateLimiter>,
}

impl<T> RateLimitedTransport<T> {
    /// Create a new rate-limited transport.
    ///
    /// A budget of 0 is treated as 1 request per second.
    pub fn new(inner: T, requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner,
            rate_limiter: Arc::new(rate_limiter),
        }
    }

    /// Get a reference to the inner transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Clone> Clone for RateLimitedTransport<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            rate_limiter: Arc::clone(&self.rate_limiter),
        }
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for RateLimitedTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.rate_limiter.until_ready().await;
        self.inner.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, MockTransport, json_response};

    #[tokio::test]
    async fn delegates_to_inner_transport() {
        let mock = MockTransport::new();
        let url = "https://api.example.com/a";
        mock.push_response(HttpMethod::Get, url, json_response(200, serde_json::json!([])));
        mock.push_response(HttpMethod::Get, url, json_response(200, serde_json::json!([])));

        let transport = RateLimitedTransport::new(mock.clone(), 100);
        let clone = transport.clone();

        transport.send(HttpRequest::get(url)).await.expect("first");
        clone.send(HttpRequest::get(url)).await.expect("second");

        assert_eq!(transport.inner().requests().len(), 2);
    }

    #[test]
    fn zero_budget_is_clamped() {
        let transport = RateLimitedTransport::new(MockTransport::new(), 0);
        assert!(transport.inner().requests().is_empty());
    }
}
