//! Retrying HTTP transport.
//!
//! [`Retrier`] wraps any [`HttpTransport`] and re-issues a request according
//! to a [`BackoffPolicy`]. It is itself a transport, so callers compose it
//! like any other layer:
//!
//! ```ignore
//! use tributary::http::reqwest_transport::ReqwestTransport;
//! use tributary::retry::{Retrier, RetryConfig, backoff::RateLimitBackoff};
//!
//! let transport = Retrier::new(ReqwestTransport::new(client), RateLimitBackoff::default())
//!     .with_config(RetryConfig::new(5));
//! let response = transport.send(request).await?;
//! ```

pub mod backoff;

use std::sync::Arc;

use async_trait::async_trait;

use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};

use backoff::{Backoff, BackoffPolicy, Outcome};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Configuration for a [`Retrier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// The attempt index at which the retrier gives up, whatever the policy says.
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }
}

/// Lifecycle notification for a single attempt.
#[derive(Debug, Clone)]
pub enum RetrierEvent {
    /// About to issue the request.
    Fetching {
        attempt: u32,
        max_retries: u32,
        request: HttpRequest,
    },
    /// The request finished, successfully or not.
    Fetched {
        attempt: u32,
        max_retries: u32,
        request: HttpRequest,
        result: Result<HttpResponse, HttpError>,
    },
    /// Waiting `delay` before the next attempt.
    Retrying {
        attempt: u32,
        max_retries: u32,
        request: HttpRequest,
        delay: std::time::Duration,
    },
    /// The server's quota is exhausted; waiting `wait` for it to reset.
    RateLimited {
        attempt: u32,
        max_retries: u32,
        request: HttpRequest,
        wait: std::time::Duration,
    },
    /// No more attempts will be made; `result` is what the caller receives.
    Done {
        attempt: u32,
        max_retries: u32,
        request: HttpRequest,
        result: Result<HttpResponse, HttpError>,
    },
}

impl RetrierEvent {
    /// Attempt index this event belongs to (0-based).
    #[must_use]
    pub fn attempt(&self) -> u32 {
        match self {
            RetrierEvent::Fetching { attempt, .. }
            | RetrierEvent::Fetched { attempt, .. }
            | RetrierEvent::Retrying { attempt, .. }
            | RetrierEvent::RateLimited { attempt, .. }
            | RetrierEvent::Done { attempt, .. } => *attempt,
        }
    }
}

/// Callback receiving [`RetrierEvent`]s.
pub type RetrierObserver = Arc<dyn Fn(RetrierEvent) + Send + Sync>;

/// A transport that retries the wrapped transport according to a policy.
pub struct Retrier<T, P> {
    inner: T,
    policy: P,
    config: RetryConfig,
    observer: Option<RetrierObserver>,
}

impl<T, P> Retrier<T, P> {
    pub fn new(inner: T, policy: P) -> Self {
        Self {
            inner,
            policy,
            config: RetryConfig::default(),
            observer: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: RetrierObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a reference to the wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn notify(&self, event: impl FnOnce() -> RetrierEvent) {
        if let Some(observer) = &self.observer {
            observer(event());
        }
    }
}

#[async_trait]
impl<T, P> HttpTransport for Retrier<T, P>
where
    T: HttpTransport,
    P: BackoffPolicy,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0u32;

        loop {
            self.notify(|| RetrierEvent::Fetching {
                attempt,
                max_retries,
                request: request.clone(),
            });

            let result = self.inner.send(request.clone()).await;

            self.notify(|| RetrierEvent::Fetched {
                attempt,
                max_retries,
                request: request.clone(),
                result: result.clone(),
            });

            let outcome = match &result {
                Ok(response) => Outcome::Response(response),
                Err(error) => Outcome::Error(error),
            };
            let decision = self.policy.backoff(attempt, outcome);

            let delay = match decision.delay() {
                Some(delay) if attempt < max_retries => delay,
                _ => {
                    self.notify(|| RetrierEvent::Done {
                        attempt,
                        max_retries,
                        request: request.clone(),
                        result: result.clone(),
                    });
                    return result;
                }
            };

            match decision {
                Backoff::RateLimited(wait) => {
                    tracing::warn!(
                        url = %request.url,
                        attempt,
                        wait_secs = wait.as_secs(),
                        "Rate limited, waiting for quota reset"
                    );
                    self.notify(|| RetrierEvent::RateLimited {
                        attempt,
                        max_retries,
                        request: request.clone(),
                        wait,
                    });
                }
                _ => {
                    tracing::debug!(
                        url = %request.url,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = ?result.as_ref().err(),
                        status = ?result.as_ref().ok().map(|r| r.status),
                        "Retrying request"
                    );
                    self.notify(|| RetrierEvent::Retrying {
                        attempt,
                        max_retries,
                        request: request.clone(),
                        delay,
                    });
                }
            }

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Build the transport stack used by the provider clients: reqwest at the
/// bottom, an optional proactive rate limiter (0 disables it), and a
/// [`Retrier`] with the rate-limit-aware policy on top.
#[cfg(any(feature = "github", feature = "jira"))]
pub fn standard_transport(
    requests_per_second: u32,
    config: RetryConfig,
    timeout: std::time::Duration,
    observer: Option<RetrierObserver>,
) -> Result<Arc<dyn HttpTransport>, HttpError> {
    use crate::http::reqwest_transport::ReqwestTransport;
    use crate::rate_limit::RateLimitedTransport;

    let mut base: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::with_timeout(timeout)?);
    if requests_per_second > 0 {
        base = Arc::new(RateLimitedTransport::new(base, requests_per_second));
    }

    let policy =
        backoff::RateLimitBackoff::new(backoff::ExponentialBackoff::default().with_jitter(true));
    let mut retrier = Retrier::new(base, policy).with_config(config);
    if let Some(observer) = observer {
        retrier = retrier.with_observer(observer);
    }
    Ok(Arc::new(retrier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::http::{HttpMethod, MockTransport, json_response};
    use backoff::{ExponentialBackoff, SimpleBackoff};

    const URL: &str = "https://api.example.com/things";

    /// Records every attempt number it is consulted with, then delegates.
    struct RecordingPolicy<P> {
        inner: P,
        attempts: Mutex<Vec<u32>>,
    }

    impl<P: BackoffPolicy> BackoffPolicy for RecordingPolicy<P> {
        fn backoff(&self, attempt: u32, outcome: Outcome<'_>) -> Backoff {
            self.attempts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(attempt);
            self.inner.backoff(attempt, outcome)
        }
    }

    fn recording<P>(inner: P) -> RecordingPolicy<P> {
        RecordingPolicy {
            inner,
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn collect_events() -> (RetrierObserver, Arc<Mutex<Vec<RetrierEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&events);
        let observer: RetrierObserver = Arc::new(move |event| {
            capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        });
        (observer, events)
    }

    #[test]
    fn retry_config_default() {
        assert_eq!(RetryConfig::default().max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(RetryConfig::new(2).max_retries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_success_without_retrying() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Get, URL, json_response(200, serde_json::json!([])));

        let retrier = Retrier::new(transport.clone(), ExponentialBackoff::default());
        let resp = retrier.send(HttpRequest::get(URL)).await.expect("response");

        assert_eq!(resp.status, 200);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_numbers_increase_by_one_and_final_response_is_returned() {
        let transport = MockTransport::new();
        transport.push_error(HttpMethod::Get, URL, HttpError::Transport("reset".into()));
        transport.push_response(HttpMethod::Get, URL, json_response(500, serde_json::json!({})));
        transport.push_error(HttpMethod::Get, URL, HttpError::Transport("reset".into()));
        transport.push_response(HttpMethod::Get, URL, json_response(200, serde_json::json!({"ok": true})));

        let retrier = Retrier::new(transport.clone(), recording(ExponentialBackoff::default()));
        let resp = retrier.send(HttpRequest::get(URL)).await.expect("response");

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, br#"{"ok":true}"#.to_vec());
        let attempts = retrier.policy.attempts.lock().expect("lock").clone();
        assert_eq!(attempts, vec![0, 1, 2, 3]);
        assert_eq!(transport.requests().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_unsuccessful_response_when_retries_are_exhausted() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.push_response(HttpMethod::Get, URL, json_response(502, serde_json::json!({})));
        }

        let retrier = Retrier::new(transport.clone(), recording(SimpleBackoff))
            .with_config(RetryConfig::new(2));
        let resp = retrier.send(HttpRequest::get(URL)).await.expect("response");

        assert_eq!(resp.status, 502);
        assert_eq!(transport.requests().len(), 3);
        let attempts = retrier.policy.attempts.lock().expect("lock").clone();
        assert_eq!(attempts, vec![0, 1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn rethrows_when_final_attempt_fails_at_transport_level() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Get, URL, json_response(503, serde_json::json!({})));
        transport.push_error(HttpMethod::Get, URL, HttpError::Transport("timed out".into()));

        let retrier = Retrier::new(transport, SimpleBackoff).with_config(RetryConfig::new(1));
        let err = retrier
            .send(HttpRequest::get(URL))
            .await
            .expect_err("final attempt failed");

        assert!(matches!(err, HttpError::Transport(msg) if msg == "timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_is_returned_without_retry() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Get, URL, json_response(404, serde_json::json!({})));

        let retrier = Retrier::new(transport.clone(), ExponentialBackoff::default());
        let resp = retrier.send(HttpRequest::get(URL)).await.expect("response");

        assert_eq!(resp.status, 404);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn emits_lifecycle_events_in_order() {
        let transport = MockTransport::new();
        transport.push_response(HttpMethod::Get, URL, json_response(500, serde_json::json!({})));
        transport.push_response(HttpMethod::Get, URL, json_response(200, serde_json::json!({})));

        let (observer, events) = collect_events();
        let retrier =
            Retrier::new(transport, ExponentialBackoff::default()).with_observer(observer);
        retrier.send(HttpRequest::get(URL)).await.expect("response");

        let events = events.lock().expect("lock");
        let kinds: Vec<(&str, u32)> = events
            .iter()
            .map(|e| {
                let kind = match e {
                    RetrierEvent::Fetching { .. } => "fetching",
                    RetrierEvent::Fetched { .. } => "fetched",
                    RetrierEvent::Retrying { .. } => "retrying",
                    RetrierEvent::RateLimited { .. } => "rate_limited",
                    RetrierEvent::Done { .. } => "done",
                };
                (kind, e.attempt())
            })
            .collect();

        assert_eq!(
            kinds,
            vec![
                ("fetching", 0),
                ("fetched", 0),
                ("retrying", 0),
                ("fetching", 1),
                ("fetched", 1),
                ("done", 1),
            ]
        );
        match &events[2] {
            RetrierEvent::Retrying {
                delay, max_retries, ..
            } => {
                assert_eq!(*delay, Duration::from_millis(50));
                assert_eq!(*max_retries, DEFAULT_MAX_RETRIES);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_response_emits_distinct_event() {
        use crate::clock::fixed_clock;
        use backoff::RateLimitBackoff;
        use chrono::DateTime;

        let now = DateTime::from_timestamp(1_700_000_000, 0).expect("timestamp");
        let transport = MockTransport::new();
        transport.push_response(
            HttpMethod::Get,
            URL,
            crate::http::HttpResponse {
                status: 403,
                headers: vec![
                    ("x-ratelimit-remaining".into(), "0".into()),
                    ("x-ratelimit-reset".into(), "1700000030".into()),
                ],
                body: Vec::new(),
            },
        );
        transport.push_response(HttpMethod::Get, URL, json_response(200, serde_json::json!([])));

        let (observer, events) = collect_events();
        let retrier = Retrier::new(
            transport,
            RateLimitBackoff::default().with_clock(fixed_clock(now)),
        )
        .with_observer(observer);

        let resp = retrier.send(HttpRequest::get(URL)).await.expect("response");
        assert_eq!(resp.status, 200);

        let events = events.lock().expect("lock");
        assert!(events.iter().any(|e| matches!(
            e,
            RetrierEvent::RateLimited { wait, .. } if *wait == Duration::from_secs(30)
        )));
    }
}
