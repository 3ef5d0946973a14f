//! Backoff policies.
//!
//! A policy looks at one finished attempt and decides whether the [`Retrier`]
//! should stop or wait and try again. Policies are pure apart from jitter and
//! the injected clock used for rate-limit resets.
//!
//! [`Retrier`]: super::Retrier

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::clock::{Clock, system_clock};
use crate::http::{HttpError, HttpResponse};

/// Default multiplier between consecutive exponential delays.
pub const DEFAULT_FACTOR: f64 = 4.0;

/// Default delay for the first retry.
pub const DEFAULT_MIN_TIMEOUT: Duration = Duration::from_millis(50);

/// Default ceiling for a single delay.
pub const DEFAULT_MAX_TIMEOUT: Duration = Duration::from_secs(60);

/// The result of one attempt, as seen by a policy.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    Error(&'a HttpError),
    Response(&'a HttpResponse),
}

/// What the retrier should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Return the outcome to the caller.
    Stop,
    /// Wait and try again.
    Retry(Duration),
    /// The server told us to wait until its quota resets.
    RateLimited(Duration),
}

impl Backoff {
    /// The delay before the next attempt, if any.
    #[must_use]
    pub fn delay(self) -> Option<Duration> {
        match self {
            Backoff::Stop => None,
            Backoff::Retry(d) | Backoff::RateLimited(d) => Some(d),
        }
    }
}

/// Decides, per attempt, whether and how long to back off.
pub trait BackoffPolicy: Send + Sync {
    fn backoff(&self, attempt: u32, outcome: Outcome<'_>) -> Backoff;
}

/// Retry immediately on errors and server failures, never on 2xx or 4xx.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleBackoff;

impl BackoffPolicy for SimpleBackoff {
    fn backoff(&self, _attempt: u32, outcome: Outcome<'_>) -> Backoff {
        match outcome {
            Outcome::Error(_) => Backoff::Retry(Duration::ZERO),
            Outcome::Response(r) if r.is_success() || r.is_client_error() => Backoff::Stop,
            Outcome::Response(_) => Backoff::Retry(Duration::ZERO),
        }
    }
}

/// Exponential backoff: `min_timeout * factor^attempt`, clamped to `max_timeout`.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub factor: f64,
    pub min_timeout: Duration,
    pub max_timeout: Duration,
    /// Multiply each delay by a random factor in `[1, 2)`.
    pub jitter: bool,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            factor: DEFAULT_FACTOR,
            min_timeout: DEFAULT_MIN_TIMEOUT,
            max_timeout: DEFAULT_MAX_TIMEOUT,
            jitter: false,
        }
    }
}

impl ExponentialBackoff {
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, min_timeout: Duration, max_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self.max_timeout = max_timeout;
        self
    }

    /// The delay for `attempt`, ignoring the outcome.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter {
            rand::rng().random_range(1.0..2.0)
        } else {
            1.0
        };
        let min_ms = (self.min_timeout.as_millis() as f64).max(1.0);
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let ms = (jitter * min_ms * self.factor.powi(exponent)).round();
        let max_ms = self.max_timeout.as_millis() as f64;

        if !ms.is_finite() || ms >= max_ms {
            self.max_timeout
        } else {
            Duration::from_millis(ms as u64)
        }
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn backoff(&self, attempt: u32, outcome: Outcome<'_>) -> Backoff {
        match outcome {
            Outcome::Response(r) if r.is_success() || r.is_client_error() => Backoff::Stop,
            _ => Backoff::Retry(self.delay_for(attempt)),
        }
    }
}

/// Exponential backoff that understands GitHub's quota headers.
///
/// A 403 with `x-ratelimit-remaining: 0` waits until `x-ratelimit-reset`
/// (epoch seconds). A 202 means the server is still computing the resource
/// and is retried like a server error.
#[derive(Clone)]
pub struct RateLimitBackoff {
    exponential: ExponentialBackoff,
    clock: Clock,
}

impl Default for RateLimitBackoff {
    fn default() -> Self {
        Self::new(ExponentialBackoff::default())
    }
}

impl std::fmt::Debug for RateLimitBackoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitBackoff")
            .field("exponential", &self.exponential)
            .finish_non_exhaustive()
    }
}

impl RateLimitBackoff {
    #[must_use]
    pub fn new(exponential: ExponentialBackoff) -> Self {
        Self {
            exponential,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn reset_wait(&self, response: &HttpResponse) -> Option<Duration> {
        if response.status != 403 || response.header("x-ratelimit-remaining") != Some("0") {
            return None;
        }

        let now = (self.clock)();
        let reset = response
            .header("x-ratelimit-reset")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or(now);

        Some((reset - now).to_std().unwrap_or(Duration::ZERO))
    }
}

impl BackoffPolicy for RateLimitBackoff {
    fn backoff(&self, attempt: u32, outcome: Outcome<'_>) -> Backoff {
        match outcome {
            Outcome::Error(_) => Backoff::Retry(self.exponential.delay_for(attempt)),
            Outcome::Response(r) => {
                if let Some(wait) = self.reset_wait(r) {
                    Backoff::RateLimited(wait)
                } else if r.status == 202 {
                    Backoff::Retry(self.exponential.delay_for(attempt))
                } else {
                    self.exponential.backoff(attempt, outcome)
                }
            }
        }
    }
}
