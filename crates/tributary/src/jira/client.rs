use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, TryStreamExt};

use crate::fetch::{DEFAULT_MAX_PAGES, FetchError, fetch_exhaustively};
use crate::http::{HttpError, HttpTransport};
use crate::model::JiraIssue;
use crate::rate_limit::rate_limits;
use crate::retry::{RetrierObserver, RetryConfig, standard_transport};
use crate::sync::{EntityStream, JiraSource, newer_than};

use super::pagination::next_offset;
use super::requests::JiraRequests;
use super::types::SearchPage;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors creating a [`JiraClient`].
#[derive(Debug, thiserror::Error)]
pub enum JiraClientError {
    #[error("Invalid Jira host: {0}")]
    InvalidHost(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Settings for a [`JiraClient`].
#[derive(Clone)]
pub struct JiraConfig {
    pub host: String,
    pub user: String,
    pub token: String,
    /// Issue filter; results are always ordered by `updated DESC`.
    pub jql: String,
    /// Proactive request budget; 0 disables client-side limiting.
    pub requests_per_second: u32,
    pub retry: RetryConfig,
    pub max_pages: usize,
    pub timeout: Duration,
}

impl JiraConfig {
    pub fn new(host: impl Into<String>, user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            token: token.into(),
            jql: String::new(),
            requests_per_second: rate_limits::JIRA_DEFAULT_RPS,
            retry: RetryConfig::default(),
            max_pages: DEFAULT_MAX_PAGES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_jql(mut self, jql: impl Into<String>) -> Self {
        self.jql = jql.into();
        self
    }
}

impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("jql", &self.jql)
            .field("requests_per_second", &self.requests_per_second)
            .field("retry", &self.retry)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

/// Jira REST client for one account and query.
#[derive(Clone)]
pub struct JiraClient {
    transport: Arc<dyn HttpTransport>,
    requests: JiraRequests,
    max_pages: usize,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self, JiraClientError> {
        Self::with_observer(config, None)
    }

    pub fn with_observer(
        config: &JiraConfig,
        observer: Option<RetrierObserver>,
    ) -> Result<Self, JiraClientError> {
        let transport = standard_transport(
            config.requests_per_second,
            config.retry,
            config.timeout,
            observer,
        )?;
        Self::with_transport(transport, config)
    }

    pub fn with_transport(
        transport: Arc<dyn HttpTransport>,
        config: &JiraConfig,
    ) -> Result<Self, JiraClientError> {
        Ok(Self {
            transport,
            requests: JiraRequests::new(&config.host, &config.user, &config.token, &config.jql)?,
            max_pages: config.max_pages,
        })
    }

    pub fn requests(&self) -> &JiraRequests {
        &self.requests
    }
}

impl JiraSource for JiraClient {
    fn issues(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, JiraIssue> {
        let pages = fetch_exhaustively::<SearchPage, _>(
            &*self.transport,
            self.requests.search(0),
            next_offset,
            self.max_pages,
        );
        let issues = pages
            .map_ok(|page| stream::iter(page.data.issues.into_iter().map(Ok::<_, FetchError>)))
            .try_flatten();
        newer_than(issues, since)
    }
}
