use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;

use crate::fetch::{DEFAULT_MAX_PAGES, FetchError, fetch_exhaustively};
use crate::http::{HttpError, HttpRequest, HttpTransport};
use crate::model::{ActionRun, ActionWorkflow, Commit, Pull, PullCommit};
use crate::rate_limit::rate_limits;
use crate::retry::{RetrierObserver, RetryConfig, standard_transport};
use crate::sync::{EntityStream, GitHubSource, newer_than};

use super::pagination::next_link;
use super::requests::{DEFAULT_BASE_URL, GitHubRequests};
use super::types::{ActionRunList, ActionWorkflowList};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for a [`GitHubClient`].
#[derive(Clone)]
pub struct GitHubConfig {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub base_url: String,
    pub user_agent: String,
    /// Proactive request budget; 0 disables client-side limiting.
    pub requests_per_second: u32,
    pub retry: RetryConfig,
    pub max_pages: usize,
    pub timeout: Duration,
}

impl GitHubConfig {
    pub fn new(
        token: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: concat!("tributary/", env!("CARGO_PKG_VERSION")).to_string(),
            requests_per_second: rate_limits::GITHUB_DEFAULT_RPS,
            retry: RetryConfig::default(),
            max_pages: DEFAULT_MAX_PAGES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn requests(&self) -> GitHubRequests {
        GitHubRequests::new(
            self.base_url.clone(),
            self.owner.clone(),
            self.repo.clone(),
            self.token.clone(),
            self.user_agent.clone(),
        )
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("base_url", &self.base_url)
            .field("requests_per_second", &self.requests_per_second)
            .field("retry", &self.retry)
            .field("max_pages", &self.max_pages)
            .finish_non_exhaustive()
    }
}

/// GitHub REST client for one repository.
///
/// Every list is fetched lazily page by page through the shared transport
/// stack, and each stream implements the watermark cutoff of
/// [`GitHubSource`].
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    requests: GitHubRequests,
    max_pages: usize,
}

impl GitHubClient {
    /// Create a client over the standard retrying, rate-limited transport.
    pub fn new(config: &GitHubConfig) -> Result<Self, HttpError> {
        Self::with_observer(config, None)
    }

    /// Like [`GitHubClient::new`], reporting every retrier event to `observer`.
    pub fn with_observer(
        config: &GitHubConfig,
        observer: Option<RetrierObserver>,
    ) -> Result<Self, HttpError> {
        let transport = standard_transport(
            config.requests_per_second,
            config.retry,
            config.timeout,
            observer,
        )?;
        Ok(Self::with_transport(transport, config))
    }

    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: Arc<dyn HttpTransport>, config: &GitHubConfig) -> Self {
        Self {
            transport,
            requests: config.requests(),
            max_pages: config.max_pages,
        }
    }

    pub fn requests(&self) -> &GitHubRequests {
        &self.requests
    }

    /// Flatten the pages of a list endpoint into its items.
    fn list<'a, L, T, F>(
        &'a self,
        request: HttpRequest,
        items: F,
    ) -> impl Stream<Item = Result<T, FetchError>> + Send + 'a
    where
        L: DeserializeOwned + Send + 'a,
        T: Send + 'a,
        F: Fn(L) -> Vec<T> + Send + Sync + 'a,
    {
        fetch_exhaustively::<L, _>(&*self.transport, request, next_link, self.max_pages)
            .map_ok(move |page| stream::iter(items(page.data).into_iter().map(Ok::<T, FetchError>)))
            .try_flatten()
    }
}

impl GitHubSource for GitHubClient {
    fn pulls(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, Pull> {
        newer_than(self.list(self.requests.pulls(), |page: Vec<Pull>| page), since)
    }

    fn commits(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, Commit> {
        newer_than(
            self.list(self.requests.commits(since), |page: Vec<Commit>| page),
            since,
        )
    }

    fn pull_commits(&self, pull_number: u64) -> EntityStream<'_, PullCommit> {
        self.list(self.requests.pull_commits(pull_number), |page: Vec<Commit>| page)
            .map_ok(move |commit| PullCommit {
                pull_number,
                commit,
            })
            .boxed()
    }

    fn action_runs(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, ActionRun> {
        newer_than(
            self.list(self.requests.action_runs(), |page: ActionRunList| {
                page.workflow_runs
            }),
            since,
        )
    }

    fn action_workflows(&self) -> EntityStream<'_, ActionWorkflow> {
        self.list(self.requests.action_workflows(), |page: ActionWorkflowList| {
            page.workflows
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, HttpResponse, MockTransport, json_response};
    use crate::retry::Retrier;
    use crate::retry::backoff::{ExponentialBackoff, RateLimitBackoff};
    use chrono::TimeZone;
    use serde_json::json;

    const PULLS: &str = "https://api.github.com/repos/acme/widgets/pulls?state=all&sort=updated&direction=desc&per_page=100";
    const PULLS_PAGE_2: &str = "https://api.github.com/repositories/1/pulls?per_page=100&page=2";

    fn client(transport: Arc<dyn HttpTransport>) -> GitHubClient {
        GitHubClient::with_transport(transport, &GitHubConfig::new("tok", "acme", "widgets"))
    }

    fn pull_json(number: u64, updated_at: &str) -> serde_json::Value {
        json!({
            "id": number * 100,
            "number": number,
            "state": "open",
            "title": format!("Pull {number}"),
            "html_url": format!("https://github.com/acme/widgets/pull/{number}"),
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": updated_at,
        })
    }

    fn commit_json(sha: &str) -> serde_json::Value {
        json!({
            "sha": sha,
            "html_url": format!("https://github.com/acme/widgets/commit/{sha}"),
            "commit": {
                "message": "m",
                "author": {"name": "a", "email": "a@x", "date": "2024-01-01T00:00:00Z"},
                "committer": {"name": "a", "email": "a@x", "date": "2024-01-02T00:00:00Z"}
            }
        })
    }

    fn with_next(mut response: HttpResponse, next: &str) -> HttpResponse {
        response
            .headers
            .push(("Link".to_string(), format!("<{next}>; rel=\"next\"")));
        response
    }

    fn two_pages_of_pulls(mock: &MockTransport) {
        mock.push_response(
            HttpMethod::Get,
            PULLS,
            with_next(
                json_response(
                    200,
                    json!([
                        pull_json(3, "2024-03-03T00:00:00Z"),
                        pull_json(2, "2024-03-02T00:00:00Z")
                    ]),
                ),
                PULLS_PAGE_2,
            ),
        );
        mock.push_response(
            HttpMethod::Get,
            PULLS_PAGE_2,
            json_response(200, json!([pull_json(1, "2024-03-01T00:00:00Z")])),
        );
    }

    #[tokio::test]
    async fn pulls_follow_link_header() {
        let mock = MockTransport::new();
        two_pages_of_pulls(&mock);

        let pulls: Vec<u64> = client(Arc::new(mock.clone()))
            .pulls(None)
            .map_ok(|p| p.number)
            .try_collect()
            .await
            .expect("pulls");

        assert_eq!(pulls, vec![3, 2, 1]);
        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].header("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn cutoff_stops_before_next_page() {
        let mock = MockTransport::new();
        two_pages_of_pulls(&mock);

        let since = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let pulls: Vec<u64> = client(Arc::new(mock.clone()))
            .pulls(Some(since))
            .map_ok(|p| p.number)
            .try_collect()
            .await
            .expect("pulls");

        assert_eq!(pulls, vec![3]);
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn pull_commits_are_tagged_with_the_pull() {
        let mock = MockTransport::new();
        mock.push_response(
            HttpMethod::Get,
            "https://api.github.com/repos/acme/widgets/pulls/9/commits?per_page=100",
            json_response(200, json!([commit_json("a1"), commit_json("b2")])),
        );

        let keys: Vec<String> = client(Arc::new(mock))
            .pull_commits(9)
            .map_ok(|c| crate::model::Document::natural_key(&c))
            .try_collect()
            .await
            .expect("pull commits");

        assert_eq!(keys, vec!["9:a1", "9:b2"]);
    }

    #[tokio::test]
    async fn action_lists_are_unwrapped() {
        let mock = MockTransport::new();
        mock.push_response(
            HttpMethod::Get,
            "https://api.github.com/repos/acme/widgets/actions/workflows?per_page=100",
            json_response(
                200,
                json!({
                    "total_count": 1,
                    "workflows": [{
                        "id": 1,
                        "node_id": "W_1",
                        "name": "CI",
                        "path": ".github/workflows/ci.yml",
                        "state": "active",
                        "html_url": "https://github.com/acme/widgets/actions/workflows/ci.yml",
                        "created_at": "2023-01-01T00:00:00Z",
                        "updated_at": "2023-01-01T00:00:00Z"
                    }]
                }),
            ),
        );

        let workflows: Vec<ActionWorkflow> = client(Arc::new(mock))
            .action_workflows()
            .try_collect()
            .await
            .expect("workflows");
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].node_id, "W_1");
    }

    #[tokio::test]
    async fn bare_array_for_action_runs_is_a_schema_error() {
        let mock = MockTransport::new();
        mock.push_response(
            HttpMethod::Get,
            "https://api.github.com/repos/acme/widgets/actions/runs?per_page=100",
            json_response(200, json!([])),
        );

        let result: Result<Vec<ActionRun>, _> =
            client(Arc::new(mock)).action_runs(None).try_collect().await;
        assert!(matches!(result, Err(FetchError::Schema { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn server_errors_are_retried_through_the_retrier() {
        let mock = MockTransport::new();
        let url = "https://api.github.com/repos/acme/widgets/commits?per_page=100";
        mock.push_response(HttpMethod::Get, url, json_response(502, json!({})));
        mock.push_response(HttpMethod::Get, url, json_response(200, json!([commit_json("c3")])));

        let retrier = Retrier::new(mock.clone(), RateLimitBackoff::new(ExponentialBackoff::default()));
        let commits: Vec<Commit> = client(Arc::new(retrier))
            .commits(None)
            .try_collect()
            .await
            .expect("commits");

        assert_eq!(commits.len(), 1);
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn not_found_is_a_status_error() {
        let mock = MockTransport::new();
        mock.push_response(HttpMethod::Get, PULLS, json_response(404, json!({"message": "Not Found"})));

        let result: Result<Vec<Pull>, _> = client(Arc::new(mock)).pulls(None).try_collect().await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }
}
