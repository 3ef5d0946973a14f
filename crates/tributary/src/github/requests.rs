use chrono::{DateTime, SecondsFormat, Utc};

use crate::http::HttpRequest;

/// Default REST API root.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// REST API version sent with every request.
pub const API_VERSION: &str = "2022-11-28";

/// Page size requested from list endpoints.
pub const PER_PAGE: u32 = 100;

/// Builds authenticated requests for one repository.
#[derive(Clone)]
pub struct GitHubRequests {
    base_url: String,
    owner: String,
    repo: String,
    token: String,
    user_agent: String,
}

impl GitHubRequests {
    pub fn new(
        base_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
            user_agent: user_agent.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn request(&self, path_and_query: &str) -> HttpRequest {
        let url = format!(
            "{}/repos/{}/{}{}",
            self.base_url, self.owner, self.repo, path_and_query
        );
        let mut request = HttpRequest::get(url)
            .with_header("Accept", "application/vnd.github+json")
            .with_header("X-GitHub-Api-Version", API_VERSION)
            .with_header("User-Agent", self.user_agent.clone());
        if !self.token.is_empty() {
            request = request.with_header("Authorization", format!("Bearer {}", self.token));
        }
        request
    }

    /// All pulls, most recently updated first.
    pub fn pulls(&self) -> HttpRequest {
        self.request(&format!(
            "/pulls?state=all&sort=updated&direction=desc&per_page={}",
            PER_PAGE
        ))
    }

    /// Default-branch commits, newest first. `since` is applied server side.
    pub fn commits(&self, since: Option<DateTime<Utc>>) -> HttpRequest {
        let mut path = format!("/commits?per_page={}", PER_PAGE);
        if let Some(since) = since {
            path.push_str("&since=");
            path.push_str(&since.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        self.request(&path)
    }

    pub fn pull_commits(&self, pull_number: u64) -> HttpRequest {
        self.request(&format!(
            "/pulls/{}/commits?per_page={}",
            pull_number, PER_PAGE
        ))
    }

    /// Workflow runs, newest first.
    pub fn action_runs(&self) -> HttpRequest {
        self.request(&format!("/actions/runs?per_page={}", PER_PAGE))
    }

    pub fn action_workflows(&self) -> HttpRequest {
        self.request(&format!("/actions/workflows?per_page={}", PER_PAGE))
    }
}

impl std::fmt::Debug for GitHubRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubRequests")
            .field("base_url", &self.base_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .finish()
    }
}
