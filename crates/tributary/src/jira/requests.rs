use base64::Engine;
use url::Url;

use crate::http::HttpRequest;

/// Search endpoint path.
pub const SEARCH_PATH: &str = "/rest/api/2/search";

/// Page size requested from the search endpoint.
pub const MAX_RESULTS: u32 = 100;

/// Issue fields requested with every search.
pub const FIELDS: &[&str] = &[
    "summary",
    "status",
    "issuetype",
    "created",
    "updated",
    "resolutiondate",
    "assignee",
];

/// Builds authenticated search requests for one Jira account.
#[derive(Clone)]
pub struct JiraRequests {
    search_url: Url,
    authorization: String,
    jql: String,
}

impl JiraRequests {
    /// `host` may be a bare host name (`acme.atlassian.net`) or a base URL.
    pub fn new(
        host: &str,
        user: &str,
        token: &str,
        jql: &str,
    ) -> Result<Self, url::ParseError> {
        let base = if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };
        let search_url = Url::parse(base.trim_end_matches('/'))?.join(SEARCH_PATH)?;

        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", user, token));

        Ok(Self {
            search_url,
            authorization: format!("Basic {}", credentials),
            jql: ordered_jql(jql),
        })
    }

    /// The search request for the page starting at `start_at`.
    pub fn search(&self, start_at: u64) -> HttpRequest {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("jql", &self.jql)
            .append_pair("startAt", &start_at.to_string())
            .append_pair("maxResults", &MAX_RESULTS.to_string())
            .append_pair("fields", &FIELDS.join(","));

        HttpRequest::get(url.to_string())
            .with_header("Authorization", self.authorization.clone())
            .with_header("Accept", "application/json")
    }

    pub fn jql(&self) -> &str {
        &self.jql
    }
}

impl std::fmt::Debug for JiraRequests {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraRequests")
            .field("search_url", &self.search_url.as_str())
            .field("jql", &self.jql)
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// Order results newest-updated first, which the watermark cutoff relies on.
fn ordered_jql(jql: &str) -> String {
    let jql = jql.trim();
    if jql.is_empty() {
        "ORDER BY updated DESC".to_string()
    } else {
        format!("{} ORDER BY updated DESC", jql)
    }
}
