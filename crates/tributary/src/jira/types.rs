use serde::Deserialize;

use crate::model::JiraIssue;

/// One page of `GET /rest/api/2/search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub start_at: u64,
    pub max_results: u64,
    pub total: u64,
    pub issues: Vec<JiraIssue>,
}
