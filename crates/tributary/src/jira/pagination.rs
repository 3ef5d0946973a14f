//! Offset pagination of the search endpoint.

use serde::Deserialize;
use url::Url;

use crate::http::{HttpRequest, HttpResponse};

/// Offset fields every search page carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOffsets {
    pub start_at: u64,
    pub max_results: u64,
    pub total: u64,
}

impl PageOffsets {
    /// Offset of the following page, if there is one.
    pub fn next_start(&self) -> Option<u64> {
        let next = self.start_at.checked_add(self.max_results)?;
        (self.max_results > 0 && next < self.total).then_some(next)
    }
}

/// Pagination callback: advance `startAt` by `maxResults` until `total`.
pub fn next_offset(request: &HttpRequest, response: &HttpResponse) -> Option<HttpRequest> {
    let offsets: PageOffsets = serde_json::from_slice(&response.body).ok()?;
    let next = offsets.next_start()?;

    let mut url = Url::parse(&request.url).ok()?;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "startAt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("startAt", &next.to_string());

    Some(request.with_url(url.to_string()))
}
