//! `Link` header pagination.

use crate::http::{HttpRequest, HttpResponse};

/// Links parsed from a GitHub `Link` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// URL of the next page (from rel="next" link).
    pub next: Option<String>,
    /// URL of the last page (from rel="last" link).
    pub last: Option<String>,
}

/// Parse a GitHub `Link` header.
///
/// Example header:
/// `<https://api.github.com/repositories/1/pulls?per_page=100&page=2>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel_type)) = (url, rel) {
            match rel_type {
                "next" => info.next = Some(url.to_string()),
                "last" => info.last = Some(url.to_string()),
                _ => {}
            }
        }
    }

    info
}

/// Pagination callback: follow `rel="next"` with the same headers.
pub fn next_link(request: &HttpRequest, response: &HttpResponse) -> Option<HttpRequest> {
    let next = parse_link_header(response.header("link")?).next?;
    Some(request.with_url(next))
}
