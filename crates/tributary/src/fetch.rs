//! Exhaustive pagination.
//!
//! [`fetch_exhaustively`] follows one logical list request across pages. A
//! pagination callback decides, from the request and response of the page
//! just fetched, what the next request is. Pages are requested strictly one
//! after another and only as the returned stream is polled, so dropping the
//! stream stops further requests.

use std::sync::Arc;

use futures::Stream;
use futures::stream;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::http::{HttpError, HttpRequest, HttpResponse, HttpTransport};

/// Default upper bound on pages per logical request.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Errors produced while walking a paginated collection.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The transport failed on the final retry attempt.
    #[error(transparent)]
    Transport(#[from] HttpError),

    /// The server answered with a status the caller cannot use.
    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },

    /// The payload did not match the expected schema.
    #[error("unexpected response schema from {url}: {source}")]
    Schema {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// More pages were requested than allowed, most likely a pagination loop.
    #[error("page limit of {max_pages} exceeded at {url}")]
    PageLimit { max_pages: usize, url: String },
}

impl FetchError {
    /// Build a status error from a response, keeping a short body excerpt.
    pub fn status(url: impl Into<String>, response: &HttpResponse) -> Self {
        let body = String::from_utf8_lossy(&response.body);
        Self::Status {
            status: response.status,
            url: url.into(),
            body: body.chars().take(200).collect(),
        }
    }

    /// True for failures that indicate an API contract problem rather than
    /// a transient condition.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Schema { .. } | Self::PageLimit { .. })
    }
}

/// One fetched and validated page.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: T,
    pub response: HttpResponse,
}

/// Pagination continuation: given the page just fetched, the next request.
pub trait Paginate: Fn(&HttpRequest, &HttpResponse) -> Option<HttpRequest> + Send + Sync {}

impl<F> Paginate for F where F: Fn(&HttpRequest, &HttpResponse) -> Option<HttpRequest> + Send + Sync {}

/// Lazily fetch every page of a collection.
///
/// Each page body is deserialized into `T`; a mismatch ends the stream with
/// [`FetchError::Schema`]. Non-2xx responses, and a 202 that is still pending
/// after the transport's retries, end it with [`FetchError::Status`]. If the
/// callback keeps producing requests beyond `max_pages`, the stream ends with
/// [`FetchError::PageLimit`].
pub fn fetch_exhaustively<'a, T, P>(
    transport: &'a dyn HttpTransport,
    request: HttpRequest,
    paginate: P,
    max_pages: usize,
) -> impl Stream<Item = Result<Page<T>, FetchError>> + Send + 'a
where
    T: DeserializeOwned + Send + 'a,
    P: Paginate + 'a,
{
    let paginate = Arc::new(paginate);

    stream::try_unfold((Some(request), 0usize), move |(next, fetched)| {
        let paginate = Arc::clone(&paginate);
        async move {
            let Some(request) = next else {
                return Ok(None);
            };

            if fetched >= max_pages {
                tracing::warn!(url = %request.url, max_pages, "Pagination page limit exceeded");
                return Err(FetchError::PageLimit {
                    max_pages,
                    url: request.url,
                });
            }

            let response = transport.send(request.clone()).await?;

            if !response.is_success() || response.status == 202 {
                return Err(FetchError::status(&request.url, &response));
            }

            let data: T = serde_json::from_slice(&response.body).map_err(|source| {
                tracing::warn!(
                    url = %request.url,
                    status = response.status,
                    error = %source,
                    "Response failed schema validation"
                );
                FetchError::Schema {
                    url: request.url.clone(),
                    source,
                }
            })?;

            tracing::debug!(url = %request.url, page = fetched + 1, "Fetched page");

            let next = (*paginate)(&request, &response);
            Ok(Some((Page { data, response }, (next, fetched + 1))))
        }
    })
}
