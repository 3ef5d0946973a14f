//! Jira REST API source.
//!
//! Issues come from the search endpoint, ordered by `updated DESC` so the
//! watermark cutoff applies, and paginated by `startAt` offsets.

mod client;
pub mod pagination;
mod requests;
mod types;

pub use client::{DEFAULT_TIMEOUT, JiraClient, JiraClientError, JiraConfig};
pub use pagination::{PageOffsets, next_offset};
pub use requests::{FIELDS, JiraRequests, MAX_RESULTS, SEARCH_PATH};
pub use types::SearchPage;
