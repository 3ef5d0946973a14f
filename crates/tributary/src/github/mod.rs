//! GitHub REST API source.
//!
//! # Module Structure
//!
//! - `requests` - authenticated request factory for one repository
//! - [`pagination`] - `Link` header parsing
//! - `types` - list envelopes of the Actions endpoints
//! - `client` - [`GitHubClient`], the [`GitHubSource`](crate::sync::GitHubSource) implementation
//!
//! ```ignore
//! use tributary::github::{GitHubClient, GitHubConfig};
//! use tributary::sync::{GitHubSyncer, SyncOptions};
//!
//! let client = GitHubClient::new(&GitHubConfig::new(token, "rust-lang", "rust"))?;
//! let syncer = GitHubSyncer::new(client, db);
//! syncer.sync_pulls(&SyncOptions::default()).await?;
//! ```

mod client;
pub mod pagination;
mod requests;
mod types;

pub use client::{DEFAULT_TIMEOUT, GitHubClient, GitHubConfig};
pub use pagination::{LinkPagination, next_link, parse_link_header};
pub use requests::{API_VERSION, DEFAULT_BASE_URL, GitHubRequests, PER_PAGE};
pub use types::{ActionRunList, ActionWorkflowList};
