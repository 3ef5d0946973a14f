//! Tributary - incremental sync of paginated REST resources into a local cache.
//!
//! Pull requests, commits, pull-request commits, GitHub Actions runs and
//! workflows, and Jira issues are fetched page by page and upserted into a
//! SQLite document cache. Each sync remembers when it last finished, so the
//! next one only walks the pages that changed since.
//!
//! # Features
//!
//! - `github` - GitHub REST client ([`github::GitHubClient`])
//! - `jira` - Jira REST client ([`jira::JiraClient`])
//! - `sqlite` - SQLite driver for the cache
//! - `migrate` - Schema migrations and [`connect_and_migrate`] / [`connect_scope`]
//!
//! # Example
//!
//! ```ignore
//! use tributary::github::{GitHubClient, GitHubConfig};
//! use tributary::sync::{GitHubSyncer, SyncOptions};
//! use tributary::{CacheScope, connect_scope};
//!
//! let db = connect_scope(&cache_root, &CacheScope::github("rust-lang", "rust")).await?;
//! let client = GitHubClient::new(&GitHubConfig::new(token, "rust-lang", "rust"))?;
//! let report = GitHubSyncer::new(client, db).sync_all(&SyncOptions::default()).await?;
//! ```

pub mod cache;
pub mod clock;
pub mod db;
pub mod entity;
pub mod fetch;
pub mod http;
pub mod model;
pub mod rate_limit;
pub mod retry;
pub mod sync;

#[cfg(feature = "github")]
pub mod github;

#[cfg(feature = "jira")]
pub mod jira;

#[cfg(feature = "migrate")]
pub mod migration;

pub use cache::{CacheError, DocumentQuery};
pub use db::{CacheScope, connect};
#[cfg(feature = "migrate")]
pub use db::{connect_and_migrate, connect_scope};
pub use entity::prelude::*;
pub use fetch::FetchError;
pub use model::Document;
pub use sync::{AbortSignal, SyncError, SyncOptions, SyncOutcome, SyncProgress};
