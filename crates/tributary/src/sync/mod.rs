//! Incremental sync of remote entities into the cache.
//!
//! # Module Structure
//!
//! - `types` - `SyncOptions`, `SyncOutcome`, `AbortSignal`
//! - `progress` - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`source`] - `GitHubSource` / `JiraSource` traits the syncers pull from
//! - `engine` - the per-entity sync loop
//! - `github` / `jira` - `GitHubSyncer` and `JiraSyncer`
//!
//! # Example
//!
//! ```ignore
//! use tributary::sync::{GitHubSyncer, SyncOptions};
//!
//! let syncer = GitHubSyncer::new(client, db);
//! let report = syncer.sync_all(&SyncOptions::default()).await?;
//! println!("Synced {} items", report.total_items());
//! ```

mod engine;
mod error;
mod github;
mod jira;
mod progress;
pub mod source;
mod types;

pub use error::SyncError;
pub use github::{GitHubSyncReport, GitHubSyncer};
pub use jira::JiraSyncer;
pub use progress::{ProgressCallback, SyncProgress, emit};
pub use source::{EntityStream, GitHubSource, JiraSource, newer_than};
pub use types::{AbortSignal, SyncOptions, SyncOutcome};
