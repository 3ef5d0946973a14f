//! Entities mirrored into the cache.
//!
//! Each entity is both the response schema (deserializing a page validates
//! it) and the cached payload. The [`Document`] trait lifts out what the cache
//! and the cutoff logic need to know about them.

mod github;
mod jira;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::entity::entity_type::EntityType;

pub use github::{
    ActionRun, ActionWorkflow, Actor, Commit, CommitDetails, GitSignature, Pull, PullCommit,
};
pub use jira::{JiraFields, JiraIssue, JiraUser, NamedField};

/// A cacheable entity with a natural key.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection this entity is stored in.
    const ENTITY_TYPE: EntityType;

    /// Identifier that is unique within the collection.
    fn natural_key(&self) -> String;

    /// Key of the owning entity, for child collections.
    fn parent_key(&self) -> Option<String> {
        None
    }

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    /// Timestamp compared against the sync watermark while fetching.
    ///
    /// `None` means the entity is never cut off and its listing is always
    /// fetched in full.
    fn cutoff_at(&self) -> Option<DateTime<Utc>> {
        Some(self.updated_at())
    }
}

/// Whether `item` is at least as new as the watermark `from`.
///
/// With no watermark everything is fresh.
pub fn is_fresh<T: Document>(item: &T, from: Option<DateTime<Utc>>) -> bool {
    match (from, item.cutoff_at()) {
        (Some(from), Some(at)) => at >= from,
        _ => true,
    }
}
