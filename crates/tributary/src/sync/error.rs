use thiserror::Error;

use crate::cache::CacheError;
use crate::entity::entity_type::EntityType;
use crate::fetch::FetchError;

/// Why a sync stopped before finishing.
///
/// Every variant carries the number of items already committed to the
/// cache; those writes are never rolled back.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching from the remote API failed.
    #[error("{entity_type} sync failed after {committed} items: {source}")]
    Fetch {
        entity_type: EntityType,
        committed: usize,
        #[source]
        source: FetchError,
    },

    /// Reading or writing the cache failed.
    #[error("{entity_type} sync failed after {committed} items: {source}")]
    Cache {
        entity_type: EntityType,
        committed: usize,
        #[source]
        source: CacheError,
    },

    /// The abort signal fired.
    #[error("{entity_type} sync aborted after {committed} items")]
    Aborted {
        entity_type: EntityType,
        committed: usize,
    },
}

impl SyncError {
    /// Whether the sync was cancelled rather than failed.
    pub fn is_aborted(&self) -> bool {
        matches!(self, SyncError::Aborted { .. })
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            SyncError::Fetch { entity_type, .. }
            | SyncError::Cache { entity_type, .. }
            | SyncError::Aborted { entity_type, .. } => *entity_type,
        }
    }

    /// Items written before the sync stopped.
    pub fn committed(&self) -> usize {
        match self {
            SyncError::Fetch { committed, .. }
            | SyncError::Cache { committed, .. }
            | SyncError::Aborted { committed, .. } => *committed,
        }
    }

    /// Short label for the kind of failure.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Fetch { source, .. } => match source {
                FetchError::Transport(_) => "transport",
                FetchError::Status { .. } => "http status",
                FetchError::Schema { .. } => "schema",
                FetchError::PageLimit { .. } => "page limit",
            },
            SyncError::Cache { .. } => "cache",
            SyncError::Aborted { .. } => "aborted",
        }
    }
}
