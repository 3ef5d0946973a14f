use std::path::PathBuf;

use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::entity::entity_type::EntityType;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A cached payload no longer matches its entity schema.
    #[error("Cached {entity_type} {key} could not be decoded: {source}")]
    Decode {
        entity_type: EntityType,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// An entity could not be serialized for storage.
    #[error("Failed to encode {entity_type} for storage: {source}")]
    Encode {
        entity_type: EntityType,
        #[source]
        source: serde_json::Error,
    },

    /// The cache directory could not be prepared.
    #[error("Cache directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sync marker to finish does not exist.
    #[error("Sync marker not found: {id}")]
    SyncNotFound { id: Uuid },
}

impl CacheError {
    /// Whether the error is transient and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            CacheError::Database(db_err) => is_retryable_db_error(db_err),
            _ => false,
        }
    }
}

fn is_retryable_db_error(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let err_str = err.to_string().to_lowercase();
            // SQLite: database is locked, busy
            err_str.contains("locked") || err_str.contains("busy") || err_str.contains("timeout")
        }
        _ => false,
    }
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
