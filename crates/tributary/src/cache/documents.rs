use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::document::{ActiveModel, Column, Entity as DocumentEntity, Model};
use crate::model::Document;

use super::errors::{CacheError, Result};
use super::query::DocumentQuery;

/// Number of retry attempts for a write that hit a locked database.
pub const DEFAULT_WRITE_RETRIES: usize = 3;

/// Initial backoff delay in milliseconds for write retries.
pub const DEFAULT_WRITE_BACKOFF_MS: u64 = 100;

fn to_active_model<T: Document>(item: &T) -> Result<ActiveModel> {
    let payload = serde_json::to_value(item).map_err(|source| CacheError::Encode {
        entity_type: T::ENTITY_TYPE,
        source,
    })?;

    Ok(ActiveModel {
        id: Set(Uuid::new_v4()),
        entity_type: Set(T::ENTITY_TYPE),
        natural_key: Set(item.natural_key()),
        parent_key: Set(item.parent_key()),
        created_at: Set(item.created_at().fixed_offset()),
        updated_at: Set(item.updated_at().fixed_offset()),
        payload: Set(payload),
        cached_at: Set(Utc::now().fixed_offset()),
    })
}

fn decode<T: Document>(model: Model) -> Result<T> {
    serde_json::from_value(model.payload).map_err(|source| CacheError::Decode {
        entity_type: T::ENTITY_TYPE,
        key: model.natural_key,
        source,
    })
}

/// Find cached documents of type `T`, most recently updated first.
pub async fn find<T: Document>(db: &DatabaseConnection, query: &DocumentQuery) -> Result<Vec<T>> {
    DocumentEntity::find()
        .filter(query.condition(T::ENTITY_TYPE))
        .order_by_desc(Column::UpdatedAt)
        .order_by_asc(Column::NaturalKey)
        .all(db)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

/// Count cached documents of type `T` matching `query`.
pub async fn count<T: Document>(db: &DatabaseConnection, query: &DocumentQuery) -> Result<u64> {
    Ok(DocumentEntity::find()
        .filter(query.condition(T::ENTITY_TYPE))
        .count(db)
        .await?)
}

/// Insert a document without checking for an existing row.
pub async fn insert<T: Document>(db: &DatabaseConnection, item: &T) -> Result<()> {
    to_active_model(item)?.insert(db).await?;
    Ok(())
}

/// Delete documents of type `T` matching `query`.
///
/// Returns the number of rows deleted.
pub async fn delete_many<T: Document>(
    db: &DatabaseConnection,
    query: &DocumentQuery,
) -> Result<u64> {
    delete_matching::<T, _>(db, query).await
}

async fn delete_matching<T: Document, C: ConnectionTrait>(
    conn: &C,
    query: &DocumentQuery,
) -> Result<u64> {
    let result = DocumentEntity::delete_many()
        .filter(query.condition(T::ENTITY_TYPE))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Replace the cached document with the same natural key, or insert it.
///
/// The delete and the insert run in one transaction, so readers never see
/// the key missing or duplicated. Transient lock errors are retried.
pub async fn upsert<T: Document>(db: &DatabaseConnection, item: &T) -> Result<()> {
    let model = to_active_model(item)?;
    let key = item.natural_key();

    (|| async {
        let txn = db.begin().await?;
        delete_matching::<T, _>(&txn, &DocumentQuery::by_key(key.clone())).await?;
        model.clone().insert(&txn).await?;
        txn.commit().await?;
        Ok::<_, CacheError>(())
    })
    .retry(write_backoff())
    .when(CacheError::is_retryable)
    .notify(|err, dur| {
        tracing::warn!(
            entity_type = %T::ENTITY_TYPE,
            key = %key,
            backoff_ms = dur.as_millis() as u64,
            error = %err,
            "Upsert failed, retrying"
        );
    })
    .await
}

/// Replace every child of `parent_key` with `items`.
///
/// Children that are no longer present upstream are removed. Returns the
/// number of rows written.
pub async fn replace_children<T: Document>(
    db: &DatabaseConnection,
    parent_key: &str,
    items: &[T],
) -> Result<u64> {
    let models = items.iter().map(to_active_model).collect::<Result<Vec<_>>>()?;
    let count = models.len() as u64;

    (|| async {
        let txn = db.begin().await?;
        let removed =
            delete_matching::<T, _>(&txn, &DocumentQuery::by_parent(parent_key)).await?;
        if !models.is_empty() {
            DocumentEntity::insert_many(models.clone()).exec(&txn).await?;
        }
        txn.commit().await?;
        tracing::debug!(
            entity_type = %T::ENTITY_TYPE,
            parent_key,
            removed,
            inserted = count,
            "Replaced children"
        );
        Ok::<_, CacheError>(count)
    })
    .retry(write_backoff())
    .when(CacheError::is_retryable)
    .await
}

fn write_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(DEFAULT_WRITE_BACKOFF_MS))
        .with_max_times(DEFAULT_WRITE_RETRIES)
}
