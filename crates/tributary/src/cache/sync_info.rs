//! Sync markers.
//!
//! A marker is inserted when a sync starts and stamped with `updated_at`
//! when it finishes. Rows are never deleted, so the table doubles as the
//! sync history of each entity type.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::entity_type::EntityType;
use crate::entity::sync_info::{ActiveModel, Column, Entity as SyncInfo, Model};

use super::errors::{CacheError, Result};

/// Record the start of a sync. The returned marker is unfinished.
pub async fn begin(
    db: &DatabaseConnection,
    entity_type: EntityType,
    now: DateTime<Utc>,
) -> Result<Model> {
    let model = ActiveModel {
        id: Set(Uuid::new_v4()),
        entity_type: Set(entity_type),
        created_at: Set(now.fixed_offset()),
        updated_at: Set(None),
    };
    Ok(model.insert(db).await?)
}

/// Mark a sync as finished at `now`.
pub async fn finish(db: &DatabaseConnection, id: Uuid, now: DateTime<Utc>) -> Result<Model> {
    let existing = SyncInfo::find_by_id(id)
        .one(db)
        .await?
        .ok_or(CacheError::SyncNotFound { id })?;

    let mut model: ActiveModel = existing.into();
    model.updated_at = Set(Some(now.fixed_offset()));
    Ok(model.update(db).await?)
}

/// The most recently started sync of `entity_type`.
///
/// Unless `include_unfinished` is set, only syncs that completed are
/// considered.
pub async fn find_latest(
    db: &DatabaseConnection,
    entity_type: EntityType,
    include_unfinished: bool,
) -> Result<Option<Model>> {
    let mut query = SyncInfo::find().filter(Column::EntityType.eq(entity_type));
    if !include_unfinished {
        query = query.filter(Column::UpdatedAt.is_not_null());
    }

    Ok(query.order_by_desc(Column::CreatedAt).one(db).await?)
}

/// Every sync of `entity_type`, oldest first.
pub async fn find_all(db: &DatabaseConnection, entity_type: EntityType) -> Result<Vec<Model>> {
    Ok(SyncInfo::find()
        .filter(Column::EntityType.eq(entity_type))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use crate::connect_and_migrate;
    use chrono::TimeZone;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn latest_sync_skips_unfinished_unless_asked() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");

        for year in [2000, 2005] {
            let marker = begin(&db, EntityType::Pull, at(year)).await.expect("begin");
            finish(&db, marker.id, at(year) + chrono::Duration::minutes(5))
                .await
                .expect("finish");
        }
        begin(&db, EntityType::Pull, at(2015)).await.expect("begin");

        let finished = find_latest(&db, EntityType::Pull, false)
            .await
            .expect("query")
            .expect("finished sync");
        assert_eq!(finished.created_at_utc(), at(2005));
        assert!(finished.is_finished());

        let any = find_latest(&db, EntityType::Pull, true)
            .await
            .expect("query")
            .expect("any sync");
        assert_eq!(any.created_at_utc(), at(2015));
        assert!(!any.is_finished());
    }

    #[tokio::test]
    async fn markers_are_per_entity_type() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        begin(&db, EntityType::Commit, at(2020)).await.expect("begin");

        assert!(find_latest(&db, EntityType::Pull, true).await.expect("query").is_none());
        assert_eq!(find_all(&db, EntityType::Commit).await.expect("query").len(), 1);
    }

    #[tokio::test]
    async fn finish_unknown_marker_fails() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let err = finish(&db, Uuid::new_v4(), at(2020)).await.expect_err("missing");
        assert!(matches!(err, CacheError::SyncNotFound { .. }));
    }
}
