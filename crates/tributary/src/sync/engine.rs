//! The per-entity sync loop shared by every syncer.
//!
//! 1. The watermark is the later of the caller's `newer_than` and the finish
//!    time of the last finished sync of the same entity type.
//! 2. An unfinished marker is written before anything is fetched.
//! 3. Items are upserted one by one as the stream yields them.
//! 4. The marker is stamped finished only after the stream is exhausted.
//!
//! A failure or abort leaves the unfinished marker and every item written
//! so far in place. Because unfinished markers never move the watermark,
//! the next sync re-fetches from the last finished one.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sea_orm::DatabaseConnection;

use crate::cache::{self, CacheError, sync_info};
use crate::clock::Clock;
use crate::entity::entity_type::EntityType;
use crate::entity::sync_info::Model as SyncInfoModel;
use crate::fetch::FetchError;
use crate::model::Document;

use super::error::SyncError;
use super::progress::{SyncProgress, emit};
use super::source::EntityStream;
use super::types::{SyncOptions, SyncOutcome};

/// A sync that has written its unfinished marker.
pub(crate) struct Started {
    pub entity_type: EntityType,
    pub from: Option<DateTime<Utc>>,
    marker: SyncInfoModel,
}

/// Compute the watermark for `entity_type`.
pub(crate) async fn watermark(
    db: &DatabaseConnection,
    entity_type: EntityType,
    newer_than: Option<DateTime<Utc>>,
) -> Result<Option<DateTime<Utc>>, CacheError> {
    let last_finished = sync_info::find_latest(db, entity_type, false)
        .await?
        .and_then(|info| info.updated_at_utc());

    Ok(newer_than.max(last_finished))
}

/// Steps 1 and 2: resolve the watermark and record the unfinished marker.
pub(crate) async fn start(
    db: &DatabaseConnection,
    clock: &Clock,
    options: &SyncOptions,
    entity_type: EntityType,
) -> Result<Started, SyncError> {
    let cache_err = |source| SyncError::Cache {
        entity_type,
        committed: 0,
        source,
    };

    let from = watermark(db, entity_type, options.newer_than)
        .await
        .map_err(cache_err)?;
    let marker = sync_info::begin(db, entity_type, clock())
        .await
        .map_err(cache_err)?;

    tracing::info!(%entity_type, from = ?from, "Sync started");
    emit(
        options.progress.as_deref(),
        SyncProgress::SyncStarted { entity_type, from },
    );

    Ok(Started {
        entity_type,
        from,
        marker,
    })
}

/// Step 4: stamp the marker finished.
pub(crate) async fn finish<T>(
    db: &DatabaseConnection,
    clock: &Clock,
    options: &SyncOptions,
    started: Started,
    synced_items: Vec<T>,
) -> Result<SyncOutcome<T>, SyncError> {
    let entity_type = started.entity_type;
    let committed = synced_items.len();

    let finished = sync_info::finish(db, started.marker.id, clock())
        .await
        .map_err(|source| SyncError::Cache {
            entity_type,
            committed,
            source,
        })?;
    let synced_at = finished.updated_at_utc().unwrap_or_else(|| clock());

    tracing::info!(%entity_type, synced = committed, "Sync finished");
    emit(
        options.progress.as_deref(),
        SyncProgress::SyncFinished {
            entity_type,
            synced: committed,
        },
    );

    Ok(SyncOutcome {
        synced_at,
        synced_items,
    })
}

/// Fail with [`SyncError::Aborted`] if the caller's signal fired.
pub(crate) fn check_abort(
    options: &SyncOptions,
    entity_type: EntityType,
    committed: usize,
) -> Result<(), SyncError> {
    if options.is_aborted() {
        tracing::info!(%entity_type, committed, "Sync aborted");
        return Err(SyncError::Aborted {
            entity_type,
            committed,
        });
    }
    Ok(())
}

pub(crate) fn fetch_failed(entity_type: EntityType, committed: usize, source: FetchError) -> SyncError {
    tracing::warn!(%entity_type, committed, error = %source, "Sync failed while fetching");
    SyncError::Fetch {
        entity_type,
        committed,
        source,
    }
}

pub(crate) fn cache_failed(entity_type: EntityType, committed: usize, source: CacheError) -> SyncError {
    tracing::warn!(%entity_type, committed, error = %source, "Sync failed while writing");
    SyncError::Cache {
        entity_type,
        committed,
        source,
    }
}

/// Upsert one fetched item and report it.
pub(crate) async fn commit_item<T>(
    db: &DatabaseConnection,
    options: &SyncOptions,
    item: &T,
    committed: usize,
) -> Result<(), SyncError>
where
    T: Document,
    SyncProgress: From<T>,
{
    cache::upsert(db, item)
        .await
        .map_err(|source| cache_failed(T::ENTITY_TYPE, committed, source))?;
    emit(options.progress.as_deref(), SyncProgress::from(item.clone()));
    Ok(())
}

/// Run a full sync of `T`, pulling items from the stream `open` returns for
/// the resolved watermark.
pub(crate) async fn run_sync<'s, T, F>(
    db: &DatabaseConnection,
    clock: &Clock,
    options: &SyncOptions,
    open: F,
) -> Result<SyncOutcome<T>, SyncError>
where
    T: Document,
    SyncProgress: From<T>,
    F: FnOnce(Option<DateTime<Utc>>) -> EntityStream<'s, T>,
{
    let started = start(db, clock, options, T::ENTITY_TYPE).await?;
    let entity_type = started.entity_type;

    let mut stream = open(started.from);
    let mut synced = Vec::new();

    loop {
        check_abort(options, entity_type, synced.len())?;

        let Some(item) = stream
            .try_next()
            .await
            .map_err(|source| fetch_failed(entity_type, synced.len(), source))?
        else {
            break;
        };

        commit_item(db, options, &item, synced.len()).await?;
        synced.push(item);
    }

    finish(db, clock, options, started, synced).await
}

#[cfg(all(test, feature = "sqlite", feature = "migrate"))]
mod tests {
    use super::*;
    use crate::clock::fixed_clock;
    use crate::connect_and_migrate;
    use chrono::TimeZone;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn watermark_prefers_the_later_bound() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        assert_eq!(watermark(&db, EntityType::Pull, None).await.expect("wm"), None);

        let marker = sync_info::begin(&db, EntityType::Pull, at(2010)).await.expect("begin");
        sync_info::finish(&db, marker.id, at(2011)).await.expect("finish");
        sync_info::begin(&db, EntityType::Pull, at(2020)).await.expect("unfinished");

        assert_eq!(
            watermark(&db, EntityType::Pull, None).await.expect("wm"),
            Some(at(2011))
        );
        assert_eq!(
            watermark(&db, EntityType::Pull, Some(at(2005))).await.expect("wm"),
            Some(at(2011))
        );
        assert_eq!(
            watermark(&db, EntityType::Pull, Some(at(2015))).await.expect("wm"),
            Some(at(2015))
        );
    }

    #[tokio::test]
    async fn start_writes_an_unfinished_marker() {
        let db = connect_and_migrate("sqlite::memory:").await.expect("db");
        let clock = fixed_clock(at(2024));

        let started = start(&db, &clock, &SyncOptions::default(), EntityType::Commit)
            .await
            .expect("start");
        assert_eq!(started.from, None);

        let latest = sync_info::find_latest(&db, EntityType::Commit, true)
            .await
            .expect("query")
            .expect("marker");
        assert_eq!(latest.created_at_utc(), at(2024));
        assert!(!latest.is_finished());
    }
}
