//! Integration tests for the on-disk cache.

#![cfg(all(feature = "sqlite", feature = "migrate"))]

mod common;

use common::{FakeRemote, at, busy_repository, pull};
use tributary::cache::{self, sync_info};
use tributary::clock::fixed_clock;
use tributary::entity::entity_type::EntityType;
use tributary::model::Pull;
use tributary::sync::{GitHubSyncer, SyncOptions};
use tributary::{CacheScope, DocumentQuery, connect_scope};

#[tokio::test]
async fn test_scoped_cache_survives_reconnect() {
    let root = tempfile::tempdir().expect("tempdir");
    let scope = CacheScope::github("acme", "widgets");

    {
        let db = connect_scope(root.path(), &scope).await.expect("open");
        let syncer = GitHubSyncer::new(FakeRemote::new(busy_repository()), db)
            .with_clock(fixed_clock(at(2024, 6, 1)));
        syncer
            .sync_pulls(&SyncOptions::default())
            .await
            .expect("sync pulls");
    }

    assert!(scope.database_path(root.path()).exists());

    let db = connect_scope(root.path(), &scope).await.expect("reopen");
    let pulls: Vec<Pull> = cache::find(&db, &DocumentQuery::all()).await.expect("find");
    assert_eq!(pulls.len(), 2);

    let marker = sync_info::find_latest(&db, EntityType::Pull, false)
        .await
        .expect("query")
        .expect("finished marker");
    assert_eq!(marker.updated_at_utc(), Some(at(2024, 6, 1)));
}

#[tokio::test]
async fn test_scopes_do_not_share_documents() {
    let root = tempfile::tempdir().expect("tempdir");
    let widgets = connect_scope(root.path(), &CacheScope::github("acme", "widgets"))
        .await
        .expect("open widgets");
    let gadgets = connect_scope(root.path(), &CacheScope::github("acme", "gadgets"))
        .await
        .expect("open gadgets");

    cache::upsert(&widgets, &pull(7, at(2024, 1, 1)))
        .await
        .expect("upsert");

    let in_gadgets: Vec<Pull> = cache::find(&gadgets, &DocumentQuery::all())
        .await
        .expect("find");
    assert!(in_gadgets.is_empty());
    assert_eq!(
        cache::count::<Pull>(&widgets, &DocumentQuery::all())
            .await
            .expect("count"),
        1
    );
}

#[tokio::test]
async fn test_sync_history_distinguishes_finished_and_unfinished() {
    let root = tempfile::tempdir().expect("tempdir");
    let db = connect_scope(root.path(), &CacheScope::jira("acme.atlassian.net", "ops"))
        .await
        .expect("open");

    let first = sync_info::begin(&db, EntityType::JiraIssue, at(2000, 1, 1))
        .await
        .expect("begin");
    sync_info::finish(&db, first.id, at(2000, 1, 2)).await.expect("finish");
    let second = sync_info::begin(&db, EntityType::JiraIssue, at(2005, 1, 1))
        .await
        .expect("begin");
    sync_info::finish(&db, second.id, at(2005, 1, 2)).await.expect("finish");
    sync_info::begin(&db, EntityType::JiraIssue, at(2015, 1, 1))
        .await
        .expect("unfinished");

    let finished = sync_info::find_latest(&db, EntityType::JiraIssue, false)
        .await
        .expect("query")
        .expect("finished");
    assert_eq!(finished.created_at_utc(), at(2005, 1, 1));

    let any = sync_info::find_latest(&db, EntityType::JiraIssue, true)
        .await
        .expect("query")
        .expect("any");
    assert_eq!(any.created_at_utc(), at(2015, 1, 1));
    assert!(!any.is_finished());

    let history = sync_info::find_all(&db, EntityType::JiraIssue)
        .await
        .expect("history");
    assert_eq!(history.len(), 3);
    assert!(
        sync_info::find_latest(&db, EntityType::Pull, true)
            .await
            .expect("query")
            .is_none()
    );
}
