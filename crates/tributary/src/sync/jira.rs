use sea_orm::DatabaseConnection;

use crate::cache::{self, CacheError, DocumentQuery, sync_info};
use crate::clock::{Clock, system_clock};
use crate::entity::entity_type::EntityType;
use crate::entity::sync_info::Model as SyncInfoModel;
use crate::model::JiraIssue;

use super::engine::run_sync;
use super::error::SyncError;
use super::source::JiraSource;
use super::types::{SyncOptions, SyncOutcome};

/// Syncs the issues matching one Jira query into its cache.
pub struct JiraSyncer<S> {
    source: S,
    db: DatabaseConnection,
    clock: Clock,
}

impl<S: JiraSource> JiraSyncer<S> {
    pub fn new(source: S, db: DatabaseConnection) -> Self {
        Self {
            source,
            db,
            clock: system_clock(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    #[tracing::instrument(skip_all, fields(entity_type = "jira_issue"))]
    pub async fn sync_issues(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncOutcome<JiraIssue>, SyncError> {
        run_sync(&self.db, &self.clock, options, |from| self.source.issues(from)).await
    }

    pub async fn find_issues(&self, query: &DocumentQuery) -> Result<Vec<JiraIssue>, CacheError> {
        cache::find(&self.db, query).await
    }

    pub async fn find_latest_sync(
        &self,
        include_unfinished: bool,
    ) -> Result<Option<SyncInfoModel>, CacheError> {
        sync_info::find_latest(&self.db, EntityType::JiraIssue, include_unfinished).await
    }
}
