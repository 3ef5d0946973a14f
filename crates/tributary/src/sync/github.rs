use futures::TryStreamExt;
use sea_orm::DatabaseConnection;

use crate::cache::{self, CacheError, DocumentQuery, sync_info};
use crate::clock::{Clock, system_clock};
use crate::entity::entity_type::EntityType;
use crate::entity::sync_info::Model as SyncInfoModel;
use crate::model::{ActionRun, ActionWorkflow, Commit, Pull, PullCommit};

use super::engine::{cache_failed, check_abort, commit_item, fetch_failed, finish, run_sync, start};
use super::error::SyncError;
use super::progress::{SyncProgress, emit};
use super::source::GitHubSource;
use super::types::{SyncOptions, SyncOutcome};

/// Everything a [`GitHubSyncer::sync_all`] run wrote.
#[derive(Debug, Clone)]
pub struct GitHubSyncReport {
    pub pulls: SyncOutcome<Pull>,
    pub pull_commits: SyncOutcome<PullCommit>,
    pub commits: SyncOutcome<Commit>,
    pub action_runs: SyncOutcome<ActionRun>,
    pub action_workflows: SyncOutcome<ActionWorkflow>,
}

impl GitHubSyncReport {
    /// Total number of items written across entity types.
    pub fn total_items(&self) -> usize {
        self.pulls.synced_items.len()
            + self.pull_commits.synced_items.len()
            + self.commits.synced_items.len()
            + self.action_runs.synced_items.len()
            + self.action_workflows.synced_items.len()
    }
}

/// Syncs one GitHub repository into its cache.
pub struct GitHubSyncer<S> {
    source: S,
    db: DatabaseConnection,
    clock: Clock,
}

impl<S: GitHubSource> GitHubSyncer<S> {
    pub fn new(source: S, db: DatabaseConnection) -> Self {
        Self {
            source,
            db,
            clock: system_clock(),
        }
    }

    /// Replace the clock used for sync markers.
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

    #[tracing::instrument(skip_all, fields(entity_type = "pull"))]
    pub async fn sync_pulls(&self, options: &SyncOptions) -> Result<SyncOutcome<Pull>, SyncError> {
        run_sync(&self.db, &self.clock, options, |from| self.source.pulls(from)).await
    }

    #[tracing::instrument(skip_all, fields(entity_type = "commit"))]
    pub async fn sync_commits(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncOutcome<Commit>, SyncError> {
        run_sync(&self.db, &self.clock, options, |from| self.source.commits(from)).await
    }

    #[tracing::instrument(skip_all, fields(entity_type = "action_run"))]
    pub async fn sync_action_runs(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncOutcome<ActionRun>, SyncError> {
        run_sync(&self.db, &self.clock, options, |from| {
            self.source.action_runs(from)
        })
        .await
    }

    #[tracing::instrument(skip_all, fields(entity_type = "action_workflow"))]
    pub async fn sync_action_workflows(
        &self,
        options: &SyncOptions,
    ) -> Result<SyncOutcome<ActionWorkflow>, SyncError> {
        run_sync(&self.db, &self.clock, options, |_| {
            self.source.action_workflows()
        })
        .await
    }

    /// Sync the commits of each pull in `pulls`.
    ///
    /// Each pull's commit set is fetched whole and then replaces what the
    /// cache holds for that pull. If the sync stops partway through a pull,
    /// the commits already fetched for it are upserted without removing the
    /// rest.
    #[tracing::instrument(skip_all, fields(entity_type = "pull_commit", pulls = pulls.len()))]
    pub async fn sync_pull_commits(
        &self,
        pulls: &[Pull],
        options: &SyncOptions,
    ) -> Result<SyncOutcome<PullCommit>, SyncError> {
        let started = start(&self.db, &self.clock, options, EntityType::PullCommit).await?;
        let mut synced: Vec<PullCommit> = Vec::new();

        for pull in pulls {
            check_abort(options, EntityType::PullCommit, synced.len())?;

            let mut stream = self.source.pull_commits(pull.number);
            let mut fetched: Vec<PullCommit> = Vec::new();
            let interrupted = loop {
                match stream.try_next().await {
                    Ok(Some(item)) => {
                        fetched.push(item);
                        if options.is_aborted() {
                            break Some(None);
                        }
                    }
                    Ok(None) => break None,
                    Err(source) => break Some(Some(source)),
                }
            };

            if let Some(failure) = interrupted {
                for item in fetched {
                    commit_item(&self.db, options, &item, synced.len()).await?;
                    synced.push(item);
                }
                return Err(match failure {
                    Some(source) => fetch_failed(EntityType::PullCommit, synced.len(), source),
                    None => SyncError::Aborted {
                        entity_type: EntityType::PullCommit,
                        committed: synced.len(),
                    },
                });
            }

            cache::replace_children(&self.db, &pull.number.to_string(), &fetched)
                .await
                .map_err(|source| cache_failed(EntityType::PullCommit, synced.len(), source))?;
            tracing::debug!(pull = pull.number, commits = fetched.len(), "Synced pull commits");

            for item in fetched {
                emit(options.progress.as_deref(), SyncProgress::from(item.clone()));
                synced.push(item);
            }
        }

        finish(&self.db, &self.clock, options, started, synced).await
    }

    /// Sync every entity type of the repository.
    ///
    /// Pulls and then their commits run as one chain; commits, action runs
    /// and action workflows run alongside it. Each branch runs to its own
    /// completion or failure, so one entity type failing leaves the others
    /// synced and marked finished. The call then fails with the abort if any
    /// branch was aborted, otherwise with the first failure in branch order.
    #[tracing::instrument(skip_all)]
    pub async fn sync_all(&self, options: &SyncOptions) -> Result<GitHubSyncReport, SyncError> {
        let pull_chain = async {
            let pulls = self.sync_pulls(options).await?;
            let pull_commits = self
                .sync_pull_commits(&pulls.synced_items, options)
                .await?;
            Ok::<_, SyncError>((pulls, pull_commits))
        };

        let (pull_chain, commits, action_runs, action_workflows) = tokio::join!(
            pull_chain,
            self.sync_commits(options),
            self.sync_action_runs(options),
            self.sync_action_workflows(options),
        );

        let aborted = first_abort([
            pull_chain.as_ref().err(),
            commits.as_ref().err(),
            action_runs.as_ref().err(),
            action_workflows.as_ref().err(),
        ]);
        if let Some(aborted) = aborted {
            return Err(aborted);
        }

        let (pulls, pull_commits) = pull_chain?;
        Ok(GitHubSyncReport {
            pulls,
            pull_commits,
            commits: commits?,
            action_runs: action_runs?,
            action_workflows: action_workflows?,
        })
    }

    pub async fn find_pulls(&self, query: &DocumentQuery) -> Result<Vec<Pull>, CacheError> {
        cache::find(&self.db, query).await
    }

    pub async fn find_commits(&self, query: &DocumentQuery) -> Result<Vec<Commit>, CacheError> {
        cache::find(&self.db, query).await
    }

    pub async fn find_pull_commits(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<PullCommit>, CacheError> {
        cache::find(&self.db, query).await
    }

    pub async fn find_action_runs(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<ActionRun>, CacheError> {
        cache::find(&self.db, query).await
    }

    pub async fn find_action_workflows(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<ActionWorkflow>, CacheError> {
        cache::find(&self.db, query).await
    }

    /// Latest sync marker of `entity_type`; see [`sync_info::find_latest`].
    pub async fn find_latest_sync(
        &self,
        entity_type: EntityType,
        include_unfinished: bool,
    ) -> Result<Option<SyncInfoModel>, CacheError> {
        sync_info::find_latest(&self.db, entity_type, include_unfinished).await
    }
}

/// The abort among the branch failures of a `sync_all` run, if any.
fn first_abort<'a>(failures: impl IntoIterator<Item = Option<&'a SyncError>>) -> Option<SyncError> {
    failures
        .into_iter()
        .flatten()
        .find_map(|failure| match failure {
            SyncError::Aborted {
                entity_type,
                committed,
            } => Some(SyncError::Aborted {
                entity_type: *entity_type,
                committed: *committed,
            }),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;

    fn fetch_failure(entity_type: EntityType) -> SyncError {
        SyncError::Fetch {
            entity_type,
            committed: 2,
            source: FetchError::Status {
                status: 502,
                url: "https://api.github.com/repos/acme/widgets/commits".to_string(),
                body: String::new(),
            },
        }
    }

    #[test]
    fn test_first_abort_ignores_other_failures() {
        let commits = fetch_failure(EntityType::Commit);
        assert!(first_abort([None, Some(&commits), None]).is_none());
    }

    #[test]
    fn test_first_abort_is_found_behind_a_fetch_failure() {
        let commits = fetch_failure(EntityType::Commit);
        let runs = SyncError::Aborted {
            entity_type: EntityType::ActionRun,
            committed: 1,
        };

        let aborted = first_abort([None, Some(&commits), Some(&runs)]).expect("abort");
        assert!(aborted.is_aborted());
        assert_eq!(aborted.entity_type(), EntityType::ActionRun);
        assert_eq!(aborted.committed(), 1);
    }
}
