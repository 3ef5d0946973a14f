//! Where synced entities come from.
//!
//! The orchestrator only sees these traits, so tests can drive it with
//! scripted streams instead of HTTP.

use chrono::{DateTime, Utc};
use futures::future;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};

use crate::fetch::FetchError;
use crate::model::{
    ActionRun, ActionWorkflow, Commit, Document, JiraIssue, Pull, PullCommit, is_fresh,
};

/// Lazy stream of fetched entities.
pub type EntityStream<'a, T> = BoxStream<'a, Result<T, FetchError>>;

/// Entity streams of one GitHub repository.
///
/// Streams taking `since` end at the first item older than it.
pub trait GitHubSource: Send + Sync {
    fn pulls(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, Pull>;

    fn commits(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, Commit>;

    /// Every commit of one pull request.
    fn pull_commits(&self, pull_number: u64) -> EntityStream<'_, PullCommit>;

    fn action_runs(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, ActionRun>;

    fn action_workflows(&self) -> EntityStream<'_, ActionWorkflow>;
}

/// Entity streams of one Jira account.
pub trait JiraSource: Send + Sync {
    fn issues(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, JiraIssue>;
}

/// End `items` at the first entity older than `since`.
///
/// Listings are assumed newest first, so nothing after a stale item can be
/// fresh. The underlying stream is not polled again, which stops pagination.
pub fn newer_than<'a, T, S>(items: S, since: Option<DateTime<Utc>>) -> EntityStream<'a, T>
where
    T: Document,
    S: Stream<Item = Result<T, FetchError>> + Send + 'a,
{
    items
        .try_take_while(move |item| future::ready(Ok(is_fresh(item, since))))
        .boxed()
}
