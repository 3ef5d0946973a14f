//! Scripted sources and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use serde_json::json;
use tributary::entity::entity_type::EntityType;
use tributary::fetch::FetchError;
use tributary::model::{ActionRun, ActionWorkflow, Commit, Document, JiraIssue, Pull, PullCommit};
use tributary::sync::{EntityStream, GitHubSource, JiraSource, newer_than};

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn pull(number: u64, updated_at: DateTime<Utc>) -> Pull {
    serde_json::from_value(json!({
        "id": number * 1000,
        "number": number,
        "state": "open",
        "title": format!("Pull {number}"),
        "html_url": format!("https://github.com/acme/widgets/pull/{number}"),
        "created_at": "2023-01-01T00:00:00Z",
        "updated_at": updated_at.to_rfc3339(),
    }))
    .expect("valid pull")
}

pub fn commit(sha: &str, date: DateTime<Utc>) -> Commit {
    serde_json::from_value(json!({
        "sha": sha,
        "html_url": format!("https://github.com/acme/widgets/commit/{sha}"),
        "commit": {
            "message": format!("Commit {sha}"),
            "author": {"name": "Dev", "email": "dev@acme.io", "date": date.to_rfc3339()},
            "committer": {"name": "Dev", "email": "dev@acme.io", "date": date.to_rfc3339()}
        }
    }))
    .expect("valid commit")
}

pub fn action_run(id: u64, created_at: DateTime<Utc>) -> ActionRun {
    serde_json::from_value(json!({
        "id": id,
        "node_id": format!("WFR_{id}"),
        "name": "CI",
        "head_branch": "main",
        "head_sha": "abc",
        "event": "push",
        "status": "completed",
        "conclusion": "success",
        "workflow_id": 1,
        "run_number": id,
        "html_url": format!("https://github.com/acme/widgets/actions/runs/{id}"),
        "created_at": created_at.to_rfc3339(),
        "updated_at": created_at.to_rfc3339()
    }))
    .expect("valid run")
}

pub fn workflow(id: u64) -> ActionWorkflow {
    serde_json::from_value(json!({
        "id": id,
        "node_id": format!("W_{id}"),
        "name": "CI",
        "path": ".github/workflows/ci.yml",
        "state": "active",
        "html_url": "https://github.com/acme/widgets/actions/workflows/ci.yml",
        "created_at": "2022-01-01T00:00:00Z",
        "updated_at": "2022-01-01T00:00:00Z"
    }))
    .expect("valid workflow")
}

pub fn issue(key: &str, updated: DateTime<Utc>) -> JiraIssue {
    serde_json::from_value(json!({
        "id": key,
        "key": key,
        "fields": {
            "summary": format!("Issue {key}"),
            "created": "2023-01-01T00:00:00.000+0000",
            "updated": updated.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string()
        }
    }))
    .expect("valid issue")
}

pub fn stream_failure() -> FetchError {
    FetchError::Status {
        status: 502,
        url: "https://api.example.com/list".to_string(),
        body: "Bad Gateway".to_string(),
    }
}

/// Yield `items`, then fail instead of yielding item number `fail_after`.
fn scripted<'a, T: Document>(
    items: Vec<T>,
    fail_after: Option<usize>,
    since: Option<DateTime<Utc>>,
) -> EntityStream<'a, T> {
    let items: Vec<Result<T, FetchError>> = match fail_after {
        Some(n) => items
            .into_iter()
            .take(n)
            .map(Ok)
            .chain(std::iter::once(Err(stream_failure())))
            .collect(),
        None => items.into_iter().map(Ok).collect(),
    };
    newer_than(stream::iter(items), since)
}

/// What the fake remote currently serves.
#[derive(Debug, Clone, Default)]
pub struct Remote {
    pub pulls: Vec<Pull>,
    pub commits: Vec<Commit>,
    pub pull_commits: HashMap<u64, Vec<Commit>>,
    pub action_runs: Vec<ActionRun>,
    pub action_workflows: Vec<ActionWorkflow>,
    pub issues: Vec<JiraIssue>,
    /// Fail the stream of this entity type after this many items.
    pub fail: Option<(EntityType, usize)>,
    /// Pause before yielding each pull.
    pub pull_delay: Option<Duration>,
}

impl Remote {
    fn fail_after(&self, entity_type: EntityType) -> Option<usize> {
        self.fail
            .and_then(|(t, n)| (t == entity_type).then_some(n))
    }
}

/// In-memory GitHub and Jira source that records the watermark of every call.
#[derive(Debug, Default)]
pub struct FakeRemote {
    pub remote: Mutex<Remote>,
    pub calls: Mutex<Vec<(EntityType, Option<DateTime<Utc>>)>>,
}

impl FakeRemote {
    pub fn new(remote: Remote) -> Self {
        Self {
            remote: Mutex::new(remote),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn update(&self, change: impl FnOnce(&mut Remote)) {
        change(&mut self.remote.lock().expect("remote lock"));
    }

    pub fn calls_for(&self, entity_type: EntityType) -> Vec<Option<DateTime<Utc>>> {
        self.calls
            .lock()
            .expect("calls lock")
            .iter()
            .filter(|(t, _)| *t == entity_type)
            .map(|(_, since)| *since)
            .collect()
    }

    fn record(&self, entity_type: EntityType, since: Option<DateTime<Utc>>) -> Remote {
        self.calls
            .lock()
            .expect("calls lock")
            .push((entity_type, since));
        self.remote.lock().expect("remote lock").clone()
    }
}

impl GitHubSource for FakeRemote {
    fn pulls(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, Pull> {
        let remote = self.record(EntityType::Pull, since);
        let pulls = scripted(remote.pulls.clone(), remote.fail_after(EntityType::Pull), since);
        match remote.pull_delay {
            Some(delay) => pulls
                .then(move |item| async move {
                    tokio::time::sleep(delay).await;
                    item
                })
                .boxed(),
            None => pulls,
        }
    }

    fn commits(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, Commit> {
        let remote = self.record(EntityType::Commit, since);
        scripted(remote.commits.clone(), remote.fail_after(EntityType::Commit), since)
    }

    fn pull_commits(&self, pull_number: u64) -> EntityStream<'_, PullCommit> {
        let remote = self.record(EntityType::PullCommit, None);
        let commits = remote
            .pull_commits
            .get(&pull_number)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|commit| PullCommit {
                pull_number,
                commit,
            })
            .collect();
        scripted(commits, remote.fail_after(EntityType::PullCommit), None)
    }

    fn action_runs(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, ActionRun> {
        let remote = self.record(EntityType::ActionRun, since);
        scripted(
            remote.action_runs.clone(),
            remote.fail_after(EntityType::ActionRun),
            since,
        )
    }

    fn action_workflows(&self) -> EntityStream<'_, ActionWorkflow> {
        let remote = self.record(EntityType::ActionWorkflow, None);
        scripted(
            remote.action_workflows.clone(),
            remote.fail_after(EntityType::ActionWorkflow),
            None,
        )
    }
}

impl JiraSource for FakeRemote {
    fn issues(&self, since: Option<DateTime<Utc>>) -> EntityStream<'_, JiraIssue> {
        let remote = self.record(EntityType::JiraIssue, since);
        scripted(remote.issues.clone(), remote.fail_after(EntityType::JiraIssue), since)
    }
}

/// A repository with a little of everything, all updated in 2024.
pub fn busy_repository() -> Remote {
    let mut pull_commits = HashMap::new();
    pull_commits.insert(2, vec![commit("p2a", at(2024, 3, 1)), commit("p2b", at(2024, 3, 2))]);
    pull_commits.insert(1, vec![commit("p1a", at(2024, 2, 1))]);

    Remote {
        pulls: vec![pull(2, at(2024, 3, 5)), pull(1, at(2024, 2, 5))],
        commits: vec![commit("c2", at(2024, 3, 3)), commit("c1", at(2024, 1, 3))],
        pull_commits,
        action_runs: vec![action_run(11, at(2024, 3, 4)), action_run(10, at(2024, 2, 4))],
        action_workflows: vec![workflow(1)],
        issues: vec![issue("OPS-2", at(2024, 3, 6)), issue("OPS-1", at(2024, 1, 6))],
        fail: None,
        pull_delay: None,
    }
}
