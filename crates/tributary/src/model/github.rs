use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Document;
use crate::entity::entity_type::EntityType;

/// A GitHub account reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
    #[serde(default)]
    pub id: Option<u64>,
}

/// A pull request as returned by the pulls listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pull {
    pub id: u64,
    pub number: u64,
    pub state: String,
    pub title: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub user: Option<Actor>,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl Document for Pull {
    const ENTITY_TYPE: EntityType = EntityType::Pull;

    fn natural_key(&self) -> String {
        self.number.to_string()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Author or committer line of a git commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSignature {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetails {
    pub message: String,
    pub author: GitSignature,
    pub committer: GitSignature,
}

/// A commit as returned by the commits listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub html_url: String,
    pub commit: CommitDetails,
    /// GitHub account of the author, absent when the email is unlinked.
    #[serde(default)]
    pub author: Option<Actor>,
    #[serde(default)]
    pub committer: Option<Actor>,
}

impl Document for Commit {
    const ENTITY_TYPE: EntityType = EntityType::Commit;

    fn natural_key(&self) -> String {
        self.sha.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.commit.author.date
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.commit.committer.date
    }
}

/// A commit that belongs to a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullCommit {
    pub pull_number: u64,
    pub commit: Commit,
}

impl Document for PullCommit {
    const ENTITY_TYPE: EntityType = EntityType::PullCommit;

    fn natural_key(&self) -> String {
        format!("{}:{}", self.pull_number, self.commit.sha)
    }

    fn parent_key(&self) -> Option<String> {
        Some(self.pull_number.to_string())
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.commit.created_at()
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.commit.updated_at()
    }

    fn cutoff_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// A GitHub Actions workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRun {
    pub id: u64,
    pub node_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub head_branch: Option<String>,
    pub head_sha: String,
    pub event: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    pub workflow_id: u64,
    pub run_number: u64,
    #[serde(default)]
    pub run_attempt: Option<u64>,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
}

impl Document for ActionRun {
    const ENTITY_TYPE: EntityType = EntityType::ActionRun;

    fn natural_key(&self) -> String {
        self.node_id.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Runs are listed newest-created first.
    fn cutoff_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

/// A GitHub Actions workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionWorkflow {
    pub id: u64,
    pub node_id: String,
    pub name: String,
    pub path: String,
    pub state: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for ActionWorkflow {
    const ENTITY_TYPE: EntityType = EntityType::ActionWorkflow;

    fn natural_key(&self) -> String {
        self.node_id.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn cutoff_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}
