//! Tag identifying which kind of entity a cached row holds.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Every kind of entity the sync engine caches.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// GitHub pull request.
    #[sea_orm(string_value = "pull")]
    Pull,
    /// Commit on the default branch.
    #[sea_orm(string_value = "commit")]
    Commit,
    /// Commit belonging to a pull request.
    #[sea_orm(string_value = "pull_commit")]
    PullCommit,
    /// GitHub Actions workflow run.
    #[sea_orm(string_value = "action_run")]
    ActionRun,
    /// GitHub Actions workflow definition.
    #[sea_orm(string_value = "action_workflow")]
    ActionWorkflow,
    /// Jira issue.
    #[sea_orm(string_value = "jira_issue")]
    JiraIssue,
}

impl EntityType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Pull => "pull",
            EntityType::Commit => "commit",
            EntityType::PullCommit => "pull_commit",
            EntityType::ActionRun => "action_run",
            EntityType::ActionWorkflow => "action_workflow",
            EntityType::JiraIssue => "jira_issue",
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pull" => Ok(EntityType::Pull),
            "commit" => Ok(EntityType::Commit),
            "pull_commit" => Ok(EntityType::PullCommit),
            "action_run" => Ok(EntityType::ActionRun),
            "action_workflow" => Ok(EntityType::ActionWorkflow),
            "jira_issue" => Ok(EntityType::JiraIssue),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}
