//! Progress reporting types for sync operations.

use chrono::{DateTime, Utc};

use crate::entity::entity_type::EntityType;
use crate::model::{ActionRun, ActionWorkflow, Commit, JiraIssue, Pull, PullCommit};

/// Progress events emitted during sync operations.
///
/// Entity variants are emitted once per item, right after it was written to
/// the cache.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SyncProgress {
    /// A sync of `entity_type` began with the given watermark.
    SyncStarted {
        entity_type: EntityType,
        from: Option<DateTime<Utc>>,
    },

    Pull {
        pull: Box<Pull>,
    },

    Commit {
        commit: Box<Commit>,
    },

    PullCommit {
        pull_commit: Box<PullCommit>,
    },

    ActionRun {
        run: Box<ActionRun>,
    },

    ActionWorkflow {
        workflow: Box<ActionWorkflow>,
    },

    JiraIssue {
        issue: Box<JiraIssue>,
    },

    /// A sync of `entity_type` completed after writing `synced` items.
    SyncFinished {
        entity_type: EntityType,
        synced: usize,
    },
}

impl From<Pull> for SyncProgress {
    fn from(pull: Pull) -> Self {
        SyncProgress::Pull {
            pull: Box::new(pull),
        }
    }
}

impl From<Commit> for SyncProgress {
    fn from(commit: Commit) -> Self {
        SyncProgress::Commit {
            commit: Box::new(commit),
        }
    }
}

impl From<PullCommit> for SyncProgress {
    fn from(pull_commit: PullCommit) -> Self {
        SyncProgress::PullCommit {
            pull_commit: Box::new(pull_commit),
        }
    }
}

impl From<ActionRun> for SyncProgress {
    fn from(run: ActionRun) -> Self {
        SyncProgress::ActionRun { run: Box::new(run) }
    }
}

impl From<ActionWorkflow> for SyncProgress {
    fn from(workflow: ActionWorkflow) -> Self {
        SyncProgress::ActionWorkflow {
            workflow: Box::new(workflow),
        }
    }
}

impl From<JiraIssue> for SyncProgress {
    fn from(issue: JiraIssue) -> Self {
        SyncProgress::JiraIssue {
            issue: Box::new(issue),
        }
    }
}

/// Callback for progress updates during sync operations.
pub type ProgressCallback = Box<dyn Fn(SyncProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SyncProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
