use std::sync::Arc;

use tributary::sync::{ProgressCallback, SyncProgress};

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SyncProgress) {
        match event {
            SyncProgress::SyncStarted { entity_type, from } => match from {
                Some(from) => tracing::info!(%entity_type, from = %from, "Syncing changes"),
                None => tracing::info!(%entity_type, "Syncing everything"),
            },

            SyncProgress::SyncFinished {
                entity_type,
                synced,
            } => {
                tracing::info!(%entity_type, synced, "Synced");
            }

            SyncProgress::Pull { pull } => {
                tracing::debug!(number = pull.number, title = %pull.title, "Pull");
            }

            SyncProgress::Commit { commit } => {
                tracing::debug!(sha = %commit.sha, "Commit");
            }

            SyncProgress::PullCommit { pull_commit } => {
                tracing::debug!(
                    pull = pull_commit.pull_number,
                    sha = %pull_commit.commit.sha,
                    "Pull commit"
                );
            }

            SyncProgress::ActionRun { run } => {
                tracing::debug!(run = run.id, status = ?run.status, "Action run");
            }

            SyncProgress::ActionWorkflow { workflow } => {
                tracing::debug!(workflow = %workflow.name, "Action workflow");
            }

            SyncProgress::JiraIssue { issue } => {
                tracing::debug!(key = %issue.key, summary = %issue.fields.summary, "Issue");
            }

            _ => {}
        }
    }

    /// Wrap the reporter as a library progress callback.
    pub fn into_callback(self) -> Arc<ProgressCallback> {
        Arc::new(Box::new(move |event| self.handle(event)))
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
