//! Response envelopes of list endpoints that do not return a bare array.

use serde::Deserialize;

use crate::model::{ActionRun, ActionWorkflow};

/// `GET /repos/{owner}/{repo}/actions/runs`
#[derive(Debug, Deserialize)]
pub struct ActionRunList {
    pub total_count: u64,
    pub workflow_runs: Vec<ActionRun>,
}

/// `GET /repos/{owner}/{repo}/actions/workflows`
#[derive(Debug, Deserialize)]
pub struct ActionWorkflowList {
    pub total_count: u64,
    pub workflows: Vec<ActionWorkflow>,
}
