//! Workflow run progress store.
//!
//! The store owns all durable orchestrator state: one row per workflow
//! instance plus the set of completed step names. Any key-addressable backend
//! satisfies the contract; the in-memory implementation below is used in
//! development and tests, and a SQL-backed variant must not change observable
//! semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Failure recorded for a terminal run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFailure {
    pub error_type: String,
    pub message: String,
}

/// Durable record of one workflow instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub id: String,
    pub workflow: String,
    pub subject_id: String,
    pub status: RunStatus,
    /// Names of activities (and consumed signal waits) that finished, in
    /// completion order. Replay skips these.
    pub completed_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<RunFailure>,
    pub started_at: DateTime<Utc>,
}

impl WorkflowRun {
    pub fn new(id: impl Into<String>, workflow: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            workflow: workflow.into(),
            subject_id: subject_id.into(),
            status: RunStatus::Running,
            completed_steps: Vec::new(),
            failure: None,
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("run store error: {0}")]
pub struct RunStoreError(pub String);

#[async_trait]
pub trait RunStore: Send + Sync {
    /// Upsert by run id.
    async fn put(&self, run: &WorkflowRun) -> Result<(), RunStoreError>;
    async fn get(&self, id: &str) -> Result<Option<WorkflowRun>, RunStoreError>;
    /// Runs to re-spawn after a restart.
    async fn list_running(&self) -> Result<Vec<WorkflowRun>, RunStoreError>;
    /// Checkpoint a finished step. Idempotent.
    async fn record_step(&self, id: &str, step: &str) -> Result<(), RunStoreError>;
    async fn is_step_complete(&self, id: &str, step: &str) -> Result<bool, RunStoreError>;
    /// Move the run to a terminal status.
    async fn finish(
        &self,
        id: &str,
        status: RunStatus,
        failure: Option<RunFailure>,
    ) -> Result<(), RunStoreError>;
}

#[derive(Default)]
pub struct MemoryRunStore {
    runs: RwLock<HashMap<String, WorkflowRun>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn put(&self, run: &WorkflowRun) -> Result<(), RunStoreError> {
        self.runs.write().await.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<WorkflowRun>, RunStoreError> {
        Ok(self.runs.read().await.get(id).cloned())
    }

    async fn list_running(&self) -> Result<Vec<WorkflowRun>, RunStoreError> {
        Ok(self
            .runs
            .read()
            .await
            .values()
            .filter(|run| run.status == RunStatus::Running)
            .cloned()
            .collect())
    }

    async fn record_step(&self, id: &str, step: &str) -> Result<(), RunStoreError> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(id)
            .ok_or_else(|| RunStoreError(format!("unknown run: {id}")))?;
        if !run.completed_steps.iter().any(|s| s == step) {
            run.completed_steps.push(step.to_string());
        }
        Ok(())
    }

    async fn is_step_complete(&self, id: &str, step: &str) -> Result<bool, RunStoreError> {
        Ok(self
            .runs
            .read()
            .await
            .get(id)
            .map(|run| run.completed_steps.iter().any(|s| s == step))
            .unwrap_or(false))
    }

    async fn finish(
        &self,
        id: &str,
        status: RunStatus,
        failure: Option<RunFailure>,
    ) -> Result<(), RunStoreError> {
        let mut runs = self.runs.write().await;
        let run = runs
            .get_mut(id)
            .ok_or_else(|| RunStoreError(format!("unknown run: {id}")))?;
        run.status = status;
        run.failure = failure;
        Ok(())
    }
}
