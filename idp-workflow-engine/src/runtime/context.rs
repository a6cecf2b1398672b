//! Per-run execution context handed to workflow functions.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use idp_shared::metrics::observe_workflow_retries;

use super::retry::RetryPolicy;
use super::signals::SignalHub;
use super::store::{RunStore, RunStoreError};
use super::WorkflowError;

/// Drives one workflow instance: executes activities with retry and
/// checkpointing, and mediates signal waits. Workflow functions receive this
/// by reference and stay free of store, clock and transport concerns.
pub struct WorkflowContext {
    run_id: String,
    workflow: &'static str,
    store: Arc<dyn RunStore>,
    signals: SignalHub,
    retry: RetryPolicy,
}

impl WorkflowContext {
    pub fn new(
        run_id: String,
        workflow: &'static str,
        store: Arc<dyn RunStore>,
        signals: SignalHub,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            run_id,
            workflow,
            store,
            signals,
            retry,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn workflow(&self) -> &'static str {
        self.workflow
    }

    /// Runs one named activity.
    ///
    /// Already-checkpointed steps are skipped, which is what makes a resumed
    /// run safe: re-executing the workflow function replays instantly up to
    /// the first unfinished step. Retriable failures consume attempts under
    /// the policy; non-retriable failures abort immediately.
    pub async fn activity<F, Fut>(&self, step: &str, op: F) -> Result<(), WorkflowError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), WorkflowError>>,
    {
        if self.step_complete(step).await? {
            debug!(
                workflow = self.workflow,
                run_id = %self.run_id,
                step,
                "skipping already-completed step"
            );
            return Ok(());
        }

        let mut attempt: u32 = 1;
        loop {
            if attempt > 1 {
                observe_workflow_retries(self.workflow, 1);
            }

            let outcome = tokio::time::timeout(self.retry.start_to_close_timeout, op()).await;
            let result = match outcome {
                Ok(result) => result,
                Err(_) => Err(WorkflowError::retryable(format!(
                    "activity {step} exceeded start-to-close timeout"
                ))),
            };

            match result {
                Ok(()) => {
                    self.checkpoint(step).await?;
                    return Ok(());
                }
                Err(err @ WorkflowError::NonRetryable { .. }) => {
                    warn!(
                        workflow = self.workflow,
                        run_id = %self.run_id,
                        step,
                        error = %err,
                        "activity failed non-retriably"
                    );
                    return Err(err);
                }
                Err(WorkflowError::Retryable { message }) => {
                    if attempt >= self.retry.maximum_attempts {
                        return Err(WorkflowError::retryable(format!(
                            "activity {step} failed after {attempt} attempts: {message}"
                        )));
                    }
                    let backoff = self.retry.backoff_interval(attempt);
                    warn!(
                        workflow = self.workflow,
                        run_id = %self.run_id,
                        step,
                        attempt,
                        backoff_secs = backoff.as_secs(),
                        error = %message,
                        "activity failed; retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Blocks until the named signal arrives or `timeout` elapses. A timeout
    /// is a non-retriable failure with the given error type. A consumed wait
    /// is checkpointed like an activity so resumed runs do not wait again.
    pub async fn wait_for_signal(
        &self,
        signal: &str,
        timeout: Duration,
        timeout_error_type: &str,
        timeout_message: &str,
    ) -> Result<(), WorkflowError> {
        let step = format!("wait:{signal}");
        if self.step_complete(&step).await? {
            debug!(
                workflow = self.workflow,
                run_id = %self.run_id,
                signal,
                "skipping already-consumed signal wait"
            );
            return Ok(());
        }

        debug!(
            workflow = self.workflow,
            run_id = %self.run_id,
            signal,
            timeout_secs = timeout.as_secs(),
            "waiting for signal"
        );

        if self.signals.wait(&self.run_id, signal, timeout).await {
            self.checkpoint(&step).await?;
            Ok(())
        } else {
            Err(WorkflowError::non_retryable(
                timeout_error_type,
                timeout_message,
            ))
        }
    }

    async fn step_complete(&self, step: &str) -> Result<bool, WorkflowError> {
        self.store
            .is_step_complete(&self.run_id, step)
            .await
            .map_err(store_failure)
    }

    async fn checkpoint(&self, step: &str) -> Result<(), WorkflowError> {
        self.store
            .record_step(&self.run_id, step)
            .await
            .map_err(store_failure)
    }
}

fn store_failure(err: RunStoreError) -> WorkflowError {
    WorkflowError::retryable(format!("run store failure: {err}"))
}
