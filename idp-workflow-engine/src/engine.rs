//! # Workflow Engine
//!
//! Hosts the fixed set of named workflows: starts instances, re-spawns
//! non-terminal runs after a restart, routes signals, and reports the
//! per-run observability contract (run duration, domain events, retries).

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info};

use idp_shared::metrics::{observe_domain_event, observe_workflow_duration};

use crate::ports::{
    AppEnvProvisioningProvider, ApplicationOnboardingPort, ControlPlaneApi, GitProvider,
    SecretBindingsRotationPort, SecretRotationPort,
};
use crate::runtime::{
    RetryPolicy, RunFailure, RunStatus, RunStore, RunStoreError, SignalHub, WorkflowContext,
    WorkflowError, WorkflowRun,
};
use crate::workflows;

/// The workflows this engine hosts. It is deliberately not extensible at
/// runtime; the engine is not a general workflow service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    ApplicationOnboarding,
    ApplicationActivation,
    ApplicationEnvironmentProvisioning,
    SecretRotation,
}

impl WorkflowKind {
    /// Stable name used as the `workflow` metric label and in run records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ApplicationOnboarding => "ApplicationOnboarding",
            Self::ApplicationActivation => "ApplicationActivation",
            Self::ApplicationEnvironmentProvisioning => "ApplicationEnvironmentProvisioning",
            Self::SecretRotation => "SecretRotation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ApplicationOnboarding" => Some(Self::ApplicationOnboarding),
            "ApplicationActivation" => Some(Self::ApplicationActivation),
            "ApplicationEnvironmentProvisioning" => Some(Self::ApplicationEnvironmentProvisioning),
            "SecretRotation" => Some(Self::SecretRotation),
            _ => None,
        }
    }

    /// Deterministic instance id: restarting the same workflow for the same
    /// subject addresses the same instance.
    pub fn instance_id(&self, subject_id: &str) -> String {
        let prefix = match self {
            Self::ApplicationOnboarding => "application-onboarding",
            Self::ApplicationActivation => "application-activation",
            Self::ApplicationEnvironmentProvisioning => "appenv-provisioning",
            Self::SecretRotation => "secret-rotation",
        };
        format!("{prefix}-{subject_id}")
    }

    /// Stem of the `domain_events_total` event emitted on termination.
    /// Activation has no stable event name in the contract.
    fn domain_event_stem(&self) -> Option<&'static str> {
        match self {
            Self::ApplicationOnboarding => Some("workflow_application_onboarding"),
            Self::ApplicationEnvironmentProvisioning => Some("workflow_appenv_provisioning"),
            Self::SecretRotation => Some("workflow_secret_rotation"),
            Self::ApplicationActivation => None,
        }
    }
}

/// Adapters for every collaborator, wired once in `main` (HTTP in production,
/// fakes in tests). Workflow code only ever sees the trait objects.
#[derive(Clone)]
pub struct EnginePorts {
    pub onboarding: Arc<dyn ApplicationOnboardingPort>,
    pub control_plane: Arc<dyn ControlPlaneApi>,
    pub secret_rotation: Arc<dyn SecretRotationPort>,
    pub git: Arc<dyn GitProvider>,
    pub appenv: Arc<dyn AppEnvProvisioningProvider>,
    pub secret_bindings: Arc<dyn SecretBindingsRotationPort>,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Environment ids the onboarding workflow declares AppEnvs for.
    pub onboarding_environment_ids: Vec<String>,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            onboarding_environment_ids: vec!["env-dev".to_string(), "env-prod".to_string()],
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Clone)]
pub struct WorkflowEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: Arc<dyn RunStore>,
    signals: SignalHub,
    ports: EnginePorts,
    config: EngineConfig,
    /// Run ids currently executing in this process; prevents double-spawn
    /// when a start request races a resume.
    active: Mutex<HashSet<String>>,
}

impl WorkflowEngine {
    pub fn new(store: Arc<dyn RunStore>, ports: EnginePorts, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                signals: SignalHub::new(),
                ports,
                config,
                active: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Starts (or re-attaches to) the workflow instance for `subject_id`.
    /// Starting an already-running instance returns its id without spawning a
    /// second execution; a terminal instance is restarted fresh.
    pub async fn start(&self, kind: WorkflowKind, subject_id: &str) -> Result<String, RunStoreError> {
        let run_id = kind.instance_id(subject_id);

        if let Some(existing) = self.inner.store.get(&run_id).await? {
            if existing.status == RunStatus::Running {
                info!(run_id = %run_id, workflow = kind.name(), "workflow already running");
                if self.inner.active.lock().contains(&run_id) {
                    return Ok(run_id);
                }
                // Known to the store but not executing here (crashed before
                // resume): re-spawn from its checkpoints.
                self.spawn(existing);
                return Ok(run_id);
            }
        }

        let run = WorkflowRun::new(run_id.clone(), kind.name(), subject_id);
        self.inner.store.put(&run).await?;
        info!(run_id = %run_id, workflow = kind.name(), subject_id, "starting workflow");
        self.spawn(run);
        Ok(run_id)
    }

    /// Re-spawns every non-terminal run. Called once at process start.
    pub async fn resume_running(&self) -> Result<usize, RunStoreError> {
        let runs = self.inner.store.list_running().await?;
        let count = runs.len();
        for run in runs {
            info!(run_id = %run.id, workflow = %run.workflow, "resuming workflow run");
            self.spawn(run);
        }
        Ok(count)
    }

    /// Delivers a named signal to a workflow instance. Returns `false` when
    /// the instance is unknown.
    pub async fn signal(&self, run_id: &str, signal: &str) -> Result<bool, RunStoreError> {
        if self.inner.store.get(run_id).await?.is_none() {
            return Ok(false);
        }
        info!(run_id, signal, "delivering signal");
        self.inner.signals.deliver(run_id, signal);
        Ok(true)
    }

    pub async fn run(&self, run_id: &str) -> Result<Option<WorkflowRun>, RunStoreError> {
        self.inner.store.get(run_id).await
    }

    fn spawn(&self, run: WorkflowRun) {
        if !self.inner.active.lock().insert(run.id.clone()) {
            return;
        }
        let engine = self.clone();
        tokio::spawn(async move {
            engine.execute(run).await;
        });
    }

    async fn execute(&self, run: WorkflowRun) {
        let result = self.dispatch(&run).await;
        let run_id = run.id.clone();

        match result {
            Ok(()) => {
                if let Err(err) = self
                    .inner
                    .store
                    .finish(&run_id, RunStatus::Completed, None)
                    .await
                {
                    error!(run_id = %run_id, error = %err, "failed to persist workflow completion");
                }
            }
            Err(ref err) => {
                let failure = RunFailure {
                    error_type: err.error_type().unwrap_or("workflow_failed").to_string(),
                    message: err.to_string(),
                };
                error!(
                    run_id = %run_id,
                    workflow = %run.workflow,
                    error_type = %failure.error_type,
                    error = %failure.message,
                    "workflow run failed"
                );
                if let Err(store_err) = self
                    .inner
                    .store
                    .finish(&run_id, RunStatus::Failed, Some(failure))
                    .await
                {
                    error!(run_id = %run_id, error = %store_err, "failed to persist workflow failure");
                }
            }
        }

        self.inner.signals.remove_run(&run_id);
        self.inner.active.lock().remove(&run_id);
    }

    /// Runs the workflow function for `run` and reports the observability
    /// contract around it.
    async fn dispatch(&self, run: &WorkflowRun) -> Result<(), WorkflowError> {
        let Some(kind) = WorkflowKind::from_name(&run.workflow) else {
            return Err(WorkflowError::non_retryable(
                "unknown_workflow",
                format!("unknown workflow: {}", run.workflow),
            ));
        };

        let ctx = WorkflowContext::new(
            run.id.clone(),
            kind.name(),
            self.inner.store.clone(),
            self.inner.signals.clone(),
            self.inner.config.retry.clone(),
        );

        let ports = &self.inner.ports;
        let started = tokio::time::Instant::now();
        let result = match kind {
            WorkflowKind::ApplicationOnboarding => {
                workflows::application_onboarding::application_onboarding(
                    &ctx,
                    ports.onboarding.as_ref(),
                    &self.inner.config.onboarding_environment_ids,
                    &run.subject_id,
                )
                .await
            }
            WorkflowKind::ApplicationActivation => {
                workflows::application_onboarding::application_activation(
                    &ctx,
                    ports.onboarding.as_ref(),
                    &run.subject_id,
                )
                .await
            }
            WorkflowKind::ApplicationEnvironmentProvisioning => {
                workflows::appenv_provisioning::application_environment_provisioning(
                    &ctx,
                    ports.git.as_ref(),
                    ports.appenv.as_ref(),
                    ports.control_plane.as_ref(),
                    &run.subject_id,
                )
                .await
            }
            WorkflowKind::SecretRotation => {
                workflows::secret_rotation::secret_rotation(
                    &ctx,
                    ports.secret_rotation.as_ref(),
                    ports.secret_bindings.as_ref(),
                    &run.subject_id,
                )
                .await
            }
        };

        let elapsed = started.elapsed().as_secs_f64();
        let result_label = if result.is_ok() { "success" } else { "error" };
        observe_workflow_duration(kind.name(), result_label, elapsed);
        if let Some(stem) = kind.domain_event_stem() {
            match &result {
                Ok(()) => observe_domain_event(&format!("{stem}_completed"), "success"),
                Err(_) => observe_domain_event(&format!("{stem}_failed"), "error"),
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_names_round_trip() {
        for kind in [
            WorkflowKind::ApplicationOnboarding,
            WorkflowKind::ApplicationActivation,
            WorkflowKind::ApplicationEnvironmentProvisioning,
            WorkflowKind::SecretRotation,
        ] {
            assert_eq!(WorkflowKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(WorkflowKind::from_name("Nope"), None);
    }

    #[test]
    fn instance_ids_are_deterministic_per_subject() {
        assert_eq!(
            WorkflowKind::ApplicationOnboarding.instance_id("app-1"),
            "application-onboarding-app-1"
        );
        assert_eq!(
            WorkflowKind::SecretRotation.instance_id("sec-1"),
            "secret-rotation-sec-1"
        );
    }
}
