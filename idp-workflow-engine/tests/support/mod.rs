//! Shared fakes for engine-level tests: one recording implementation of all
//! six ports plus an engine constructor wiring them in.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use idp_workflow_engine::engine::{EngineConfig, EnginePorts, WorkflowEngine};
use idp_workflow_engine::ports::{
    AppEnvProvisioningProvider, ApplicationOnboardingPort, ControlPlaneApi, GitProvider,
    PortError, PortResult, SecretBindingsRotationPort, SecretRotationPort,
};
use idp_workflow_engine::runtime::RunStore;

/// Implements every port, recording calls in arrival order. Individual
/// operations can be primed to fail via `fail_next`.
#[derive(Default)]
pub struct RecordingPorts {
    calls: Mutex<Vec<String>>,
    fail_next: Mutex<Vec<(String, PortError)>>,
}

impl RecordingPorts {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Prime the next invocation of `operation` to fail with `err`.
    pub fn fail_next(&self, operation: &str, err: PortError) {
        self.fail_next.lock().push((operation.to_string(), err));
    }

    fn record(&self, operation: &str, detail: &str) -> PortResult {
        self.calls.lock().push(format!("{operation}:{detail}"));
        let mut failures = self.fail_next.lock();
        if let Some(pos) = failures.iter().position(|(op, _)| op == operation) {
            let (_, err) = failures.remove(pos);
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationOnboardingPort for RecordingPorts {
    async fn declare_code_repository(&self, application_id: &str) -> PortResult {
        self.record("declare-code-repository", application_id)
    }

    async fn declare_deployment_repository(&self, application_id: &str) -> PortResult {
        self.record("declare-deployment-repository", application_id)
    }

    async fn declare_gitops_integration(&self, application_id: &str) -> PortResult {
        self.record("declare-gitops-integration", application_id)
    }

    async fn declare_application_environments(
        &self,
        application_id: &str,
        environment_ids: &[String],
    ) -> PortResult {
        let detail = format!("{application_id}:{}", environment_ids.join(","));
        self.record("declare-application-environments", &detail)
    }

    async fn mark_application_onboarding(&self, application_id: &str) -> PortResult {
        self.record("mark-application-onboarding", application_id)
    }

    async fn activate_application(&self, application_id: &str) -> PortResult {
        self.record("activate-application", application_id)
    }
}

#[async_trait]
impl ControlPlaneApi for RecordingPorts {
    async fn complete_application_environment_provisioning(&self, app_env_id: &str) -> PortResult {
        self.record("complete-provisioning", app_env_id)
    }
}

#[async_trait]
impl SecretRotationPort for RecordingPorts {
    async fn complete_secret_rotation(&self, secret_id: &str) -> PortResult {
        self.record("complete-secret-rotation", secret_id)
    }
}

#[async_trait]
impl GitProvider for RecordingPorts {
    async fn create_repository(&self, owner: &str, name: &str, private: bool) -> PortResult {
        let detail = format!("{owner}/{name}:private={private}");
        self.record("create-repository", &detail)
    }
}

#[async_trait]
impl AppEnvProvisioningProvider for RecordingPorts {
    async fn apply_branch_protection(&self, app_env_id: &str) -> PortResult {
        self.record("apply-branch-protection", app_env_id)
    }

    async fn provision_secrets(&self, app_env_id: &str) -> PortResult {
        self.record("provision-secrets", app_env_id)
    }

    async fn create_secret_bindings(&self, app_env_id: &str) -> PortResult {
        self.record("create-secret-bindings", app_env_id)
    }

    async fn verify_gitops_reconciliation(&self, app_env_id: &str) -> PortResult {
        self.record("verify-gitops-reconciliation", app_env_id)
    }
}

#[async_trait]
impl SecretBindingsRotationPort for RecordingPorts {
    async fn update_secret_bindings_for_secret(&self, secret_id: &str) -> PortResult {
        self.record("update-secret-bindings", secret_id)
    }
}

pub fn engine_with_store(store: Arc<dyn RunStore>) -> (WorkflowEngine, Arc<RecordingPorts>) {
    let ports = Arc::new(RecordingPorts::default());
    let engine_ports = EnginePorts {
        onboarding: ports.clone(),
        control_plane: ports.clone(),
        secret_rotation: ports.clone(),
        git: ports.clone(),
        appenv: ports.clone(),
        secret_bindings: ports.clone(),
    };
    let engine = WorkflowEngine::new(store, engine_ports, EngineConfig::default());
    (engine, ports)
}
