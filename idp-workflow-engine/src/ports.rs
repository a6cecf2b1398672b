//! Ports to the engine's two collaborators.
//!
//! Workflows depend only on these narrow capability traits; the concrete HTTP
//! adapters are constructed in `main` and injected into the engine. Workflow
//! code must never build HTTP clients itself (a fitness test enforces this).

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Logical name of a downstream service, used in metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownstreamTarget {
    ControlPlane,
    ExecutionWorkers,
}

impl DownstreamTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ControlPlane => "control-plane-api",
            Self::ExecutionWorkers => "execution-workers",
        }
    }
}

impl fmt::Display for DownstreamTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure returned by a port implementation.
///
/// `Api` carries the downstream HTTP status plus the stable `code` extracted
/// from a `{code, message}` error body (empty when the downstream answers in
/// plain text). `Transport` covers connection failures and timeouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("{target} error: status={status} code={code} message={message}")]
    Api {
        target: DownstreamTarget,
        status: u16,
        code: String,
        message: String,
    },
    #[error("transport error calling {target}: {message}")]
    Transport {
        target: DownstreamTarget,
        message: String,
    },
}

pub type PortResult = Result<(), PortError>;

/// Control-plane operations driven by the application onboarding and
/// activation workflows.
#[async_trait]
pub trait ApplicationOnboardingPort: Send + Sync {
    async fn declare_code_repository(&self, application_id: &str) -> PortResult;
    async fn declare_deployment_repository(&self, application_id: &str) -> PortResult;
    async fn declare_gitops_integration(&self, application_id: &str) -> PortResult;
    async fn declare_application_environments(
        &self,
        application_id: &str,
        environment_ids: &[String],
    ) -> PortResult;
    async fn mark_application_onboarding(&self, application_id: &str) -> PortResult;
    async fn activate_application(&self, application_id: &str) -> PortResult;
}

/// Control-plane operation finalizing AppEnv provisioning.
#[async_trait]
pub trait ControlPlaneApi: Send + Sync {
    async fn complete_application_environment_provisioning(&self, app_env_id: &str) -> PortResult;
}

/// Control-plane operation finalizing secret rotation.
#[async_trait]
pub trait SecretRotationPort: Send + Sync {
    async fn complete_secret_rotation(&self, secret_id: &str) -> PortResult;
}

/// Git repository side effects, served by the execution workers.
#[async_trait]
pub trait GitProvider: Send + Sync {
    async fn create_repository(&self, owner: &str, name: &str, private: bool) -> PortResult;
}

/// Non-Git AppEnv provisioning side effects, served by the execution workers.
#[async_trait]
pub trait AppEnvProvisioningProvider: Send + Sync {
    async fn apply_branch_protection(&self, app_env_id: &str) -> PortResult;
    async fn provision_secrets(&self, app_env_id: &str) -> PortResult;
    async fn create_secret_bindings(&self, app_env_id: &str) -> PortResult;
    async fn verify_gitops_reconciliation(&self, app_env_id: &str) -> PortResult;
}

/// Propagation of a rotated credential to all bindings of a secret.
#[async_trait]
pub trait SecretBindingsRotationPort: Send + Sync {
    async fn update_secret_bindings_for_secret(&self, secret_id: &str) -> PortResult;
}
