//! # Application Services
//!
//! The command surface of the control plane. Every command enforces its
//! state-machine guards here and maps each precondition failure to a stable
//! error code; the store adapters below this layer know nothing about domain
//! rules, and nothing in this layer performs outbound calls.

mod applications;
mod environments;
mod repositories;
mod secrets;
mod teams;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use idp_shared::{PlatformError, PlatformResult};

use crate::domain::{
    Application, ApplicationEnvironment, CodeRepository, DeploymentRepository, Environment,
    GitOpsIntegration, Secret, SecretBinding, Team,
};

/// Failure inside a store adapter. Services wrap these into internal
/// [`PlatformError`]s; adapters never produce domain errors.
#[derive(Debug, Error)]
#[error("repository error: {0}")]
pub struct RepositoryError(pub String);

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait TeamRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Team>>;
    async fn save(&self, team: &Team) -> RepoResult<()>;
}

#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Application>>;
    async fn save(&self, app: &Application) -> RepoResult<()>;
}

#[async_trait]
pub trait EnvironmentRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Environment>>;
    async fn save(&self, env: &Environment) -> RepoResult<()>;
}

#[async_trait]
pub trait ApplicationEnvironmentRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<ApplicationEnvironment>>;
    /// Lookup by the unique (applicationId, environmentId) pair.
    async fn get_by_application_and_environment(
        &self,
        application_id: &str,
        environment_id: &str,
    ) -> RepoResult<Option<ApplicationEnvironment>>;
    async fn save(&self, app_env: &ApplicationEnvironment) -> RepoResult<()>;
}

#[async_trait]
pub trait CodeRepositoryRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<CodeRepository>>;
    async fn save(&self, repo: &CodeRepository) -> RepoResult<()>;
}

#[async_trait]
pub trait DeploymentRepositoryRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<DeploymentRepository>>;
    async fn save(&self, repo: &DeploymentRepository) -> RepoResult<()>;
}

#[async_trait]
pub trait GitOpsIntegrationRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<GitOpsIntegration>>;
    async fn save(&self, integration: &GitOpsIntegration) -> RepoResult<()>;
}

#[async_trait]
pub trait SecretRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Secret>>;
    async fn save(&self, secret: &Secret) -> RepoResult<()>;
}

#[async_trait]
pub trait SecretBindingRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<SecretBinding>>;
    async fn save(&self, binding: &SecretBinding) -> RepoResult<()>;
}

/// Store adapters for every entity kind, wired once at process start.
#[derive(Clone)]
pub struct Repositories {
    pub teams: Arc<dyn TeamRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub environments: Arc<dyn EnvironmentRepository>,
    pub application_environments: Arc<dyn ApplicationEnvironmentRepository>,
    pub code_repositories: Arc<dyn CodeRepositoryRepository>,
    pub deployment_repositories: Arc<dyn DeploymentRepositoryRepository>,
    pub gitops_integrations: Arc<dyn GitOpsIntegrationRepository>,
    pub secrets: Arc<dyn SecretRepository>,
    pub secret_bindings: Arc<dyn SecretBindingRepository>,
}

/// Command and query services over the entity stores.
///
/// Commands acquire `command_lock` so that the precondition check and the
/// subsequent write are linearizable: of two concurrent commands on the same
/// id, at most one precondition check can pass. Queries read lock-free.
pub struct Services {
    repos: Repositories,
    command_lock: Mutex<()>,
}

impl Services {
    pub fn new(repos: Repositories) -> Self {
        Self {
            repos,
            command_lock: Mutex::new(()),
        }
    }

    pub(crate) fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub(crate) async fn command_guard(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.command_lock.lock().await
    }

    pub async fn get_application(&self, id: &str) -> PlatformResult<Application> {
        self.repos
            .applications
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("application_repository_error", "error loading application", &e))?
            .ok_or_else(|| PlatformError::not_found("application_not_found", "application not found"))
    }

    pub async fn get_environment(&self, id: &str) -> PlatformResult<Environment> {
        self.repos
            .environments
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("environment_repository_error", "error loading environment", &e))?
            .ok_or_else(|| PlatformError::not_found("environment_not_found", "environment not found"))
    }

    pub async fn get_application_environment(
        &self,
        id: &str,
    ) -> PlatformResult<ApplicationEnvironment> {
        self.repos
            .application_environments
            .get_by_id(id)
            .await
            .map_err(|e| {
                repo_internal(
                    "application_environment_repository_error",
                    "error loading application environment",
                    &e,
                )
            })?
            .ok_or_else(|| {
                PlatformError::not_found(
                    "application_environment_not_found",
                    "application environment not found",
                )
            })
    }
}

pub(crate) fn repo_internal(code: &str, message: &str, err: &RepositoryError) -> PlatformError {
    PlatformError::internal(code, format!("{message}: {err}"))
}
