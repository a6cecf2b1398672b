//! Code repository, deployment repository and GitOps integration commands.

use idp_shared::{PlatformError, PlatformResult};

use super::{repo_internal, Services};
use crate::domain::{
    CodeRepository, CodeRepositoryState, DeploymentRepository, DeploymentRepositoryState,
    GitOpsIntegration, Metadata,
};

impl Services {
    /// Declares a CodeRepository for an existing Application.
    pub async fn declare_code_repository(
        &self,
        id: &str,
        application_id: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .code_repositories
            .get_by_id(id)
            .await
            .map_err(|e| {
                repo_internal("code_repository_repository_error", "error loading code repository", &e)
            })?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "code_repository_already_exists",
                "code repository already exists",
            ));
        }

        self.require_application(application_id).await?;

        let repo = CodeRepository {
            id: id.to_string(),
            application_id: application_id.to_string(),
            state: CodeRepositoryState::Declared,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .code_repositories
            .save(&repo)
            .await
            .map_err(|e| repo_internal("code_repository_repository_error", "saving code repository", &e))
    }

    /// Declares a DeploymentRepository for an existing Application.
    pub async fn declare_deployment_repository(
        &self,
        id: &str,
        application_id: &str,
        deployment_model: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .deployment_repositories
            .get_by_id(id)
            .await
            .map_err(|e| {
                repo_internal(
                    "deployment_repository_repository_error",
                    "error loading deployment repository",
                    &e,
                )
            })?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "deployment_repository_already_exists",
                "deployment repository already exists",
            ));
        }

        self.require_application(application_id).await?;

        let repo = DeploymentRepository {
            id: id.to_string(),
            application_id: application_id.to_string(),
            deployment_model: deployment_model.to_string(),
            state: DeploymentRepositoryState::Declared,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .deployment_repositories
            .save(&repo)
            .await
            .map_err(|e| {
                repo_internal(
                    "deployment_repository_repository_error",
                    "saving deployment repository",
                    &e,
                )
            })
    }

    /// Links an Application to one of its own DeploymentRepositories.
    /// Cross-application attachment fails with
    /// `deployment_repository_wrong_application`.
    pub async fn declare_gitops_integration(
        &self,
        id: &str,
        application_id: &str,
        deployment_repository_id: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .gitops_integrations
            .get_by_id(id)
            .await
            .map_err(|e| {
                repo_internal(
                    "gitops_integration_repository_error",
                    "error loading gitops integration",
                    &e,
                )
            })?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "gitops_integration_already_exists",
                "gitops integration already exists",
            ));
        }

        self.require_application(application_id).await?;

        let dep = self
            .repos()
            .deployment_repositories
            .get_by_id(deployment_repository_id)
            .await
            .map_err(|e| {
                repo_internal(
                    "deployment_repository_repository_error",
                    "error loading deployment repository",
                    &e,
                )
            })?
            .ok_or_else(|| {
                PlatformError::not_found(
                    "deployment_repository_not_found",
                    "deployment repository not found",
                )
            })?;

        if dep.application_id != application_id {
            return Err(PlatformError::domain(
                "deployment_repository_wrong_application",
                "deployment repository does not belong to application",
            ));
        }

        let integration = GitOpsIntegration {
            id: id.to_string(),
            application_id: application_id.to_string(),
            deployment_repository_id: deployment_repository_id.to_string(),
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .gitops_integrations
            .save(&integration)
            .await
            .map_err(|e| {
                repo_internal("gitops_integration_repository_error", "saving gitops integration", &e)
            })
    }

    async fn require_application(&self, application_id: &str) -> PlatformResult<()> {
        let app = self
            .repos()
            .applications
            .get_by_id(application_id)
            .await
            .map_err(|e| repo_internal("application_repository_error", "error loading application", &e))?;
        if app.is_none() {
            return Err(PlatformError::not_found(
                "application_not_found",
                "application not found",
            ));
        }
        Ok(())
    }
}
