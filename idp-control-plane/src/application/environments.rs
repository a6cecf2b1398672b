//! Environment and ApplicationEnvironment commands.

use idp_shared::{PlatformError, PlatformResult};

use super::{repo_internal, Services};
use crate::domain::{
    ApplicationEnvironment, ApplicationEnvironmentState, Environment, EnvironmentState, Metadata,
};

impl Services {
    /// Declares a global Environment in `Planned`.
    pub async fn create_environment(
        &self,
        id: &str,
        name: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .environments
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("environment_repository_error", "error loading environment", &e))?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "environment_already_exists",
                "environment already exists",
            ));
        }

        let env = Environment {
            id: id.to_string(),
            name: name.to_string(),
            state: EnvironmentState::Planned,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .environments
            .save(&env)
            .await
            .map_err(|e| repo_internal("environment_repository_error", "saving environment", &e))
    }

    /// Creates the Application↔Environment binding in `Declared`, enforcing
    /// uniqueness of the (applicationId, environmentId) pair. Both referenced
    /// entities must exist; their states are deliberately not guarded here.
    pub async fn declare_application_environment(
        &self,
        id: &str,
        application_id: &str,
        environment_id: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .application_environments
            .get_by_id(id)
            .await
            .map_err(|e| {
                repo_internal(
                    "application_environment_repository_error",
                    "error loading application environment",
                    &e,
                )
            })?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "application_environment_already_exists",
                "application environment already exists",
            ));
        }

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

        let env = self
            .repos()
            .environments
            .get_by_id(environment_id)
            .await
            .map_err(|e| repo_internal("environment_repository_error", "error loading environment", &e))?;
        if env.is_none() {
            return Err(PlatformError::not_found(
                "environment_not_found",
                "environment not found",
            ));
        }

        let pair = self
            .repos()
            .application_environments
            .get_by_application_and_environment(application_id, environment_id)
            .await
            .map_err(|e| {
                repo_internal(
                    "application_environment_repository_error",
                    "error loading application environment pair",
                    &e,
                )
            })?;
        if pair.is_some() {
            return Err(PlatformError::conflict(
                "application_environment_pair_already_exists",
                "application environment pair already exists",
            ));
        }

        let app_env = ApplicationEnvironment {
            id: id.to_string(),
            application_id: application_id.to_string(),
            environment_id: environment_id.to_string(),
            state: ApplicationEnvironmentState::Declared,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .application_environments
            .save(&app_env)
            .await
            .map_err(|e| {
                repo_internal(
                    "application_environment_repository_error",
                    "saving application environment",
                    &e,
                )
            })
    }

    /// Declared/Provisioning → Active, the terminal step of the provisioning
    /// workflow.
    pub async fn complete_application_environment_provisioning(
        &self,
        id: &str,
        _completed_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let mut app_env = self
            .repos()
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
            })?;

        if !matches!(
            app_env.state,
            ApplicationEnvironmentState::Declared | ApplicationEnvironmentState::Provisioning
        ) {
            return Err(PlatformError::domain(
                "application_environment_invalid_state_for_activation",
                "application environment cannot be activated from current state",
            ));
        }

        app_env.state = ApplicationEnvironmentState::Active;

        self.repos()
            .application_environments
            .save(&app_env)
            .await
            .map_err(|e| {
                repo_internal(
                    "application_environment_repository_error",
                    "completing application environment provisioning",
                    &e,
                )
            })
    }
}
