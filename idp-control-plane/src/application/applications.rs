//! Application lifecycle commands.
//!
//! Allowed transitions: Proposed → Approved → Onboarding → Active →
//! Deprecated. Anything else fails with the matching
//! `application_invalid_state_for_*` code.

use idp_shared::{PlatformError, PlatformResult};

use super::{repo_internal, Services};
use crate::domain::{Application, ApplicationState, Metadata};

impl Services {
    /// Creates an Application in `Proposed`, owned by an existing Team.
    pub async fn create_application(
        &self,
        id: &str,
        name: &str,
        team_id: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .applications
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("application_repository_error", "error loading application", &e))?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "application_already_exists",
                "application already exists",
            ));
        }

        let team = self
            .repos()
            .teams
            .get_by_id(team_id)
            .await
            .map_err(|e| repo_internal("team_repository_error", "error loading team", &e))?;
        if team.is_none() {
            return Err(PlatformError::not_found("team_not_found", "team not found"));
        }

        let app = Application {
            id: id.to_string(),
            name: name.to_string(),
            team_id: team_id.to_string(),
            state: ApplicationState::Proposed,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .applications
            .save(&app)
            .await
            .map_err(|e| repo_internal("application_repository_error", "saving application", &e))
    }

    /// Proposed → Approved. Once approved, an onboarding workflow may start.
    pub async fn approve_application(&self, id: &str, _approved_by: &str) -> PlatformResult<()> {
        self.transition_application(
            id,
            ApplicationState::Proposed,
            ApplicationState::Approved,
            "application_invalid_state_for_approval",
            "application can only be approved from Proposed state",
        )
        .await
    }

    /// Approved → Onboarding. Invoked by the onboarding workflow once all of
    /// its declaration steps and the security-scan wait have succeeded.
    pub async fn start_application_onboarding(
        &self,
        id: &str,
        _started_by: &str,
    ) -> PlatformResult<()> {
        self.transition_application(
            id,
            ApplicationState::Approved,
            ApplicationState::Onboarding,
            "application_invalid_state_for_onboarding",
            "application can only start onboarding from Approved state",
        )
        .await
    }

    /// Onboarding → Active. Invoked by the activation workflow once every
    /// ApplicationEnvironment of the application is Active.
    pub async fn activate_application(&self, id: &str, _activated_by: &str) -> PlatformResult<()> {
        self.transition_application(
            id,
            ApplicationState::Onboarding,
            ApplicationState::Active,
            "application_invalid_state_for_activation",
            "application can only be activated from Onboarding state",
        )
        .await
    }

    /// Active → Deprecated. Precondition for decommissioning.
    pub async fn deprecate_application(
        &self,
        id: &str,
        _deprecated_by: &str,
    ) -> PlatformResult<()> {
        self.transition_application(
            id,
            ApplicationState::Active,
            ApplicationState::Deprecated,
            "application_invalid_state_for_deprecation",
            "application can only be deprecated from Active state",
        )
        .await
    }

    async fn transition_application(
        &self,
        id: &str,
        from: ApplicationState,
        to: ApplicationState,
        guard_code: &str,
        guard_message: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let mut app = self
            .repos()
            .applications
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("application_repository_error", "error loading application", &e))?
            .ok_or_else(|| PlatformError::not_found("application_not_found", "application not found"))?;

        if app.state != from {
            return Err(PlatformError::domain(guard_code, guard_message));
        }

        app.state = to;

        self.repos()
            .applications
            .save(&app)
            .await
            .map_err(|e| repo_internal("application_repository_error", "saving application", &e))
    }
}
