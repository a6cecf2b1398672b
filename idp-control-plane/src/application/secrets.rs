//! Secret and SecretBinding commands.
//!
//! Rotation cycles Active ↔ Rotating. `Revoked` is terminal; no command
//! transitions out of it.

use idp_shared::{PlatformError, PlatformResult};

use super::{repo_internal, Services};
use crate::domain::{Metadata, Secret, SecretBinding, SecretBindingState, SecretState};

impl Services {
    /// Creates a Secret in `Declared`, owned by an existing Team.
    pub async fn create_secret(
        &self,
        id: &str,
        owner_team_id: &str,
        purpose: &str,
        sensitivity: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        if owner_team_id.is_empty() {
            return Err(PlatformError::validation(
                "owner_team_required",
                "owner team is required",
            ));
        }

        let existing = self
            .repos()
            .secrets
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("secret_repository_error", "error loading secret", &e))?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "secret_already_exists",
                "secret already exists",
            ));
        }

        let team = self
            .repos()
            .teams
            .get_by_id(owner_team_id)
            .await
            .map_err(|e| repo_internal("team_repository_error", "error loading owner team", &e))?;
        if team.is_none() {
            return Err(PlatformError::not_found(
                "owner_team_not_found",
                "owner team not found",
            ));
        }

        let secret = Secret {
            id: id.to_string(),
            owner_team_id: owner_team_id.to_string(),
            purpose: purpose.to_string(),
            sensitivity: sensitivity.to_string(),
            state: SecretState::Declared,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .secrets
            .save(&secret)
            .await
            .map_err(|e| repo_internal("secret_repository_error", "saving secret", &e))
    }

    /// Active → Rotating; the precondition for the rotation workflow.
    pub async fn start_secret_rotation(&self, id: &str, _started_by: &str) -> PlatformResult<()> {
        self.transition_secret(
            id,
            SecretState::Active,
            SecretState::Rotating,
            "secret_invalid_state_for_start_rotation",
            "secret can only start rotation from Active state",
        )
        .await
    }

    /// Rotating → Active; the final step of the rotation workflow, after the
    /// rotation was validated externally.
    pub async fn complete_secret_rotation(
        &self,
        id: &str,
        _completed_by: &str,
    ) -> PlatformResult<()> {
        self.transition_secret(
            id,
            SecretState::Rotating,
            SecretState::Active,
            "secret_invalid_state_for_complete_rotation",
            "secret can only complete rotation from Rotating state",
        )
        .await
    }

    /// Creates a SecretBinding in `Declared`. The referenced Secret must be
    /// `Active` at creation time.
    pub async fn declare_secret_binding(
        &self,
        id: &str,
        secret_id: &str,
        target_id: &str,
        target_type: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .secret_bindings
            .get_by_id(id)
            .await
            .map_err(|e| {
                repo_internal("secret_binding_repository_error", "error loading secret binding", &e)
            })?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "secret_binding_already_exists",
                "secret binding already exists",
            ));
        }

        let secret = self
            .repos()
            .secrets
            .get_by_id(secret_id)
            .await
            .map_err(|e| repo_internal("secret_repository_error", "error loading secret", &e))?
            .ok_or_else(|| PlatformError::not_found("secret_not_found", "secret not found"))?;

        if secret.state != SecretState::Active {
            return Err(PlatformError::domain(
                "binding_requires_active_secret",
                "binding requires active secret",
            ));
        }

        let binding = SecretBinding {
            id: id.to_string(),
            secret_id: secret_id.to_string(),
            target_id: target_id.to_string(),
            target_type: target_type.to_string(),
            state: SecretBindingState::Declared,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .secret_bindings
            .save(&binding)
            .await
            .map_err(|e| repo_internal("secret_binding_repository_error", "saving secret binding", &e))
    }

    async fn transition_secret(
        &self,
        id: &str,
        from: SecretState,
        to: SecretState,
        guard_code: &str,
        guard_message: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let mut secret = self
            .repos()
            .secrets
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("secret_repository_error", "error loading secret", &e))?
            .ok_or_else(|| PlatformError::not_found("secret_not_found", "secret not found"))?;

        if secret.state != from {
            return Err(PlatformError::domain(guard_code, guard_message));
        }

        secret.state = to;

        self.repos()
            .secrets
            .save(&secret)
            .await
            .map_err(|e| repo_internal("secret_repository_error", "saving secret", &e))
    }
}
