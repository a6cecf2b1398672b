//! Team commands.

use idp_shared::{PlatformError, PlatformResult};

use super::{repo_internal, Services};
use crate::domain::{Metadata, Team, TeamState};

impl Services {
    /// Creates a Team in `Draft`. Fails with `team_already_exists` when the id
    /// is taken.
    pub async fn create_team(
        &self,
        id: &str,
        name: &str,
        created_by: &str,
    ) -> PlatformResult<()> {
        let _guard = self.command_guard().await;

        let existing = self
            .repos()
            .teams
            .get_by_id(id)
            .await
            .map_err(|e| repo_internal("team_repository_error", "error loading team", &e))?;
        if existing.is_some() {
            return Err(PlatformError::conflict(
                "team_already_exists",
                "team already exists",
            ));
        }

        let team = Team {
            id: id.to_string(),
            name: name.to_string(),
            state: TeamState::Draft,
            metadata: Metadata::created_by(created_by),
        };

        self.repos()
            .teams
            .save(&team)
            .await
            .map_err(|e| repo_internal("team_repository_error", "saving team", &e))
    }
}
