//! In-memory store adapters.
//!
//! The default store for every entity kind (and the only one used in unit
//! tests). Each repository is a `RwLock<HashMap>` keyed by entity id with
//! clone-out semantics, so callers never observe another request's partial
//! mutation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::{
    ApplicationEnvironmentRepository, ApplicationRepository, CodeRepositoryRepository,
    DeploymentRepositoryRepository, EnvironmentRepository, GitOpsIntegrationRepository,
    RepoResult, Repositories, SecretBindingRepository, SecretRepository, TeamRepository,
};
use crate::domain::{
    Application, ApplicationEnvironment, CodeRepository, DeploymentRepository, Environment,
    GitOpsIntegration, Secret, SecretBinding, Team,
};

macro_rules! memory_repository {
    ($name:ident, $entity:ty, $trait_name:ident) => {
        #[derive(Default)]
        pub struct $name {
            items: RwLock<HashMap<String, $entity>>,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        #[async_trait]
        impl $trait_name for $name {
            async fn get_by_id(&self, id: &str) -> RepoResult<Option<$entity>> {
                Ok(self.items.read().await.get(id).cloned())
            }

            async fn save(&self, entity: &$entity) -> RepoResult<()> {
                self.items
                    .write()
                    .await
                    .insert(entity.id.clone(), entity.clone());
                Ok(())
            }
        }
    };
}

memory_repository!(InMemoryTeamRepository, Team, TeamRepository);
memory_repository!(InMemoryApplicationRepository, Application, ApplicationRepository);
memory_repository!(InMemoryEnvironmentRepository, Environment, EnvironmentRepository);
memory_repository!(InMemoryCodeRepositoryRepository, CodeRepository, CodeRepositoryRepository);
memory_repository!(
    InMemoryDeploymentRepositoryRepository,
    DeploymentRepository,
    DeploymentRepositoryRepository
);
memory_repository!(
    InMemoryGitOpsIntegrationRepository,
    GitOpsIntegration,
    GitOpsIntegrationRepository
);
memory_repository!(InMemorySecretRepository, Secret, SecretRepository);
memory_repository!(InMemorySecretBindingRepository, SecretBinding, SecretBindingRepository);

/// ApplicationEnvironment store with the extra pair index used to enforce
/// (applicationId, environmentId) uniqueness.
#[derive(Default)]
pub struct InMemoryApplicationEnvironmentRepository {
    items: RwLock<HashMap<String, ApplicationEnvironment>>,
}

impl InMemoryApplicationEnvironmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationEnvironmentRepository for InMemoryApplicationEnvironmentRepository {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<ApplicationEnvironment>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn get_by_application_and_environment(
        &self,
        application_id: &str,
        environment_id: &str,
    ) -> RepoResult<Option<ApplicationEnvironment>> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .find(|ae| ae.application_id == application_id && ae.environment_id == environment_id)
            .cloned())
    }

    async fn save(&self, app_env: &ApplicationEnvironment) -> RepoResult<()> {
        self.items
            .write()
            .await
            .insert(app_env.id.clone(), app_env.clone());
        Ok(())
    }
}

/// Fully in-memory repository set, used for development mode and tests.
pub fn in_memory_repositories() -> Repositories {
    Repositories {
        teams: Arc::new(InMemoryTeamRepository::new()),
        applications: Arc::new(InMemoryApplicationRepository::new()),
        environments: Arc::new(InMemoryEnvironmentRepository::new()),
        application_environments: Arc::new(InMemoryApplicationEnvironmentRepository::new()),
        code_repositories: Arc::new(InMemoryCodeRepositoryRepository::new()),
        deployment_repositories: Arc::new(InMemoryDeploymentRepositoryRepository::new()),
        gitops_integrations: Arc::new(InMemoryGitOpsIntegrationRepository::new()),
        secrets: Arc::new(InMemorySecretRepository::new()),
        secret_bindings: Arc::new(InMemorySecretBindingRepository::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApplicationEnvironmentState, Metadata, TeamState};

    #[tokio::test]
    async fn save_is_upsert_by_id() {
        let repo = InMemoryTeamRepository::new();
        let mut team = Team {
            id: "team-1".into(),
            name: "Platform".into(),
            state: TeamState::Draft,
            metadata: Metadata::created_by("test"),
        };
        repo.save(&team).await.unwrap();

        team.state = TeamState::Active;
        repo.save(&team).await.unwrap();

        let loaded = repo.get_by_id("team-1").await.unwrap().unwrap();
        assert_eq!(loaded.state, TeamState::Active);
    }

    #[tokio::test]
    async fn get_returns_detached_copies() {
        let repo = InMemoryTeamRepository::new();
        let team = Team {
            id: "team-1".into(),
            name: "Platform".into(),
            state: TeamState::Draft,
            metadata: Metadata::created_by("test"),
        };
        repo.save(&team).await.unwrap();

        let mut loaded = repo.get_by_id("team-1").await.unwrap().unwrap();
        loaded.state = TeamState::Archived;

        let reloaded = repo.get_by_id("team-1").await.unwrap().unwrap();
        assert_eq!(reloaded.state, TeamState::Draft);
    }

    #[tokio::test]
    async fn pair_lookup_finds_binding_regardless_of_id() {
        let repo = InMemoryApplicationEnvironmentRepository::new();
        let ae = ApplicationEnvironment {
            id: "ae-1".into(),
            application_id: "app-1".into(),
            environment_id: "env-dev".into(),
            state: ApplicationEnvironmentState::Declared,
            metadata: Metadata::created_by("test"),
        };
        repo.save(&ae).await.unwrap();

        let found = repo
            .get_by_application_and_environment("app-1", "env-dev")
            .await
            .unwrap();
        assert_eq!(found.map(|ae| ae.id), Some("ae-1".to_string()));

        let missing = repo
            .get_by_application_and_environment("app-1", "env-prod")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
