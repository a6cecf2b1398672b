//! # Domain Resources
//!
//! Aggregates owned by the control plane. All ids are opaque caller-supplied
//! strings (idempotent replay depends on this), and every entity carries a
//! lifecycle state plus creation metadata. Entities are never deleted;
//! archival and retirement are terminal states.

mod states;

pub use states::{
    ApplicationEnvironmentState, ApplicationState, CodeRepositoryState,
    DeploymentRepositoryState, EnvironmentState, SecretBindingState, SecretState, TeamState,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Metadata {
    pub fn created_by(created_by: impl Into<String>) -> Self {
        Self {
            created_by: created_by.into(),
            created_at: Utc::now(),
            tags: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub state: TeamState,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub name: String,
    pub team_id: String,
    pub state: ApplicationState,
    pub metadata: Metadata,
}

/// A global environment (dev, staging, prod, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub state: EnvironmentState,
    pub metadata: Metadata,
}

/// Binding of one Application to one Environment; the unit of provisioning.
/// The (applicationId, environmentId) pair is unique across all bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEnvironment {
    pub id: String,
    pub application_id: String,
    pub environment_id: String,
    pub state: ApplicationEnvironmentState,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRepository {
    pub id: String,
    pub application_id: String,
    pub state: CodeRepositoryState,
    pub metadata: Metadata,
}

/// Deployment (GitOps) repository of an Application. `deployment_model` stays
/// a free-form string; the known value today is `GitOpsPerApplication`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRepository {
    pub id: String,
    pub application_id: String,
    pub deployment_model: String,
    pub state: DeploymentRepositoryState,
    pub metadata: Metadata,
}

/// Link between an Application and the DeploymentRepository holding its GitOps
/// manifests. Pure relation; carries no lifecycle state of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsIntegration {
    pub id: String,
    pub application_id: String,
    pub deployment_repository_id: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub id: String,
    pub owner_team_id: String,
    pub purpose: String,
    pub sensitivity: String,
    pub state: SecretState,
    pub metadata: Metadata,
}

/// Binding of a Secret to a target resource (CodeRepository,
/// DeploymentRepository, ApplicationEnvironment, ...). Creation requires the
/// referenced Secret to be `Active` at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBinding {
    pub id: String,
    pub secret_id: String,
    pub target_id: String,
    pub target_type: String,
    pub state: SecretBindingState,
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_serialize_camel_case() {
        let app = Application {
            id: "app-1".into(),
            name: "App".into(),
            team_id: "team-1".into(),
            state: ApplicationState::Proposed,
            metadata: Metadata::created_by("test"),
        };
        let json = serde_json::to_value(&app).unwrap();
        assert_eq!(json["teamId"], "team-1");
        assert_eq!(json["state"], "Proposed");
        assert_eq!(json["metadata"]["createdBy"], "test");
        assert!(json["metadata"].get("tags").is_none());
    }

    #[test]
    fn secret_owner_field_uses_owner_team_id() {
        let secret = Secret {
            id: "sec-1".into(),
            owner_team_id: "team-1".into(),
            purpose: "registry-pull".into(),
            sensitivity: "high".into(),
            state: SecretState::Declared,
            metadata: Metadata::created_by("api"),
        };
        let json = serde_json::to_value(&secret).unwrap();
        assert_eq!(json["ownerTeamId"], "team-1");
    }
}
