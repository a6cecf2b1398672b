//! Control-plane API client.
//!
//! Speaks the command surface of the control plane and preserves its error
//! contract: a non-2xx response is parsed as a `{code, message}` body and
//! surfaced as [`PortError::Api`] with the stable code intact, which is what
//! lets workflows classify 4xx failures non-retriably under the same code.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use idp_shared::auth::{InternalAuth, INTERNAL_AUTH_HEADER};

use crate::ports::{
    ApplicationOnboardingPort, ControlPlaneApi, DownstreamTarget, PortError, PortResult,
    SecretRotationPort,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ControlPlaneClient {
    base_url: String,
    http: Client,
    auth: InternalAuth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IdBody<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeclareCodeRepositoryBody<'a> {
    id: String,
    application_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeclareDeploymentRepositoryBody<'a> {
    id: String,
    application_id: &'a str,
    deployment_model: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeclareGitOpsIntegrationBody<'a> {
    id: String,
    application_id: &'a str,
    deployment_repository_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeclareApplicationEnvironmentBody<'a> {
    id: String,
    application_id: &'a str,
    environment_id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl ControlPlaneClient {
    pub fn new(base_url: impl Into<String>, auth: InternalAuth) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into(),
            http,
            auth,
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> PortResult {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = self.auth.outgoing_token() {
            request = request.header(INTERNAL_AUTH_HEADER, token);
        }

        let response = request.send().await.map_err(|e| PortError::Transport {
            target: DownstreamTarget::ControlPlane,
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let raw = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        let message = if parsed.message.trim().is_empty() {
            raw.trim().to_string()
        } else {
            parsed.message
        };

        Err(PortError::Api {
            target: DownstreamTarget::ControlPlane,
            status: status.as_u16(),
            code: parsed.code,
            message,
        })
    }
}

#[async_trait]
impl ApplicationOnboardingPort for ControlPlaneClient {
    /// Declares the code repository under the `code-<applicationId>`
    /// convention so repeated onboarding runs stay idempotent.
    async fn declare_code_repository(&self, application_id: &str) -> PortResult {
        self.post(
            "/commands/code-repositories",
            &DeclareCodeRepositoryBody {
                id: format!("code-{application_id}"),
                application_id,
            },
        )
        .await
    }

    async fn declare_deployment_repository(&self, application_id: &str) -> PortResult {
        self.post(
            "/commands/deployment-repositories",
            &DeclareDeploymentRepositoryBody {
                id: format!("dep-{application_id}"),
                application_id,
                deployment_model: "GitOpsPerApplication",
            },
        )
        .await
    }

    async fn declare_gitops_integration(&self, application_id: &str) -> PortResult {
        self.post(
            "/commands/gitops-integrations",
            &DeclareGitOpsIntegrationBody {
                id: format!("gi-{application_id}"),
                application_id,
                deployment_repository_id: format!("dep-{application_id}"),
            },
        )
        .await
    }

    async fn declare_application_environments(
        &self,
        application_id: &str,
        environment_ids: &[String],
    ) -> PortResult {
        for environment_id in environment_ids {
            let result = self
                .post(
                    "/commands/application-environments",
                    &DeclareApplicationEnvironmentBody {
                        id: format!("{application_id}-{environment_id}"),
                        application_id,
                        environment_id,
                    },
                )
                .await;

            if let Err(err) = result {
                // Keep the failing environment visible in the message.
                return Err(match err {
                    PortError::Api {
                        target,
                        status,
                        code,
                        message,
                    } => PortError::Api {
                        target,
                        status,
                        code,
                        message: format!("{message} (environment={environment_id})"),
                    },
                    other => other,
                });
            }
        }
        Ok(())
    }

    async fn mark_application_onboarding(&self, application_id: &str) -> PortResult {
        self.post(
            "/commands/applications/start-onboarding",
            &IdBody { id: application_id },
        )
        .await
    }

    async fn activate_application(&self, application_id: &str) -> PortResult {
        self.post("/commands/applications/activate", &IdBody { id: application_id })
            .await
    }
}

#[async_trait]
impl ControlPlaneApi for ControlPlaneClient {
    async fn complete_application_environment_provisioning(&self, app_env_id: &str) -> PortResult {
        self.post(
            "/commands/application-environments/complete-provisioning",
            &IdBody { id: app_env_id },
        )
        .await
    }
}

#[async_trait]
impl SecretRotationPort for ControlPlaneClient {
    async fn complete_secret_rotation(&self, secret_id: &str) -> PortResult {
        self.post("/commands/secrets/complete-rotation", &IdBody { id: secret_id })
            .await
    }
}
