//! Execution-workers client.
//!
//! One client covers all three worker-facing ports: Git repository
//! materialization, AppEnv provisioning side effects and secret-binding
//! propagation. Worker error responses are plain text, so [`PortError::Api`]
//! carries the raw body as message and an empty code.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use idp_shared::auth::{InternalAuth, INTERNAL_AUTH_HEADER};

use crate::ports::{
    AppEnvProvisioningProvider, DownstreamTarget, GitProvider, PortError, PortResult,
    SecretBindingsRotationPort,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct ExecutionWorkersClient {
    base_url: String,
    http: Client,
    auth: InternalAuth,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRepositoryBody<'a> {
    owner: &'a str,
    name: &'a str,
    private: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppEnvBody<'a> {
    application_environment_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SecretBody<'a> {
    secret_id: &'a str,
}

impl ExecutionWorkersClient {
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
            target: DownstreamTarget::ExecutionWorkers,
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default().trim().to_string();
        Err(PortError::Api {
            target: DownstreamTarget::ExecutionWorkers,
            status: status.as_u16(),
            code: String::new(),
            message,
        })
    }
}

#[async_trait]
impl GitProvider for ExecutionWorkersClient {
    async fn create_repository(&self, owner: &str, name: &str, private: bool) -> PortResult {
        self.post(
            "/github/repos",
            &CreateRepositoryBody {
                owner,
                name,
                private,
            },
        )
        .await
    }
}

#[async_trait]
impl AppEnvProvisioningProvider for ExecutionWorkersClient {
    async fn apply_branch_protection(&self, app_env_id: &str) -> PortResult {
        self.post(
            "/appenv/branch-protection",
            &AppEnvBody {
                application_environment_id: app_env_id,
            },
        )
        .await
    }

    async fn provision_secrets(&self, app_env_id: &str) -> PortResult {
        self.post(
            "/appenv/secrets",
            &AppEnvBody {
                application_environment_id: app_env_id,
            },
        )
        .await
    }

    async fn create_secret_bindings(&self, app_env_id: &str) -> PortResult {
        self.post(
            "/appenv/secret-bindings",
            &AppEnvBody {
                application_environment_id: app_env_id,
            },
        )
        .await
    }

    async fn verify_gitops_reconciliation(&self, app_env_id: &str) -> PortResult {
        self.post(
            "/appenv/gitops-verify",
            &AppEnvBody {
                application_environment_id: app_env_id,
            },
        )
        .await
    }
}

#[async_trait]
impl SecretBindingsRotationPort for ExecutionWorkersClient {
    async fn update_secret_bindings_for_secret(&self, secret_id: &str) -> PortResult {
        self.post("/secrets/bindings/update", &SecretBody { secret_id })
            .await
    }
}
