//! # Execution worker HTTP surface
//!
//! Stateless, idempotent side-effect endpoints. Every operation either talks
//! to a provider (GitHub, registry) or forwards to a configured external
//! endpoint; unconfigured forwards degrade to logged no-ops so the surface
//! stays usable in development.
//!
//! ```text
//! POST /github/repos                  {"owner","name","private"}
//! POST /appenv/branch-protection      {"applicationEnvironmentId"}
//! POST /appenv/secrets                {"applicationEnvironmentId"}
//! POST /appenv/secret-bindings        {"applicationEnvironmentId"}
//! POST /appenv/gitops-verify          {"applicationEnvironmentId"}
//! POST /secrets/bindings/update       {"secretId"}
//! GET  /healthz
//! GET  /metrics
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use idp_shared::auth::{require_internal_auth, InternalAuth};
use idp_shared::config::ServiceIdentity;
use idp_shared::metrics::{self, observe_domain_event};

use crate::config::WorkerConfig;
use crate::github::GitHubClient;
use crate::harbor::HarborClient;

const FORWARD_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct WorkerState {
    config: Arc<WorkerConfig>,
    github: Option<Arc<GitHubClient>>,
    harbor: Option<Arc<HarborClient>>,
    http: reqwest::Client,
}

impl WorkerState {
    pub fn new(config: WorkerConfig) -> Result<Self, reqwest::Error> {
        let github = match &config.github {
            Some(github_config) => Some(Arc::new(GitHubClient::new(github_config)?)),
            None => None,
        };
        let harbor = match &config.harbor {
            Some(harbor_config) => Some(Arc::new(HarborClient::new(harbor_config)?)),
            None => None,
        };
        let http = reqwest::Client::builder().timeout(FORWARD_TIMEOUT).build()?;

        Ok(Self {
            config: Arc::new(config),
            github,
            harbor,
            http,
        })
    }
}

pub fn router(state: WorkerState, auth: InternalAuth, identity: ServiceIdentity) -> Router {
    let side_effects = Router::new()
        .route("/github/repos", post(create_github_repo))
        .route("/appenv/branch-protection", post(apply_branch_protection))
        .route("/appenv/secrets", post(provision_appenv_secrets))
        .route("/appenv/secret-bindings", post(create_appenv_secret_bindings))
        .route("/appenv/gitops-verify", post(verify_appenv_gitops))
        .route("/secrets/bindings/update", post(update_secret_bindings))
        .route_layer(middleware::from_fn(move |req, next| {
            require_internal_auth(auth.clone(), req, next)
        }));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(prometheus_metrics))
        .merge(side_effects)
        .layer(middleware::from_fn(move |req, next| {
            metrics::track_http(identity.clone(), req, next)
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn prometheus_metrics() -> Response {
    (StatusCode::OK, metrics::gather()).into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CreateRepoRequest {
    owner: String,
    name: String,
    private: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AppEnvRequest {
    application_environment_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SecretBindingsUpdateRequest {
    secret_id: String,
}

async fn create_github_repo(
    State(state): State<WorkerState>,
    Json(req): Json<CreateRepoRequest>,
) -> Response {
    if req.name.is_empty() {
        return (StatusCode::BAD_REQUEST, "name is required").into_response();
    }
    if req.owner.is_empty() {
        return (StatusCode::BAD_REQUEST, "owner is required").into_response();
    }

    let Some(github) = &state.github else {
        error!("GITHUB_TOKEN not configured");
        observe_domain_event("github_repo_created", "error");
        return (StatusCode::INTERNAL_SERVER_ERROR, "GITHUB_TOKEN not configured").into_response();
    };

    match github.create_repository(&req.owner, &req.name, req.private).await {
        Ok(created) => {
            observe_domain_event("github_repo_created", "success");
            (StatusCode::CREATED, Json(created)).into_response()
        }
        Err(err) => {
            error!(error = %err, owner = %req.owner, repo = %req.name, "error creating repo in GitHub");
            observe_domain_event("github_repo_created", "error");
            (StatusCode::BAD_GATEWAY, "failed to create repository in GitHub").into_response()
        }
    }
}

async fn apply_branch_protection(
    State(state): State<WorkerState>,
    Json(req): Json<AppEnvRequest>,
) -> Response {
    if req.application_environment_id.is_empty() {
        return (StatusCode::BAD_REQUEST, "applicationEnvironmentId is required").into_response();
    }

    let Some(github) = &state.github else {
        error!("GITHUB_TOKEN not configured for branch protection");
        observe_domain_event("appenv_branch_protection_applied", "error");
        return (StatusCode::INTERNAL_SERVER_ERROR, "GITHUB_TOKEN not configured").into_response();
    };

    let owner = "platform";
    let repo = format!("appenv-{}", req.application_environment_id);
    let branch = "main";

    match github.protect_branch(owner, &repo, branch).await {
        Ok(()) => {
            observe_domain_event("appenv_branch_protection_applied", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(
                error = %err,
                owner,
                repo = %repo,
                branch,
                "error applying branch protection in GitHub"
            );
            observe_domain_event("appenv_branch_protection_applied", "error");
            (StatusCode::BAD_GATEWAY, "failed to apply branch protection in GitHub").into_response()
        }
    }
}

async fn provision_appenv_secrets(
    State(state): State<WorkerState>,
    Json(req): Json<AppEnvRequest>,
) -> Response {
    let endpoint = state.config.forwards.appenv_secrets.clone();
    forward_appenv_action(
        &state,
        endpoint,
        "appenv_secrets_provisioned",
        "failed to provision appenv secrets",
        &req.application_environment_id,
    )
    .await
}

async fn create_appenv_secret_bindings(
    State(state): State<WorkerState>,
    Json(req): Json<AppEnvRequest>,
) -> Response {
    let endpoint = state.config.forwards.appenv_secret_bindings.clone();
    forward_appenv_action(
        &state,
        endpoint,
        "appenv_secret_bindings_created",
        "failed to create appenv secret bindings",
        &req.application_environment_id,
    )
    .await
}

async fn verify_appenv_gitops(
    State(state): State<WorkerState>,
    Json(req): Json<AppEnvRequest>,
) -> Response {
    let endpoint = state.config.forwards.appenv_gitops_verify.clone();
    forward_appenv_action(
        &state,
        endpoint,
        "appenv_gitops_verified",
        "failed to verify appenv gitops reconciliation",
        &req.application_environment_id,
    )
    .await
}

/// Common shape of the forwarding AppEnv operations: idempotent by
/// `applicationEnvironmentId`, delegated to an external endpoint when one is
/// configured, accepted as a logged no-op otherwise.
async fn forward_appenv_action(
    state: &WorkerState,
    endpoint: Option<String>,
    event: &str,
    failure_text: &'static str,
    app_env_id: &str,
) -> Response {
    if app_env_id.is_empty() {
        return (StatusCode::BAD_REQUEST, "applicationEnvironmentId is required").into_response();
    }

    let Some(endpoint) = endpoint else {
        info!(event, app_env_id, "forward endpoint not configured; accepting as no-op");
        observe_domain_event(event, "success");
        return StatusCode::ACCEPTED.into_response();
    };

    let result = state
        .http
        .post(&endpoint)
        .json(&json!({ "applicationEnvironmentId": app_env_id }))
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            observe_domain_event(event, "success");
            StatusCode::ACCEPTED.into_response()
        }
        Ok(response) => {
            error!(event, app_env_id, status = response.status().as_u16(), "forward endpoint returned non-2xx");
            observe_domain_event(event, "error");
            (StatusCode::BAD_GATEWAY, failure_text).into_response()
        }
        Err(err) => {
            error!(event, app_env_id, error = %err, "error calling forward endpoint");
            observe_domain_event(event, "error");
            (StatusCode::BAD_GATEWAY, failure_text).into_response()
        }
    }
}

/// Best-effort propagation of a rotated credential. Rotates the registry
/// robot token when credentials are configured, then pushes the new token to
/// the bindings-update endpoint when one is configured. Partial failures are
/// logged but do not fail the request.
async fn update_secret_bindings(
    State(state): State<WorkerState>,
    Json(req): Json<SecretBindingsUpdateRequest>,
) -> Response {
    if req.secret_id.is_empty() {
        return (StatusCode::BAD_REQUEST, "secretId is required").into_response();
    }

    let mut token = String::new();
    match &state.harbor {
        Some(harbor) => match harbor.rotate_robot_token().await {
            Ok(rotated) => {
                info!(secret_id = %req.secret_id, "registry robot token rotated");
                token = rotated;
            }
            Err(err) => {
                error!(error = %err, secret_id = %req.secret_id, "error rotating registry robot token");
            }
        },
        None => {
            warn!(secret_id = %req.secret_id, "registry credentials not configured; skipping robot token rotation");
        }
    }

    match &state.config.forwards.secret_bindings_update {
        None => {
            info!("SECRET_BINDINGS_UPDATE_ENDPOINT not configured; skipping bindings propagation");
        }
        Some(_) if token.is_empty() => {
            warn!("no rotated token available; skipping bindings propagation");
        }
        Some(endpoint) => {
            let result = state
                .http
                .post(endpoint)
                .json(&json!({ "secretId": req.secret_id, "token": token }))
                .send()
                .await;
            match result {
                Ok(response) if response.status().is_success() => {
                    info!(status = response.status().as_u16(), "secret bindings propagation completed");
                }
                Ok(response) => {
                    error!(status = response.status().as_u16(), "secret bindings propagation endpoint returned non-2xx");
                }
                Err(err) => {
                    error!(error = %err, "error calling secret bindings propagation endpoint");
                }
            }
        }
    }

    info!(secret_id = %req.secret_id, "accepted secret bindings update request");
    observe_domain_event("secret_bindings_update_accepted", "success");
    StatusCode::ACCEPTED.into_response()
}
