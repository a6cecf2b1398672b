//! Repository and GitOps integration command handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use idp_shared::metrics::observe_domain_event;

use crate::web::errors::{bad_request, ApiError};
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclareCodeRepositoryRequest {
    pub id: String,
    pub application_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclareDeploymentRepositoryRequest {
    pub id: String,
    pub application_id: String,
    pub deployment_model: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclareGitOpsIntegrationRequest {
    pub id: String,
    pub application_id: String,
    pub deployment_repository_id: String,
}

pub async fn declare_code_repository(
    State(state): State<AppState>,
    Json(req): Json<DeclareCodeRepositoryRequest>,
) -> Response {
    if req.id.is_empty() || req.application_id.is_empty() {
        return bad_request("id and applicationId are required");
    }

    match state
        .services
        .declare_code_repository(&req.id, &req.application_id, "api")
        .await
    {
        Ok(()) => {
            observe_domain_event("code_repository_declared", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "declareCodeRepository error");
            observe_domain_event("code_repository_declared", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn declare_deployment_repository(
    State(state): State<AppState>,
    Json(req): Json<DeclareDeploymentRepositoryRequest>,
) -> Response {
    if req.id.is_empty() || req.application_id.is_empty() {
        return bad_request("id and applicationId are required");
    }

    match state
        .services
        .declare_deployment_repository(&req.id, &req.application_id, &req.deployment_model, "api")
        .await
    {
        Ok(()) => {
            observe_domain_event("deployment_repository_declared", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "declareDeploymentRepository error");
            observe_domain_event("deployment_repository_declared", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn declare_gitops_integration(
    State(state): State<AppState>,
    Json(req): Json<DeclareGitOpsIntegrationRequest>,
) -> Response {
    if req.id.is_empty() || req.application_id.is_empty() || req.deployment_repository_id.is_empty()
    {
        return bad_request("id, applicationId and deploymentRepositoryId are required");
    }

    match state
        .services
        .declare_gitops_integration(
            &req.id,
            &req.application_id,
            &req.deployment_repository_id,
            "api",
        )
        .await
    {
        Ok(()) => {
            observe_domain_event("gitops_integration_declared", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "declareGitOpsIntegration error");
            observe_domain_event("gitops_integration_declared", "error");
            ApiError(err).into_response()
        }
    }
}
