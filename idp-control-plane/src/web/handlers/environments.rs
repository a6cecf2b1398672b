//! Environment and ApplicationEnvironment command handlers.

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
pub struct CreateEnvironmentRequest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclareApplicationEnvironmentRequest {
    pub id: String,
    pub application_id: String,
    pub environment_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompleteProvisioningRequest {
    pub id: String,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateEnvironmentRequest>,
) -> Response {
    if req.id.is_empty() || req.name.is_empty() {
        return bad_request("id and name are required");
    }

    match state.services.create_environment(&req.id, &req.name, "api").await {
        Ok(()) => {
            observe_domain_event("environment_created", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "createEnvironment error");
            observe_domain_event("environment_created", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn declare_application_environment(
    State(state): State<AppState>,
    Json(req): Json<DeclareApplicationEnvironmentRequest>,
) -> Response {
    if req.id.is_empty() || req.application_id.is_empty() || req.environment_id.is_empty() {
        return bad_request("id, applicationId and environmentId are required");
    }

    match state
        .services
        .declare_application_environment(&req.id, &req.application_id, &req.environment_id, "api")
        .await
    {
        Ok(()) => {
            observe_domain_event("application_environment_declared", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "declareApplicationEnvironment error");
            observe_domain_event("application_environment_declared", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn complete_provisioning(
    State(state): State<AppState>,
    Json(req): Json<CompleteProvisioningRequest>,
) -> Response {
    if req.id.is_empty() {
        return bad_request("id is required");
    }

    match state
        .services
        .complete_application_environment_provisioning(&req.id, "workflow-engine")
        .await
    {
        Ok(()) => {
            observe_domain_event("application_environment_provisioned", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "completeApplicationEnvironmentProvisioning error");
            observe_domain_event("application_environment_provisioned", "error");
            ApiError(err).into_response()
        }
    }
}
