//! Secret and SecretBinding command handlers.

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
pub struct CreateSecretRequest {
    pub id: String,
    pub owner_team_id: String,
    pub purpose: String,
    pub sensitivity: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecretIdRequest {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeclareSecretBindingRequest {
    pub id: String,
    pub secret_id: String,
    pub target_id: String,
    pub target_type: String,
}

pub async fn create(State(state): State<AppState>, Json(req): Json<CreateSecretRequest>) -> Response {
    if req.id.is_empty() || req.owner_team_id.is_empty() {
        return bad_request("id and ownerTeamId are required");
    }

    match state
        .services
        .create_secret(&req.id, &req.owner_team_id, &req.purpose, &req.sensitivity, "api")
        .await
    {
        Ok(()) => {
            observe_domain_event("secret_created", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "createSecret error");
            observe_domain_event("secret_created", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn start_rotation(
    State(state): State<AppState>,
    Json(req): Json<SecretIdRequest>,
) -> Response {
    if req.id.is_empty() {
        return bad_request("id is required");
    }

    match state.services.start_secret_rotation(&req.id, "api").await {
        Ok(()) => {
            observe_domain_event("secret_rotation_started", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "startSecretRotation error");
            observe_domain_event("secret_rotation_started", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn complete_rotation(
    State(state): State<AppState>,
    Json(req): Json<SecretIdRequest>,
) -> Response {
    if req.id.is_empty() {
        return bad_request("id is required");
    }

    match state
        .services
        .complete_secret_rotation(&req.id, "workflow-engine")
        .await
    {
        Ok(()) => {
            observe_domain_event("secret_rotation_completed", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "completeSecretRotation error");
            observe_domain_event("secret_rotation_completed", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn declare_binding(
    State(state): State<AppState>,
    Json(req): Json<DeclareSecretBindingRequest>,
) -> Response {
    if req.id.is_empty() || req.secret_id.is_empty() || req.target_id.is_empty() {
        return bad_request("id, secretId and targetId are required");
    }

    match state
        .services
        .declare_secret_binding(&req.id, &req.secret_id, &req.target_id, &req.target_type, "api")
        .await
    {
        Ok(()) => {
            observe_domain_event("secret_binding_declared", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "declareSecretBinding error");
            observe_domain_event("secret_binding_declared", "error");
            ApiError(err).into_response()
        }
    }
}
