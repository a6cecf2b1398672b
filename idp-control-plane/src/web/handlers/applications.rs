//! Application command handlers.

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
pub struct CreateApplicationRequest {
    pub id: String,
    pub name: String,
    pub team_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationIdRequest {
    pub id: String,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateApplicationRequest>,
) -> Response {
    if req.id.is_empty() || req.name.is_empty() || req.team_id.is_empty() {
        return bad_request("id, name and teamId are required");
    }

    match state
        .services
        .create_application(&req.id, &req.name, &req.team_id, "api")
        .await
    {
        Ok(()) => {
            observe_domain_event("application_created", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "createApplication error");
            observe_domain_event("application_created", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn approve(
    State(state): State<AppState>,
    Json(req): Json<ApplicationIdRequest>,
) -> Response {
    if req.id.is_empty() {
        return bad_request("id is required");
    }

    match state.services.approve_application(&req.id, "api").await {
        Ok(()) => {
            observe_domain_event("application_approved", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "approveApplication error");
            observe_domain_event("application_approved", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn start_onboarding(
    State(state): State<AppState>,
    Json(req): Json<ApplicationIdRequest>,
) -> Response {
    if req.id.is_empty() {
        return bad_request("id is required");
    }

    match state
        .services
        .start_application_onboarding(&req.id, "workflow-engine")
        .await
    {
        Ok(()) => {
            observe_domain_event("application_onboarding_started", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "startApplicationOnboarding error");
            observe_domain_event("application_onboarding_started", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<ApplicationIdRequest>,
) -> Response {
    if req.id.is_empty() {
        return bad_request("id is required");
    }

    match state
        .services
        .activate_application(&req.id, "workflow-engine")
        .await
    {
        Ok(()) => {
            observe_domain_event("application_activated", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "activateApplication error");
            observe_domain_event("application_activated", "error");
            ApiError(err).into_response()
        }
    }
}

pub async fn deprecate(
    State(state): State<AppState>,
    Json(req): Json<ApplicationIdRequest>,
) -> Response {
    if req.id.is_empty() {
        return bad_request("id is required");
    }

    match state.services.deprecate_application(&req.id, "api").await {
        Ok(()) => {
            observe_domain_event("application_deprecated", "success");
            StatusCode::ACCEPTED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "deprecateApplication error");
            observe_domain_event("application_deprecated", "error");
            ApiError(err).into_response()
        }
    }
}
