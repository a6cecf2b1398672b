//! Read-by-id query handlers.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;

use crate::web::errors::{bad_request, ApiError};
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdQuery {
    pub id: String,
}

pub async fn get_application(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Response {
    if query.id.is_empty() {
        return bad_request("id is required");
    }

    match state.services.get_application(&query.id).await {
        Ok(app) => Json(app).into_response(),
        Err(err) => {
            error!(error = %err, id = %query.id, "getApplication error");
            ApiError(err).into_response()
        }
    }
}

pub async fn get_environment(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Response {
    if query.id.is_empty() {
        return bad_request("id is required");
    }

    match state.services.get_environment(&query.id).await {
        Ok(env) => Json(env).into_response(),
        Err(err) => {
            error!(error = %err, id = %query.id, "getEnvironment error");
            ApiError(err).into_response()
        }
    }
}

pub async fn get_application_environment(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Response {
    if query.id.is_empty() {
        return bad_request("id is required");
    }

    match state.services.get_application_environment(&query.id).await {
        Ok(app_env) => Json(app_env).into_response(),
        Err(err) => {
            error!(error = %err, id = %query.id, "getApplicationEnvironment error");
            ApiError(err).into_response()
        }
    }
}
