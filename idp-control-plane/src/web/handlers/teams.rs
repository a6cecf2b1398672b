//! Team command handlers.

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
pub struct CreateTeamRequest {
    pub id: String,
    pub name: String,
}

pub async fn create(State(state): State<AppState>, Json(req): Json<CreateTeamRequest>) -> Response {
    if req.id.is_empty() || req.name.is_empty() {
        return bad_request("id and name are required");
    }

    match state.services.create_team(&req.id, &req.name, "api").await {
        Ok(()) => {
            observe_domain_event("team_created", "success");
            StatusCode::CREATED.into_response()
        }
        Err(err) => {
            error!(error = %err, id = %req.id, "createTeam error");
            observe_domain_event("team_created", "error");
            ApiError(err).into_response()
        }
    }
}
