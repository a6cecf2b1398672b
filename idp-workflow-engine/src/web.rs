//! # Engine HTTP surface
//!
//! Start endpoints for the hosted workflows, signal delivery addressed by
//! workflow instance id, and run-status reads:
//!
//! ```text
//! POST /workflows/application-onboarding                 {"applicationId"}
//! POST /workflows/application-activation                 {"applicationId"}
//! POST /workflows/application-environment-provisioning   {"applicationEnvironmentId"}
//! POST /workflows/secret-rotation                        {"secretId"}
//! POST /workflows/:id/signals/:name
//! GET  /workflows/:id
//! GET  /healthz
//! GET  /metrics
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use idp_shared::config::ServiceIdentity;
use idp_shared::metrics;

use crate::engine::{WorkflowEngine, WorkflowKind};
use crate::runtime::RunStoreError;

#[derive(Clone)]
pub struct EngineState {
    pub engine: WorkflowEngine,
}

pub fn router(engine: WorkflowEngine, identity: ServiceIdentity) -> Router {
    let state = EngineState { engine };

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(prometheus_metrics))
        .route("/workflows/application-onboarding", post(start_application_onboarding))
        .route("/workflows/application-activation", post(start_application_activation))
        .route(
            "/workflows/application-environment-provisioning",
            post(start_appenv_provisioning),
        )
        .route("/workflows/secret-rotation", post(start_secret_rotation))
        .route("/workflows/:id/signals/:name", post(deliver_signal))
        .route("/workflows/:id", get(get_run))
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
struct ApplicationIdBody {
    application_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApplicationEnvironmentIdBody {
    application_environment_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SecretIdBody {
    secret_id: String,
}

async fn start_application_onboarding(
    State(state): State<EngineState>,
    Json(body): Json<ApplicationIdBody>,
) -> Response {
    start(&state, WorkflowKind::ApplicationOnboarding, &body.application_id, "applicationId").await
}

async fn start_application_activation(
    State(state): State<EngineState>,
    Json(body): Json<ApplicationIdBody>,
) -> Response {
    start(&state, WorkflowKind::ApplicationActivation, &body.application_id, "applicationId").await
}

async fn start_appenv_provisioning(
    State(state): State<EngineState>,
    Json(body): Json<ApplicationEnvironmentIdBody>,
) -> Response {
    start(
        &state,
        WorkflowKind::ApplicationEnvironmentProvisioning,
        &body.application_environment_id,
        "applicationEnvironmentId",
    )
    .await
}

async fn start_secret_rotation(
    State(state): State<EngineState>,
    Json(body): Json<SecretIdBody>,
) -> Response {
    start(&state, WorkflowKind::SecretRotation, &body.secret_id, "secretId").await
}

async fn start(state: &EngineState, kind: WorkflowKind, subject_id: &str, field: &str) -> Response {
    if subject_id.is_empty() {
        return (StatusCode::BAD_REQUEST, format!("{field} is required")).into_response();
    }

    match state.engine.start(kind, subject_id).await {
        Ok(workflow_id) => (
            StatusCode::ACCEPTED,
            Json(json!({ "workflowId": workflow_id })),
        )
            .into_response(),
        Err(err) => store_error(kind.name(), err),
    }
}

async fn deliver_signal(
    State(state): State<EngineState>,
    Path((id, name)): Path<(String, String)>,
) -> Response {
    match state.engine.signal(&id, &name).await {
        Ok(true) => StatusCode::ACCEPTED.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "workflow instance not found").into_response(),
        Err(err) => store_error("signal", err),
    }
}

async fn get_run(State(state): State<EngineState>, Path(id): Path<String>) -> Response {
    match state.engine.run(&id).await {
        Ok(Some(run)) => Json(run).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "workflow instance not found").into_response(),
        Err(err) => store_error("run-status", err),
    }
}

fn store_error(operation: &str, err: RunStoreError) -> Response {
    error!(operation, error = %err, "run store failure");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}
