//! # Command API HTTP surface
//!
//! Route catalog (all commands POST, queries GET):
//!
//! ```text
//! /healthz
//! /metrics
//! /commands/teams
//! /commands/applications
//! /commands/applications/approve
//! /commands/applications/start-onboarding                [internal auth]
//! /commands/applications/activate                        [internal auth]
//! /commands/applications/deprecate
//! /commands/environments
//! /commands/application-environments
//! /commands/application-environments/complete-provisioning
//! /commands/secrets
//! /commands/secrets/start-rotation
//! /commands/secrets/complete-rotation                    [internal auth]
//! /commands/secret-bindings
//! /commands/code-repositories
//! /commands/deployment-repositories
//! /commands/gitops-integrations
//! /queries/applications?id=<id>
//! /queries/environments?id=<id>
//! /queries/application-environments?id=<id>
//! ```

pub mod errors;
pub mod handlers;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use idp_shared::auth::{require_internal_auth, InternalAuth};
use idp_shared::config::ServiceIdentity;
use idp_shared::metrics;

use crate::application::Services;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

/// Builds the full command/query router with metrics instrumentation and
/// internal auth on the workflow-driven transitions.
pub fn router(services: Arc<Services>, auth: InternalAuth, identity: ServiceIdentity) -> Router {
    let state = AppState { services };

    let protected = Router::new()
        .route(
            "/commands/applications/start-onboarding",
            post(handlers::applications::start_onboarding),
        )
        .route(
            "/commands/applications/activate",
            post(handlers::applications::activate),
        )
        .route(
            "/commands/secrets/complete-rotation",
            post(handlers::secrets::complete_rotation),
        )
        .route_layer(middleware::from_fn(move |req, next| {
            require_internal_auth(auth.clone(), req, next)
        }));

    let public = Router::new()
        .route("/commands/teams", post(handlers::teams::create))
        .route("/commands/applications", post(handlers::applications::create))
        .route(
            "/commands/applications/approve",
            post(handlers::applications::approve),
        )
        .route(
            "/commands/applications/deprecate",
            post(handlers::applications::deprecate),
        )
        .route("/commands/environments", post(handlers::environments::create))
        .route(
            "/commands/application-environments",
            post(handlers::environments::declare_application_environment),
        )
        .route(
            "/commands/application-environments/complete-provisioning",
            post(handlers::environments::complete_provisioning),
        )
        .route("/commands/secrets", post(handlers::secrets::create))
        .route(
            "/commands/secrets/start-rotation",
            post(handlers::secrets::start_rotation),
        )
        .route(
            "/commands/secret-bindings",
            post(handlers::secrets::declare_binding),
        )
        .route(
            "/commands/code-repositories",
            post(handlers::repositories::declare_code_repository),
        )
        .route(
            "/commands/deployment-repositories",
            post(handlers::repositories::declare_deployment_repository),
        )
        .route(
            "/commands/gitops-integrations",
            post(handlers::repositories::declare_gitops_integration),
        )
        .route("/queries/applications", get(handlers::queries::get_application))
        .route("/queries/environments", get(handlers::queries::get_environment))
        .route(
            "/queries/application-environments",
            get(handlers::queries::get_application_environment),
        );

    Router::new()
        .route("/healthz", get(handlers::health::healthz))
        .route("/metrics", get(handlers::health::prometheus_metrics))
        .merge(public)
        .merge(protected)
        .layer(middleware::from_fn(move |req, next| {
            metrics::track_http(identity.clone(), req, next)
        }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
