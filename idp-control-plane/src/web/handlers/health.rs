//! Health and metrics endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use idp_shared::metrics;

pub async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

pub async fn prometheus_metrics() -> Response {
    (StatusCode::OK, metrics::gather()).into_response()
}
