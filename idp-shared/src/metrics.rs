//! # Platform Metrics
//!
//! Shared Prometheus registry and the metric families every service in the
//! control layer reports:
//!
//! - `http_requests_total{service, env, method, route, status}`
//! - `http_request_duration_seconds{service, env, method, route}`
//! - `domain_events_total{event, result}`
//! - `downstream_errors_total{target, code, status}`
//! - `workflow_run_duration_seconds{workflow, result}`
//! - `workflow_retries_total{workflow}`
//!
//! Route labels are normalized ([`normalize_route`]) so that id-bearing paths
//! do not explode label cardinality.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Instant;

use crate::config::ServiceIdentity;

static METRICS: OnceLock<PlatformMetrics> = OnceLock::new();

pub struct PlatformMetrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    domain_events_total: IntCounterVec,
    downstream_errors_total: IntCounterVec,
    workflow_run_duration_seconds: HistogramVec,
    workflow_retries_total: IntCounterVec,
}

impl PlatformMetrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total HTTP requests by service, environment, method, route and status.",
            ),
            &["service", "env", "method", "route", "status"],
        )
        .expect("http_requests_total opts");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration by service, environment, method and route.",
            ),
            &["service", "env", "method", "route"],
        )
        .expect("http_request_duration_seconds opts");

        let domain_events_total = IntCounterVec::new(
            Opts::new(
                "domain_events_total",
                "Domain events by event name and result.",
            ),
            &["event", "result"],
        )
        .expect("domain_events_total opts");

        let downstream_errors_total = IntCounterVec::new(
            Opts::new(
                "downstream_errors_total",
                "Errors calling downstream services by target, code and status.",
            ),
            &["target", "code", "status"],
        )
        .expect("downstream_errors_total opts");

        let workflow_run_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "workflow_run_duration_seconds",
                "Workflow run duration by workflow name and result.",
            ),
            &["workflow", "result"],
        )
        .expect("workflow_run_duration_seconds opts");

        let workflow_retries_total = IntCounterVec::new(
            Opts::new("workflow_retries_total", "Workflow retries by workflow name."),
            &["workflow"],
        )
        .expect("workflow_retries_total opts");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("register http_requests_total");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("register http_request_duration_seconds");
        registry
            .register(Box::new(domain_events_total.clone()))
            .expect("register domain_events_total");
        registry
            .register(Box::new(downstream_errors_total.clone()))
            .expect("register downstream_errors_total");
        registry
            .register(Box::new(workflow_run_duration_seconds.clone()))
            .expect("register workflow_run_duration_seconds");
        registry
            .register(Box::new(workflow_retries_total.clone()))
            .expect("register workflow_retries_total");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            domain_events_total,
            downstream_errors_total,
            workflow_run_duration_seconds,
            workflow_retries_total,
        }
    }
}

fn global() -> &'static PlatformMetrics {
    METRICS.get_or_init(PlatformMetrics::new)
}

/// Increments the counter for a high-level domain event. `event` should be a
/// stable use-case name (for example `application_created`); `result` is
/// typically `success` or `error`.
pub fn observe_domain_event(event: &str, result: &str) {
    global()
        .domain_events_total
        .with_label_values(&[event, result])
        .inc();
}

/// Tracks an error calling a downstream service. `target` is the logical
/// service name, `code` the stable error code extracted from its response (or
/// `unknown_error`), `status` the HTTP status observed.
pub fn observe_downstream_error(target: &str, code: &str, status: u16) {
    let code = if code.is_empty() { "unknown_error" } else { code };
    global()
        .downstream_errors_total
        .with_label_values(&[target, code, &status.to_string()])
        .inc();
}

/// Records the duration of one workflow run, labeled by workflow name and
/// result (`success`/`error`).
pub fn observe_workflow_duration(workflow: &str, result: &str, seconds: f64) {
    let workflow = if workflow.is_empty() { "unknown" } else { workflow };
    let result = if result.is_empty() { "unknown" } else { result };
    global()
        .workflow_run_duration_seconds
        .with_label_values(&[workflow, result])
        .observe(seconds);
}

/// Adds `retries` to the retry counter for a workflow. No-op for zero.
pub fn observe_workflow_retries(workflow: &str, retries: u64) {
    if retries == 0 {
        return;
    }
    let workflow = if workflow.is_empty() { "unknown" } else { workflow };
    global()
        .workflow_retries_total
        .with_label_values(&[workflow])
        .inc_by(retries);
}

/// Renders the registry in the Prometheus text exposition format, for use by
/// `/metrics` handlers.
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    if encoder.encode(&global().registry.gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

/// Axum middleware recording request count and duration for every response.
///
/// Wire it with a closure capturing the service identity:
///
/// ```ignore
/// let identity = ServiceIdentity::from_env();
/// router.layer(axum::middleware::from_fn(move |req, next| {
///     idp_shared::metrics::track_http(identity.clone(), req, next)
/// }));
/// ```
pub async fn track_http(identity: ServiceIdentity, req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = normalize_route(req.uri().path());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    let metrics = global();
    metrics
        .http_requests_total
        .with_label_values(&[
            &identity.service,
            &identity.environment,
            &method,
            &route,
            &status,
        ])
        .inc();
    metrics
        .http_request_duration_seconds
        .with_label_values(&[&identity.service, &identity.environment, &method, &route])
        .observe(start.elapsed().as_secs_f64());

    response
}

/// Reduces HTTP route cardinality by replacing path segments that look like
/// numeric ids or UUIDs with `{id}`.
pub fn normalize_route(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && (is_numeric(segment) || looks_like_uuid(segment)) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn looks_like_uuid(s: &str) -> bool {
    s.len() == 36 && s.chars().filter(|&c| c == '-').count() == 4
}
