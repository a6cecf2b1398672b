//! Internal service-to-service authentication.
//!
//! Endpoints that trigger state transitions or external side effects require
//! the `X-Internal-Token` header to match `INTERNAL_AUTH_TOKEN`. When the
//! variable is unset or empty, enforcement is disabled (development mode).

use axum::extract::Request;
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::require_env;

pub const INTERNAL_AUTH_HEADER: &str = "x-internal-token";

/// Shared-secret configuration for internal endpoints.
#[derive(Debug, Clone, Default)]
pub struct InternalAuth {
    token: Option<String>,
}

impl InternalAuth {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(require_env("INTERNAL_AUTH_TOKEN"))
    }

    /// True when the request may proceed: either enforcement is disabled or
    /// the header matches the configured token.
    pub fn verify(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.token else {
            return true;
        };
        headers
            .get(INTERNAL_AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|presented| presented == expected)
            .unwrap_or(false)
    }

    /// Token to attach to outgoing internal calls, if any.
    pub fn outgoing_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Axum middleware enforcing internal auth on a route group. Wire it with a
/// closure capturing an [`InternalAuth`]:
///
/// ```ignore
/// router.layer(axum::middleware::from_fn(move |req, next| {
///     idp_shared::auth::require_internal_auth(auth.clone(), req, next)
/// }));
/// ```
pub async fn require_internal_auth(auth: InternalAuth, req: Request, next: Next) -> Response {
    if auth.verify(req.headers()) {
        next.run(req).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            "missing or invalid internal auth token",
        )
            .into_response()
    }
}
