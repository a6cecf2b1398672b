//! # IDP Shared Platform
//!
//! Cross-service building blocks for the IDP control layer:
//!
//! - **Error taxonomy**: [`PlatformError`] with stable error codes that travel
//!   across service boundaries as `{code, message}` JSON objects.
//! - **Configuration**: thin environment-variable helpers and the service
//!   identity labels used by observability.
//! - **Metrics**: the shared Prometheus registry, HTTP instrumentation and
//!   route normalization.
//! - **Logging**: tracing-subscriber bootstrap with optional OTLP span export.
//! - **Internal auth**: the `X-Internal-Token` enforcement used on
//!   service-to-service endpoints.

pub mod auth;
pub mod config;
pub mod errors;
pub mod logging;
pub mod metrics;

pub use errors::{ErrorKind, PlatformError, PlatformResult};
