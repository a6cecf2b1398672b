//! # Lifecycle Workflows
//!
//! The fixed set of durable workflows hosted by the engine. Each workflow is
//! an async function over a [`WorkflowContext`] and the narrow ports it needs;
//! nothing here knows about HTTP clients or store backends.
//!
//! Error classification contract: a 4xx from the control plane becomes a
//! non-retriable failure whose `error_type` equals the control plane's stable
//! error code; a 4xx from the execution workers becomes non-retriable
//! `execution_workers_client_error`; 5xx and transport errors retry under the
//! standard policy.

pub mod application_onboarding;
pub mod appenv_provisioning;
pub mod secret_rotation;

use std::time::Duration;

use tracing::warn;

use idp_shared::metrics::observe_downstream_error;

use crate::ports::{DownstreamTarget, PortError};
use crate::runtime::WorkflowError;

pub const SECURITY_SCAN_PASSED_SIGNAL: &str = "SecurityScanPassed";
pub const ROTATION_VALIDATED_SIGNAL: &str = "RotationValidatedExternally";

pub const SECURITY_SCAN_TIMEOUT: Duration = Duration::from_secs(900);
pub const ROTATION_VALIDATION_TIMEOUT: Duration = Duration::from_secs(3600);

/// Converts a port failure into its workflow classification.
///
/// Retrying a 4xx cannot make it succeed, so those become non-retriable and
/// are counted in `downstream_errors_total`; everything else is left to the
/// retry policy.
pub fn classify_port_error(err: PortError) -> WorkflowError {
    match err {
        PortError::Api {
            target,
            status,
            code,
            message,
        } if (400..500).contains(&status) => {
            let message = if message.is_empty() {
                format!("{target} returned status {status}")
            } else {
                message
            };
            warn!(
                target = target.as_str(),
                status,
                code = %code,
                error = %message,
                "downstream client error"
            );

            match target {
                DownstreamTarget::ControlPlane => {
                    let error_type = if code.is_empty() {
                        "control_plane_client_error".to_string()
                    } else {
                        code.clone()
                    };
                    observe_downstream_error(target.as_str(), &error_type, status);
                    WorkflowError::non_retryable(error_type, message)
                }
                DownstreamTarget::ExecutionWorkers => {
                    observe_downstream_error(target.as_str(), "execution_workers_client_error", status);
                    WorkflowError::non_retryable("execution_workers_client_error", message)
                }
            }
        }
        PortError::Api {
            target,
            status,
            message,
            ..
        } => {
            let message = if message.is_empty() {
                format!("{target} returned status {status}")
            } else {
                message
            };
            WorkflowError::retryable(message)
        }
        PortError::Transport { message, .. } => WorkflowError::retryable(message),
    }
}

/// Empty workflow inputs are a caller bug, not a transient condition.
pub(crate) fn require_id(value: &str, field: &str) -> Result<(), WorkflowError> {
    if value.is_empty() {
        return Err(WorkflowError::non_retryable(
            "bad_input",
            format!("{field} is required"),
        ));
    }
    Ok(())
}
