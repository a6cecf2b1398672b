//! Secret rotation workflow.
//!
//! Coordinates rotation for a secret already in `Rotating`. The credential
//! itself is rotated and validated by external systems; this workflow holds
//! the lifecycle open until the external validator signals
//! `RotationValidatedExternally`, then propagates the rotated credential to
//! the secret's bindings and completes the rotation in the control plane.

use tracing::info;

use crate::ports::{SecretBindingsRotationPort, SecretRotationPort};
use crate::runtime::{WorkflowContext, WorkflowError};

use super::{classify_port_error, require_id, ROTATION_VALIDATED_SIGNAL, ROTATION_VALIDATION_TIMEOUT};

pub async fn secret_rotation(
    ctx: &WorkflowContext,
    rotation: &dyn SecretRotationPort,
    bindings: &dyn SecretBindingsRotationPort,
    secret_id: &str,
) -> Result<(), WorkflowError> {
    require_id(secret_id, "secretId")?;

    info!(run_id = %ctx.run_id(), secret_id, "starting secret rotation");

    // The upstream credential rotation happens outside this workflow (the
    // bindings-update side effect rotates the registry robot token); this step
    // only marks the rotation attempt in the run history.
    ctx.activity("perform-secret-rotation", || async move {
        info!(secret_id, "secret rotation delegated to external systems");
        Ok::<(), WorkflowError>(())
    })
    .await?;

    ctx.wait_for_signal(
        ROTATION_VALIDATED_SIGNAL,
        ROTATION_VALIDATION_TIMEOUT,
        "secret_rotation_timeout",
        "secret rotation timeout",
    )
    .await?;

    ctx.activity("update-secret-bindings", || async move {
        bindings
            .update_secret_bindings_for_secret(secret_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("complete-rotation", || async move {
        rotation
            .complete_secret_rotation(secret_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    info!(run_id = %ctx.run_id(), secret_id, "secret rotation completed");
    Ok(())
}
