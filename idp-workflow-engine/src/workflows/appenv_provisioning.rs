//! ApplicationEnvironment provisioning workflow.

use tracing::info;

use crate::ports::{AppEnvProvisioningProvider, ControlPlaneApi, GitProvider};
use crate::runtime::{WorkflowContext, WorkflowError};

use super::{classify_port_error, require_id};

// TODO: derive the owner from the owning team once teams carry a Git
// organization attribute.
const REPOSITORY_OWNER: &str = "platform";

/// Materializes one ApplicationEnvironment end to end: backing Git repository,
/// branch protection, secrets, secret bindings and GitOps reconciliation, then
/// marks the AppEnv `Active` in the control plane. Every step is idempotent by
/// the AppEnv id, so a resumed or duplicated run converges on the same state.
pub async fn application_environment_provisioning(
    ctx: &WorkflowContext,
    git: &dyn GitProvider,
    provider: &dyn AppEnvProvisioningProvider,
    control_plane: &dyn ControlPlaneApi,
    app_env_id: &str,
) -> Result<(), WorkflowError> {
    require_id(app_env_id, "applicationEnvironmentId")?;

    info!(
        run_id = %ctx.run_id(),
        app_env_id,
        "starting application environment provisioning"
    );

    let repo_name = format!("appenv-{app_env_id}");
    let repo_name = repo_name.as_str();

    ctx.activity("materialize-repositories", || async move {
        git.create_repository(REPOSITORY_OWNER, repo_name, true)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("apply-branch-protection", || async move {
        provider
            .apply_branch_protection(app_env_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("provision-secrets", || async move {
        provider
            .provision_secrets(app_env_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("create-secret-bindings", || async move {
        provider
            .create_secret_bindings(app_env_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("verify-gitops-reconciliation", || async move {
        provider
            .verify_gitops_reconciliation(app_env_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("complete-provisioning", || async move {
        control_plane
            .complete_application_environment_provisioning(app_env_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    info!(
        run_id = %ctx.run_id(),
        app_env_id,
        "application environment provisioning completed"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{DownstreamTarget, PortError, PortResult};
    use crate::runtime::testing::TestRuntime;
    use crate::runtime::{RunStore, WorkflowRun};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every side-effect call in arrival order across all fakes.
    #[derive(Clone, Default)]
    struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.0.lock().clone()
        }
    }

    struct FakeGitProvider {
        log: CallLog,
        fail_with: Mutex<Option<PortError>>,
    }

    #[async_trait]
    impl GitProvider for FakeGitProvider {
        async fn create_repository(&self, owner: &str, name: &str, private: bool) -> PortResult {
            self.log.push(format!("git:create:{owner}/{name}:private={private}"));
            if let Some(err) = self.fail_with.lock().take() {
                return Err(err);
            }
            Ok(())
        }
    }

    struct FakeProvider {
        log: CallLog,
    }

    #[async_trait]
    impl AppEnvProvisioningProvider for FakeProvider {
        async fn apply_branch_protection(&self, app_env_id: &str) -> PortResult {
            self.log.push(format!("branch-protection:{app_env_id}"));
            Ok(())
        }

        async fn provision_secrets(&self, app_env_id: &str) -> PortResult {
            self.log.push(format!("secrets:{app_env_id}"));
            Ok(())
        }

        async fn create_secret_bindings(&self, app_env_id: &str) -> PortResult {
            self.log.push(format!("secret-bindings:{app_env_id}"));
            Ok(())
        }

        async fn verify_gitops_reconciliation(&self, app_env_id: &str) -> PortResult {
            self.log.push(format!("gitops-verify:{app_env_id}"));
            Ok(())
        }
    }

    struct FakeControlPlane {
        log: CallLog,
    }

    #[async_trait]
    impl ControlPlaneApi for FakeControlPlane {
        async fn complete_application_environment_provisioning(&self, app_env_id: &str) -> PortResult {
            self.log.push(format!("complete-provisioning:{app_env_id}"));
            Ok(())
        }
    }

    struct Fixture {
        runtime: TestRuntime,
        log: CallLog,
        git: FakeGitProvider,
        provider: FakeProvider,
        control_plane: FakeControlPlane,
    }

    async fn fixture() -> Fixture {
        let runtime = TestRuntime::new();
        runtime
            .store
            .put(&WorkflowRun::new(
                "run-1",
                "ApplicationEnvironmentProvisioning",
                "ae-1",
            ))
            .await
            .unwrap();
        let log = CallLog::default();
        Fixture {
            git: FakeGitProvider {
                log: log.clone(),
                fail_with: Mutex::new(None),
            },
            provider: FakeProvider { log: log.clone() },
            control_plane: FakeControlPlane { log: log.clone() },
            log,
            runtime,
        }
    }

    #[tokio::test]
    async fn happy_path_runs_every_side_effect_once_in_order() {
        let f = fixture().await;
        let ctx = f.runtime.context("ApplicationEnvironmentProvisioning", "run-1");

        application_environment_provisioning(&ctx, &f.git, &f.provider, &f.control_plane, "ae-1")
            .await
            .unwrap();

        assert_eq!(
            f.log.calls(),
            vec![
                "git:create:platform/appenv-ae-1:private=true",
                "branch-protection:ae-1",
                "secrets:ae-1",
                "secret-bindings:ae-1",
                "gitops-verify:ae-1",
                "complete-provisioning:ae-1",
            ]
        );
    }

    #[tokio::test]
    async fn worker_4xx_stops_the_pipeline_non_retriably() {
        let f = fixture().await;
        let ctx = f.runtime.context("ApplicationEnvironmentProvisioning", "run-1");
        *f.git.fail_with.lock() = Some(PortError::Api {
            target: DownstreamTarget::ExecutionWorkers,
            status: 400,
            code: String::new(),
            message: "name is required".into(),
        });

        let err = application_environment_provisioning(
            &ctx,
            &f.git,
            &f.provider,
            &f.control_plane,
            "ae-1",
        )
        .await
        .unwrap_err();

        assert_eq!(err.error_type(), Some("execution_workers_client_error"));
        // Nothing after the failed step ran.
        assert_eq!(f.log.calls(), vec!["git:create:platform/appenv-ae-1:private=true"]);
    }

    #[tokio::test]
    async fn missing_id_fails_before_any_side_effect() {
        let f = fixture().await;
        let ctx = f.runtime.context("ApplicationEnvironmentProvisioning", "run-1");

        let err =
            application_environment_provisioning(&ctx, &f.git, &f.provider, &f.control_plane, "")
                .await
                .unwrap_err();

        assert_eq!(err.error_type(), Some("bad_input"));
        assert!(f.log.calls().is_empty());
    }

    #[tokio::test]
    async fn resumed_run_finishes_remaining_steps_only() {
        let f = fixture().await;
        for step in [
            "materialize-repositories",
            "apply-branch-protection",
            "provision-secrets",
            "create-secret-bindings",
        ] {
            f.runtime.store.record_step("run-1", step).await.unwrap();
        }
        let ctx = f.runtime.context("ApplicationEnvironmentProvisioning", "run-1");

        application_environment_provisioning(&ctx, &f.git, &f.provider, &f.control_plane, "ae-1")
            .await
            .unwrap();

        assert_eq!(
            f.log.calls(),
            vec!["gitops-verify:ae-1", "complete-provisioning:ae-1"]
        );
    }
}
