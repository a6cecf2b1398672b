//! Application onboarding and activation workflows.

use tracing::info;

use crate::ports::ApplicationOnboardingPort;
use crate::runtime::{WorkflowContext, WorkflowError};

use super::{classify_port_error, require_id, SECURITY_SCAN_PASSED_SIGNAL, SECURITY_SCAN_TIMEOUT};

/// Onboards an already-approved application: declares its code and deployment
/// repositories, the GitOps integration and the application environments, then
/// waits for the external security scan before moving the application to
/// `Onboarding`. No signal within 15 minutes fails the run with
/// `security_scan_timeout` and the transition never happens.
pub async fn application_onboarding(
    ctx: &WorkflowContext,
    port: &dyn ApplicationOnboardingPort,
    environment_ids: &[String],
    application_id: &str,
) -> Result<(), WorkflowError> {
    require_id(application_id, "applicationId")?;

    info!(
        run_id = %ctx.run_id(),
        application_id,
        "starting application onboarding"
    );

    ctx.activity("declare-code-repository", || async move {
        port.declare_code_repository(application_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("declare-deployment-repository", || async move {
        port.declare_deployment_repository(application_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("declare-gitops-integration", || async move {
        port.declare_gitops_integration(application_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.activity("declare-application-environments", || async move {
        port.declare_application_environments(application_id, environment_ids)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    ctx.wait_for_signal(
        SECURITY_SCAN_PASSED_SIGNAL,
        SECURITY_SCAN_TIMEOUT,
        "security_scan_timeout",
        "security scan timeout",
    )
    .await?;

    ctx.activity("start-onboarding", || async move {
        port.mark_application_onboarding(application_id)
            .await
            .map_err(classify_port_error)
    })
    .await?;

    info!(
        run_id = %ctx.run_id(),
        application_id,
        "application onboarding completed"
    );
    Ok(())
}

/// Moves an application from `Onboarding` to `Active`. Started externally once
/// every ApplicationEnvironment of the application is `Active`; the command
/// API guard rejects premature activation.
pub async fn application_activation(
    ctx: &WorkflowContext,
    port: &dyn ApplicationOnboardingPort,
    application_id: &str,
) -> Result<(), WorkflowError> {
    require_id(application_id, "applicationId")?;

    ctx.activity("activate-application", || async move {
        port.activate_application(application_id)
            .await
            .map_err(classify_port_error)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{DownstreamTarget, PortError, PortResult};
    use crate::runtime::testing::TestRuntime;
    use crate::runtime::{RunStore, WorkflowRun};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeOnboardingPort {
        calls: Mutex<Vec<String>>,
        fail_gitops_with: Mutex<Option<PortError>>,
    }

    impl FakeOnboardingPort {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().push(call.into());
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ApplicationOnboardingPort for FakeOnboardingPort {
        async fn declare_code_repository(&self, application_id: &str) -> PortResult {
            self.record(format!("code:{application_id}"));
            Ok(())
        }

        async fn declare_deployment_repository(&self, application_id: &str) -> PortResult {
            self.record(format!("deployment:{application_id}"));
            Ok(())
        }

        async fn declare_gitops_integration(&self, application_id: &str) -> PortResult {
            self.record(format!("gitops:{application_id}"));
            if let Some(err) = self.fail_gitops_with.lock().take() {
                return Err(err);
            }
            Ok(())
        }

        async fn declare_application_environments(
            &self,
            application_id: &str,
            environment_ids: &[String],
        ) -> PortResult {
            self.record(format!("environments:{application_id}:{}", environment_ids.join(",")));
            Ok(())
        }

        async fn mark_application_onboarding(&self, application_id: &str) -> PortResult {
            self.record(format!("onboarding:{application_id}"));
            Ok(())
        }

        async fn activate_application(&self, application_id: &str) -> PortResult {
            self.record(format!("activate:{application_id}"));
            Ok(())
        }
    }

    fn environments() -> Vec<String> {
        vec!["env-dev".to_string(), "env-prod".to_string()]
    }

    async fn onboarding_context(runtime: &TestRuntime) -> WorkflowContext {
        runtime
            .store
            .put(&WorkflowRun::new("run-1", "ApplicationOnboarding", "app-1"))
            .await
            .unwrap();
        runtime.context("ApplicationOnboarding", "run-1")
    }

    #[tokio::test]
    async fn happy_path_executes_steps_in_order() {
        let runtime = TestRuntime::new();
        let ctx = onboarding_context(&runtime).await;
        let port = FakeOnboardingPort::default();
        runtime.signals.deliver("run-1", SECURITY_SCAN_PASSED_SIGNAL);

        application_onboarding(&ctx, &port, &environments(), "app-1")
            .await
            .unwrap();

        assert_eq!(
            port.calls(),
            vec![
                "code:app-1",
                "deployment:app-1",
                "gitops:app-1",
                "environments:app-1:env-dev,env-prod",
                "onboarding:app-1",
            ]
        );
    }

    #[tokio::test]
    async fn empty_application_id_is_bad_input() {
        let runtime = TestRuntime::new();
        let ctx = onboarding_context(&runtime).await;
        let port = FakeOnboardingPort::default();

        let err = application_onboarding(&ctx, &port, &environments(), "")
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), Some("bad_input"));
        assert!(port.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_signal_times_out_without_state_transition() {
        let runtime = TestRuntime::new();
        let ctx = onboarding_context(&runtime).await;
        let port = FakeOnboardingPort::default();

        let err = application_onboarding(&ctx, &port, &environments(), "app-1")
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), Some("security_scan_timeout"));
        // The transition to Onboarding must never have been attempted.
        assert!(!port.calls().iter().any(|c| c.starts_with("onboarding:")));
    }

    #[tokio::test]
    async fn control_plane_4xx_fails_non_retriably_with_code() {
        let runtime = TestRuntime::new();
        let ctx = onboarding_context(&runtime).await;
        let port = FakeOnboardingPort::default();
        *port.fail_gitops_with.lock() = Some(PortError::Api {
            target: DownstreamTarget::ControlPlane,
            status: 400,
            code: "deployment_repository_wrong_application".into(),
            message: "deployment repository does not belong to application".into(),
        });

        let err = application_onboarding(&ctx, &port, &environments(), "app-1")
            .await
            .unwrap_err();

        assert_eq!(
            err.error_type(),
            Some("deployment_repository_wrong_application")
        );
        // Only one gitops attempt: 4xx must not retry.
        let gitops_calls = port.calls().iter().filter(|c| c.starts_with("gitops:")).count();
        assert_eq!(gitops_calls, 1);
    }

    #[tokio::test]
    async fn resumed_run_skips_completed_declarations() {
        let runtime = TestRuntime::new();
        let ctx = onboarding_context(&runtime).await;
        for step in [
            "declare-code-repository",
            "declare-deployment-repository",
            "declare-gitops-integration",
        ] {
            runtime.store.record_step("run-1", step).await.unwrap();
        }
        let port = FakeOnboardingPort::default();
        runtime.signals.deliver("run-1", SECURITY_SCAN_PASSED_SIGNAL);

        application_onboarding(&ctx, &port, &environments(), "app-1")
            .await
            .unwrap();

        assert_eq!(
            port.calls(),
            vec!["environments:app-1:env-dev,env-prod", "onboarding:app-1"]
        );
    }

    #[tokio::test]
    async fn activation_is_a_single_transition() {
        let runtime = TestRuntime::new();
        runtime
            .store
            .put(&WorkflowRun::new("run-act", "ApplicationActivation", "app-1"))
            .await
            .unwrap();
        let ctx = runtime.context("ApplicationActivation", "run-act");
        let port = FakeOnboardingPort::default();

        application_activation(&ctx, &port, "app-1").await.unwrap();

        assert_eq!(port.calls(), vec!["activate:app-1"]);
    }
}
