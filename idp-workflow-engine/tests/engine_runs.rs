//! Engine-level workflow runs: end-to-end scenarios against fake ports,
//! including the virtual-time timeout cases and crash-resume behavior.

mod support;

use std::sync::Arc;
use std::time::Duration;

use idp_workflow_engine::engine::WorkflowKind;
use idp_workflow_engine::runtime::{MemoryRunStore, RunStatus, RunStore, WorkflowRun};
use idp_workflow_engine::workflows::{ROTATION_VALIDATED_SIGNAL, SECURITY_SCAN_PASSED_SIGNAL};

use support::engine_with_store;

async fn wait_for_terminal(
    engine: &idp_workflow_engine::engine::WorkflowEngine,
    run_id: &str,
    poll: Duration,
) -> WorkflowRun {
    loop {
        if let Some(run) = engine.run(run_id).await.unwrap() {
            if run.status != RunStatus::Running {
                return run;
            }
        }
        tokio::time::sleep(poll).await;
    }
}

#[tokio::test]
async fn appenv_provisioning_runs_side_effects_in_order_exactly_once() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    let run_id = engine
        .start(WorkflowKind::ApplicationEnvironmentProvisioning, "ae-1")
        .await
        .unwrap();
    let run = wait_for_terminal(&engine, &run_id, Duration::from_millis(5)).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(
        ports.calls(),
        vec![
            "create-repository:platform/appenv-ae-1:private=true",
            "apply-branch-protection:ae-1",
            "provision-secrets:ae-1",
            "create-secret-bindings:ae-1",
            "verify-gitops-reconciliation:ae-1",
            "complete-provisioning:ae-1",
        ]
    );
}

#[tokio::test]
async fn onboarding_completes_after_security_scan_signal() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    let run_id = engine
        .start(WorkflowKind::ApplicationOnboarding, "app-1")
        .await
        .unwrap();
    // Signal may arrive before the workflow reaches its wait; it buffers.
    assert!(engine.signal(&run_id, SECURITY_SCAN_PASSED_SIGNAL).await.unwrap());

    let run = wait_for_terminal(&engine, &run_id, Duration::from_millis(5)).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(
        ports.calls(),
        vec![
            "declare-code-repository:app-1",
            "declare-deployment-repository:app-1",
            "declare-gitops-integration:app-1",
            "declare-application-environments:app-1:env-dev,env-prod",
            "mark-application-onboarding:app-1",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn onboarding_times_out_without_signal_and_never_transitions() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    let run_id = engine
        .start(WorkflowKind::ApplicationOnboarding, "app-1")
        .await
        .unwrap();
    let run = wait_for_terminal(&engine, &run_id, Duration::from_secs(100)).await;

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failure.unwrap().error_type, "security_scan_timeout");
    assert_eq!(ports.count("mark-application-onboarding"), 0);
}

#[tokio::test(start_paused = true)]
async fn secret_rotation_times_out_without_external_validation() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    let run_id = engine
        .start(WorkflowKind::SecretRotation, "sec-1")
        .await
        .unwrap();
    let run = wait_for_terminal(&engine, &run_id, Duration::from_secs(300)).await;

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failure.unwrap().error_type, "secret_rotation_timeout");
    // The secret must stay in Rotating: no completion call was made.
    assert_eq!(ports.count("complete-secret-rotation"), 0);
    assert_eq!(ports.count("update-secret-bindings"), 0);
}

#[tokio::test]
async fn secret_rotation_completes_after_validation_signal() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    let run_id = engine
        .start(WorkflowKind::SecretRotation, "sec-1")
        .await
        .unwrap();
    assert!(engine.signal(&run_id, ROTATION_VALIDATED_SIGNAL).await.unwrap());

    let run = wait_for_terminal(&engine, &run_id, Duration::from_millis(5)).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(ports.count("update-secret-bindings"), 1);
    assert_eq!(ports.count("complete-secret-rotation"), 1);
}

/// Thread-level interleaving of signal delivery and the workflow's wait
/// registration: the delivery task and the spawned workflow task run on
/// separate worker threads, as they do in production where signals arrive on
/// request-handling tasks. A lost wakeup would leave the workflow parked on
/// its 900 s timer and trip the completion bound.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn signal_racing_the_workflow_wait_still_completes_promptly() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    for i in 0..50 {
        let subject = format!("app-race-{i}");
        let run_id = engine
            .start(WorkflowKind::ApplicationOnboarding, &subject)
            .await
            .unwrap();

        let delivery = {
            let engine = engine.clone();
            let run_id = run_id.clone();
            tokio::spawn(async move {
                engine.signal(&run_id, SECURITY_SCAN_PASSED_SIGNAL).await.unwrap()
            })
        };
        assert!(delivery.await.unwrap(), "iteration {i}: signal not accepted");

        let run = tokio::time::timeout(
            Duration::from_secs(30),
            wait_for_terminal(&engine, &run_id, Duration::from_millis(2)),
        )
        .await
        .unwrap_or_else(|_| panic!("iteration {i}: workflow stuck waiting for a delivered signal"));
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(ports.count(&format!("mark-application-onboarding:{subject}")), 1);
    }
}

#[tokio::test]
async fn signals_to_unknown_instances_are_rejected() {
    let (engine, _) = engine_with_store(Arc::new(MemoryRunStore::new()));
    assert!(!engine.signal("ghost", SECURITY_SCAN_PASSED_SIGNAL).await.unwrap());
}

#[tokio::test]
async fn starting_a_running_instance_does_not_spawn_a_second_execution() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    let first = engine
        .start(WorkflowKind::ApplicationOnboarding, "app-1")
        .await
        .unwrap();
    let second = engine
        .start(WorkflowKind::ApplicationOnboarding, "app-1")
        .await
        .unwrap();
    assert_eq!(first, second);

    engine.signal(&first, SECURITY_SCAN_PASSED_SIGNAL).await.unwrap();
    wait_for_terminal(&engine, &first, Duration::from_millis(5)).await;

    assert_eq!(ports.count("declare-code-repository"), 1);
}

#[tokio::test]
async fn resume_skips_checkpointed_steps() {
    let store = Arc::new(MemoryRunStore::new());

    // A previous process got through the first four steps before dying.
    let mut run = WorkflowRun::new(
        WorkflowKind::ApplicationEnvironmentProvisioning.instance_id("ae-1"),
        "ApplicationEnvironmentProvisioning",
        "ae-1",
    );
    run.completed_steps = vec![
        "materialize-repositories".to_string(),
        "apply-branch-protection".to_string(),
        "provision-secrets".to_string(),
        "create-secret-bindings".to_string(),
    ];
    store.put(&run).await.unwrap();

    let (engine, ports) = engine_with_store(store);
    assert_eq!(engine.resume_running().await.unwrap(), 1);

    let finished = wait_for_terminal(&engine, &run.id, Duration::from_millis(5)).await;

    assert_eq!(finished.status, RunStatus::Completed);
    assert_eq!(
        ports.calls(),
        vec!["verify-gitops-reconciliation:ae-1", "complete-provisioning:ae-1"]
    );
}

#[tokio::test]
async fn terminal_runs_can_be_restarted() {
    let (engine, ports) = engine_with_store(Arc::new(MemoryRunStore::new()));

    let run_id = engine
        .start(WorkflowKind::ApplicationActivation, "app-1")
        .await
        .unwrap();
    let run = wait_for_terminal(&engine, &run_id, Duration::from_millis(5)).await;
    assert_eq!(run.status, RunStatus::Completed);

    // A fresh start of the same instance id re-executes from scratch.
    let restarted = engine
        .start(WorkflowKind::ApplicationActivation, "app-1")
        .await
        .unwrap();
    assert_eq!(restarted, run_id);
    let run = wait_for_terminal(&engine, &run_id, Duration::from_millis(5)).await;

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(ports.count("activate-application"), 2);
}
