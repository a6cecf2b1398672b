use std::sync::Arc;

use tracing::info;

use idp_shared::auth::InternalAuth;
use idp_shared::config::{env_or, ServiceIdentity};
use idp_shared::logging;

use idp_workflow_engine::adapters::control_plane::ControlPlaneClient;
use idp_workflow_engine::adapters::execution_workers::ExecutionWorkersClient;
use idp_workflow_engine::engine::{EngineConfig, EnginePorts, WorkflowEngine};
use idp_workflow_engine::runtime::MemoryRunStore;
use idp_workflow_engine::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing("workflow-engine");

    let auth = InternalAuth::from_env();

    let control_plane_url = env_or("CONTROL_PLANE_API_URL", "http://control-plane-api:8080");
    let execution_workers_url = env_or("EXECUTION_WORKERS_URL", "http://execution-workers:8082");

    let control_plane = Arc::new(ControlPlaneClient::new(control_plane_url.clone(), auth.clone())?);
    let execution_workers = Arc::new(ExecutionWorkersClient::new(
        execution_workers_url.clone(),
        auth,
    )?);

    let ports = EnginePorts {
        onboarding: control_plane.clone(),
        control_plane: control_plane.clone(),
        secret_rotation: control_plane,
        git: execution_workers.clone(),
        appenv: execution_workers.clone(),
        secret_bindings: execution_workers,
    };

    let config = EngineConfig {
        onboarding_environment_ids: onboarding_environment_ids(),
        ..EngineConfig::default()
    };

    let engine = WorkflowEngine::new(Arc::new(MemoryRunStore::new()), ports, config);
    let resumed = engine.resume_running().await?;
    info!(
        resumed,
        control_plane = %control_plane_url,
        execution_workers = %execution_workers_url,
        "workflow engine initialized"
    );

    let router = web::router(engine, ServiceIdentity::from_env());

    let addr = env_or("LISTEN_ADDR", "0.0.0.0:8081");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "workflow-engine listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down workflow-engine");
        })
        .await?;

    logging::shutdown_tracing();
    Ok(())
}

/// Environments declared during onboarding, externalized as configuration.
fn onboarding_environment_ids() -> Vec<String> {
    env_or("ONBOARDING_ENVIRONMENT_IDS", "env-dev,env-prod")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
