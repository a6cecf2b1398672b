use tracing::info;

use idp_execution_workers::config::WorkerConfig;
use idp_execution_workers::web::{self, WorkerState};
use idp_shared::auth::InternalAuth;
use idp_shared::config::{env_or, ServiceIdentity};
use idp_shared::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing("execution-workers");

    let config = WorkerConfig::from_env();
    info!(
        github_configured = config.github.is_some(),
        harbor_configured = config.harbor.is_some(),
        "execution-workers configuration loaded"
    );

    let state = WorkerState::new(config)?;
    let router = web::router(state, InternalAuth::from_env(), ServiceIdentity::from_env());

    let addr = env_or("LISTEN_ADDR", "0.0.0.0:8082");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "execution-workers listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down execution-workers");
        })
        .await?;

    logging::shutdown_tracing();
    Ok(())
}
