use std::sync::Arc;

use tracing::{info, warn};

use idp_control_plane::adapters::memory::in_memory_repositories;
use idp_control_plane::adapters::postgres::PgTeamRepository;
use idp_control_plane::application::Services;
use idp_control_plane::web;
use idp_shared::auth::InternalAuth;
use idp_shared::config::{env_or, require_env, ServiceIdentity};
use idp_shared::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing("control-plane-api");

    let mut repos = in_memory_repositories();

    // Teams get durable storage when DATABASE_URL is set and reachable;
    // everything else stays in memory.
    if let Some(database_url) = require_env("DATABASE_URL") {
        match PgTeamRepository::connect(&database_url).await {
            Ok(repo) => {
                info!("team storage: postgres");
                repos.teams = Arc::new(repo);
            }
            Err(err) => {
                warn!(error = %err, "DATABASE_URL unreachable; falling back to in-memory team storage");
            }
        }
    } else {
        info!("team storage: in-memory");
    }

    let services = Arc::new(Services::new(repos));
    let router = web::router(services, InternalAuth::from_env(), ServiceIdentity::from_env());

    let addr = env_or("LISTEN_ADDR", "0.0.0.0:8080");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "control-plane-api listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down control-plane-api");
        })
        .await?;

    logging::shutdown_tracing();
    Ok(())
}
