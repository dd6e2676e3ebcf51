use std::sync::Arc;

use adzuna_jobs_mcp::{adzuna::AdzunaClient, build_app, config::Config, logging, AppState};
use dotenv::dotenv;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    logging::init_logging();

    let config = Config::from_env()?;
    let missing = config.missing_credentials();
    if !missing.is_empty() {
        warn!(
            missing = ?missing,
            "adzuna credentials not configured; job operations will fail until they are set"
        );
    }

    let provider = Arc::new(AdzunaClient::new(&config)?);
    let bind_socket = config.bind_socket()?;
    let state = AppState::new(config.api_token.clone(), provider);
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        base_url = %config.base_url,
        timeout_secs = config.timeout.as_secs(),
        mcp_auth = config.api_token.is_some(),
        "server starting"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
