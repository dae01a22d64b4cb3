mod config;
mod db;
mod errors;
mod jobseekers;
mod models;
mod resumes;
mod routes;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::resumes::ResumeStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::select_store;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobseekers API v{}", env!("CARGO_PKG_VERSION"));

    // Pick the backing store (networked, embedded or in-memory)
    let store = select_store(&config).await?;

    let resumes = ResumeStore::new(config.upload_dir.clone(), config.max_resume_bytes);
    info!(
        "Resume uploads in {} (max {} bytes)",
        resumes.dir().display(),
        resumes.max_bytes()
    );

    let state = AppState {
        store: store.clone(),
        resumes,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Storage closed, shutting down");

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
    info!("Shutdown signal received");
}
