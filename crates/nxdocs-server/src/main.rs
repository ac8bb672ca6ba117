//! NetExec docs server entry point.
//!
//! Selects the storage backend for the deployment target, optionally seeds
//! it, then starts the Axum HTTP server with graceful shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use nxdocs_storage::{MemoryStorage, Storage};

use nxdocs_server::config::{DeploymentTarget, ServerConfig, StorageBackendType};
use nxdocs_server::routes::build_router;
use nxdocs_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(deployment = %config.deployment, "nxdocs starting");

    let storage = open_storage(&config).await?;

    if config.seed_database {
        storage
            .initialize()
            .await
            .context("failed to seed storage")?;
        info!("storage seeded from bundled fixtures");
    }

    let state = Arc::new(AppState::new(storage));
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "nxdocs server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("nxdocs server stopped");
    Ok(())
}

/// Open the backend chosen by the configuration.
async fn open_storage(config: &ServerConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.storage_backend()? {
        StorageBackendType::Memory => {
            info!("using in-memory storage (saved commands will not persist)");
            memory_storage()
        }
        StorageBackendType::Postgres { url } => open_postgres(&url, config.deployment).await,
    }
}

fn memory_storage() -> anyhow::Result<Arc<dyn Storage>> {
    let storage = MemoryStorage::seeded().context("failed to load bundled fixtures")?;
    Ok(Arc::new(storage))
}

#[cfg(feature = "postgres-backend")]
async fn open_postgres(url: &str, deployment: DeploymentTarget) -> anyhow::Result<Arc<dyn Storage>> {
    info!(url = %"[redacted]", "using PostgreSQL storage");
    match nxdocs_storage::PostgresStorage::connect(url).await {
        Ok(storage) => Ok(Arc::new(storage)),
        Err(e) if deployment == DeploymentTarget::Server => {
            warn!(error = %e, "PostgreSQL unavailable, falling back to in-memory storage");
            memory_storage()
        }
        Err(e) => Err(e).context("failed to connect to PostgreSQL storage"),
    }
}

#[cfg(not(feature = "postgres-backend"))]
async fn open_postgres(_url: &str, deployment: DeploymentTarget) -> anyhow::Result<Arc<dyn Storage>> {
    if deployment == DeploymentTarget::Functions {
        anyhow::bail!("PostgreSQL backend requested but feature 'postgres-backend' is not enabled");
    }
    warn!("feature 'postgres-backend' is not enabled, falling back to in-memory storage");
    memory_storage()
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
