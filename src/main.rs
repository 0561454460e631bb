use std::{error::Error, sync::Arc};
use tokio::signal;

use config::{AppConfig, StorageKind};
use storage::{InMemoryStorage, LocalFileStorage, Storage};

mod config;
mod errors;
mod routes;
mod storage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    let storage: Arc<dyn Storage> = match config.storage_type {
        StorageKind::Memory => Arc::new(InMemoryStorage::new()),
        StorageKind::Local => {
            let storage = LocalFileStorage::new(config.storage_path.clone())?;
            tracing::info!(path = %storage.root().display(), "using local file storage");
            Arc::new(storage)
        }
    };

    let app = routes::router(storage, config.max_upload_bytes);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
