use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use sidepanel::api;
use sidepanel::config::{Config, DatabaseBackend};
use sidepanel::logging;
use sidepanel::storage::{PostgresStorage, SqliteStorage, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    logging::init(&config.log_level);
    info!("Loaded configuration");

    // Initialize storage
    let storage: Arc<dyn Storage> = match config.database.backend {
        DatabaseBackend::Sqlite => {
            info!("Using SQLite storage: {}", config.database.url);
            Arc::new(
                SqliteStorage::new(&config.database.url, config.database.max_connections).await?,
            )
        }
        DatabaseBackend::Postgres => {
            info!("Using PostgreSQL storage");
            Arc::new(
                PostgresStorage::new(&config.database.url, config.database.max_connections)
                    .await?,
            )
        }
    };

    // Initialize database
    info!("Initializing database...");
    storage.init().await?;
    storage
        .ping()
        .await
        .context("Database connectivity check failed")?;
    info!("Database initialized successfully");

    if config.http.cors_allowed_origins.is_empty() {
        info!("CORS: allowing any origin");
    } else {
        info!("CORS: allowing {:?}", config.http.cors_allowed_origins);
    }

    if config.http.rate_limit.enabled {
        info!(
            "Rate limiting: {} reads/min, {} writes/min per client IP",
            config.http.rate_limit.read_per_minute, config.http.rate_limit.write_per_minute
        );
    }

    let api_router = api::create_api_router(Arc::clone(&storage), &config.http);

    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("Failed to bind API server: {api_addr}"))?;
    info!("🚀 API server listening on http://{}", api_addr);

    axum::serve(
        api_listener,
        api_router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
