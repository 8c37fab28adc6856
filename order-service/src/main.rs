//! order-service: order ingestion and query service
//!
//! Long-running service that:
//! - Consumes order events from Kafka and stores them idempotently in PostgreSQL
//! - Dead-letters undecodable payloads
//! - Serves assembled orders over HTTP from a warm read-through cache

use std::sync::Arc;

use order_service::api;
use order_service::config::Config;
use order_service::consumer::IngestionPipeline;
use order_service::consumer::kafka::{KafkaDeadLetterSink, KafkaOrderStream};
use order_service::state::AppState;
use tokio_util::sync::CancellationToken;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_service=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(topic = %config.kafka_topic, "Starting order-service");

    let state = AppState::new(&config).await?;

    // Warm the cache before accepting traffic; a listing failure aborts startup
    let restored = state.orders.restore_cache().await?;
    tracing::info!(restored, "Cache warm-up complete");

    let shutdown = CancellationToken::new();
    let http_shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    // Ingestion pipeline
    let pipeline = IngestionPipeline::new(
        KafkaOrderStream::connect(&config)?,
        KafkaDeadLetterSink::connect(&config)?,
        Arc::clone(&state.ingest),
    );
    let pipeline_handle = tokio::spawn(pipeline.run(shutdown.clone()));

    // Query interface
    let app = api::create_router(state.orders.clone());
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("order-service HTTP listening on {http_addr}");

    let http_handle = tokio::spawn({
        let http_shutdown = http_shutdown.clone();
        async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { http_shutdown.cancelled().await })
                .await
            {
                tracing::error!("HTTP server error: {e}");
            }
        }
    });

    // Shutdown order: pipeline, then HTTP, then the pool
    match pipeline_handle.await {
        Ok(stats) => tracing::info!(?stats, "Ingestion pipeline drained"),
        Err(e) => tracing::error!("Ingestion pipeline task failed: {e}"),
    }
    http_shutdown.cancel();
    http_handle.await?;
    state.pool.close().await;

    tracing::info!("order-service stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
