//! Application state for the order service

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::cache::OrderCache;
use crate::config::Config;
use crate::db::{BoxError, PgTransactionManager, PgTx, Repositories};
use crate::services::{OrderIngestService, OrderQueryService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// Read path (cache + assembly), shared with the HTTP router
    pub orders: Arc<OrderQueryService<PgTx>>,
    /// Write path, driven by the ingestion pipeline
    pub ingest: Arc<OrderIngestService<PgTx>>,
}

impl AppState {
    /// Connect the pool and wire repositories, cache and use cases
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .max_lifetime(Duration::from_secs(60 * 60))
            .idle_timeout(Duration::from_secs(10 * 60))
            .connect(&config.database_url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        tracing::info!(
            max_connections = config.database_max_connections,
            "Database pool ready"
        );

        let repos = Repositories::postgres(&pool);
        let orders = Arc::new(OrderQueryService::new(repos.clone(), OrderCache::new()));
        let ingest = Arc::new(OrderIngestService::new(
            repos,
            Arc::new(PgTransactionManager::new(pool.clone())),
        ));

        Ok(Self {
            pool,
            orders,
            ingest,
        })
    }
}
