//! Database access layer
//!
//! Four independent repositories (orders, deliveries, payments, items) plus the
//! transaction coordinator. Every repository call takes a [`DbContext`]: either
//! `Ambient` (run on a pooled connection) or a borrowed open transaction, so
//! repositories compose inside one unit of work without knowing about each other.

pub mod deliveries;
pub mod items;
pub mod orders;
pub mod payments;
pub mod transaction;

#[cfg(test)]
pub(crate) mod memory;

pub use deliveries::{DeliveryRepository, PgDeliveryRepository};
pub use items::{ItemRepository, PgItemRepository};
pub use orders::{OrderRepository, PgOrderRepository};
pub use payments::{PaymentRepository, PgPaymentRepository};
pub use transaction::{PgTransactionManager, TransactionManager, run_in_transaction};

use std::sync::Arc;

use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Open Postgres transaction
pub type PgTx = sqlx::Transaction<'static, Postgres>;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique-key violation reported by the store
    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(BoxError),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Duplicate(db_err.message().to_string())
            }
            other => RepoError::Database(other.into()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Execution context threaded through every repository call
///
/// Single level only: a unit of work never opens a nested transaction.
pub enum DbContext<'a, Tx> {
    /// No unit of work bound, run on a pooled connection
    Ambient,
    /// Run against the bound transaction
    Tx(&'a mut Tx),
}

/// The four repositories behind one order aggregate
pub struct Repositories<Tx> {
    pub orders: Arc<dyn OrderRepository<Tx>>,
    pub deliveries: Arc<dyn DeliveryRepository<Tx>>,
    pub payments: Arc<dyn PaymentRepository<Tx>>,
    pub items: Arc<dyn ItemRepository<Tx>>,
}

// Manual impl: derive would require `Tx: Clone`
impl<Tx> Clone for Repositories<Tx> {
    fn clone(&self) -> Self {
        Self {
            orders: self.orders.clone(),
            deliveries: self.deliveries.clone(),
            payments: self.payments.clone(),
            items: self.items.clone(),
        }
    }
}

impl Repositories<PgTx> {
    /// Postgres-backed repositories sharing one pool
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            orders: Arc::new(PgOrderRepository::new(pool.clone())),
            deliveries: Arc::new(PgDeliveryRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            items: Arc::new(PgItemRepository::new(pool.clone())),
        }
    }
}

// ── Postgres connection resolution ──

/// Connection a Postgres repository executes on
pub(crate) enum PgConn<'a> {
    Pooled(PoolConnection<Postgres>),
    Tx(&'a mut PgConnection),
}

impl PgConn<'_> {
    pub(crate) fn executor(&mut self) -> &mut PgConnection {
        match self {
            PgConn::Pooled(conn) => &mut **conn,
            PgConn::Tx(conn) => &mut **conn,
        }
    }
}

/// Resolve the context to a connection: the bound transaction if any,
/// otherwise a fresh connection from the pool.
pub(crate) async fn pg_conn<'a>(
    pool: &PgPool,
    cx: &'a mut DbContext<'_, PgTx>,
) -> RepoResult<PgConn<'a>> {
    match cx {
        DbContext::Ambient => Ok(PgConn::Pooled(pool.acquire().await?)),
        DbContext::Tx(tx) => Ok(PgConn::Tx(&mut ***tx)),
    }
}
