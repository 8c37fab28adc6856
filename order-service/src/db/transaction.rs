//! Transaction coordinator
//!
//! [`run_in_transaction`] opens one transaction, hands it to the unit of work as
//! a [`DbContext::Tx`], and commits only when the unit returns `Ok`. An error
//! return or a panic rolls back. Dropping the returned future mid-flight drops
//! the open transaction handle, which rolls back as well.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use sqlx::PgPool;

use super::{DbContext, PgTx, RepoError, RepoResult};

#[async_trait]
pub trait TransactionManager: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> RepoResult<Self::Tx>;
    async fn commit(&self, tx: Self::Tx) -> RepoResult<()>;
    async fn rollback(&self, tx: Self::Tx) -> RepoResult<()>;
}

pub struct PgTransactionManager {
    pool: PgPool,
}

impl PgTransactionManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionManager for PgTransactionManager {
    type Tx = PgTx;

    async fn begin(&self) -> RepoResult<PgTx> {
        Ok(self.pool.begin().await?)
    }

    async fn commit(&self, tx: PgTx) -> RepoResult<()> {
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self, tx: PgTx) -> RepoResult<()> {
        tx.rollback().await?;
        Ok(())
    }
}

/// Run `unit` inside one transaction.
///
/// The unit's own error is returned unchanged after rollback; a failed
/// rollback is only logged. A commit failure is returned as the store error.
pub async fn run_in_transaction<M, T, E, F>(manager: &M, unit: F) -> Result<T, E>
where
    M: TransactionManager + ?Sized,
    T: Send,
    E: From<RepoError> + Send,
    F: for<'c> FnOnce(DbContext<'c, M::Tx>) -> BoxFuture<'c, Result<T, E>> + Send,
{
    let mut tx = manager.begin().await?;

    let outcome = AssertUnwindSafe(unit(DbContext::Tx(&mut tx)))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(value)) => {
            manager.commit(tx).await?;
            Ok(value)
        }
        Ok(Err(err)) => {
            if let Err(rollback_err) = manager.rollback(tx).await {
                tracing::warn!(error = %rollback_err, "Transaction rollback failed");
            }
            Err(err)
        }
        Err(panic) => {
            if let Err(rollback_err) = manager.rollback(tx).await {
                tracing::warn!(error = %rollback_err, "Transaction rollback after panic failed");
            }
            std::panic::resume_unwind(panic)
        }
    }
}
