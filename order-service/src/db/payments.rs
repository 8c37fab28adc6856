//! Payment repository (keyed by `transaction`, which equals the order's `order_uid`)

use async_trait::async_trait;
use shared::models::Payment;
use sqlx::PgPool;

use super::{DbContext, PgTx, RepoError, RepoResult, pg_conn};

#[async_trait]
pub trait PaymentRepository<Tx>: Send + Sync {
    async fn get_by_transaction(
        &self,
        cx: &mut DbContext<'_, Tx>,
        transaction: &str,
    ) -> RepoResult<Payment>;

    async fn save(&self, cx: &mut DbContext<'_, Tx>, payment: &Payment) -> RepoResult<()>;
}

#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository<PgTx> for PgPaymentRepository {
    async fn get_by_transaction(
        &self,
        cx: &mut DbContext<'_, PgTx>,
        transaction: &str,
    ) -> RepoResult<Payment> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        // The surrogate `id` column stays store-side
        let payment: Option<Payment> = sqlx::query_as(
            r#"
            SELECT transaction, request_id, currency, provider, amount, payment_dt, bank,
                   delivery_cost, goods_total, custom_fee
            FROM payments
            WHERE transaction = $1
            "#,
        )
        .bind(transaction)
        .fetch_optional(conn.executor())
        .await?;
        payment.ok_or_else(|| {
            RepoError::Database(format!("payment missing for transaction {transaction}").into())
        })
    }

    async fn save(&self, cx: &mut DbContext<'_, PgTx>, payment: &Payment) -> RepoResult<()> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        sqlx::query(
            r#"
            INSERT INTO payments (
                transaction, request_id, currency, provider, amount, payment_dt, bank,
                delivery_cost, goods_total, custom_fee
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&payment.transaction)
        .bind(&payment.request_id)
        .bind(&payment.currency)
        .bind(&payment.provider)
        .bind(payment.amount)
        .bind(payment.payment_dt)
        .bind(&payment.bank)
        .bind(payment.delivery_cost)
        .bind(payment.goods_total)
        .bind(payment.custom_fee)
        .execute(conn.executor())
        .await?;
        Ok(())
    }
}
