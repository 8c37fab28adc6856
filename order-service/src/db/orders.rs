//! Root order repository

use async_trait::async_trait;
use shared::models::Order;
use sqlx::PgPool;

use super::{DbContext, PgTx, RepoError, RepoResult, pg_conn};

#[async_trait]
pub trait OrderRepository<Tx>: Send + Sync {
    /// Root row only; relations are left at their defaults.
    async fn get_by_id(&self, cx: &mut DbContext<'_, Tx>, order_uid: &str) -> RepoResult<Order>;

    /// Raw insert of the root row. A second insert for the same key surfaces
    /// as [`RepoError::Duplicate`].
    async fn save(&self, cx: &mut DbContext<'_, Tx>, order: &Order) -> RepoResult<()>;

    async fn list_order_uids(&self, cx: &mut DbContext<'_, Tx>) -> RepoResult<Vec<String>>;
}

#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository<PgTx> for PgOrderRepository {
    async fn get_by_id(&self, cx: &mut DbContext<'_, PgTx>, order_uid: &str) -> RepoResult<Order> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        let order: Option<Order> = sqlx::query_as(
            r#"
            SELECT order_uid, track_number, entry, locale, internal_signature,
                   customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
            FROM orders
            WHERE order_uid = $1
            "#,
        )
        .bind(order_uid)
        .fetch_optional(conn.executor())
        .await?;
        order.ok_or_else(|| RepoError::NotFound(format!("order {order_uid}")))
    }

    async fn save(&self, cx: &mut DbContext<'_, PgTx>, order: &Order) -> RepoResult<()> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        sqlx::query(
            r#"
            INSERT INTO orders (
                order_uid, track_number, entry, locale, internal_signature,
                customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(&order.entry)
        .bind(&order.locale)
        .bind(&order.internal_signature)
        .bind(&order.customer_id)
        .bind(&order.delivery_service)
        .bind(&order.shardkey)
        .bind(order.sm_id)
        .bind(order.date_created)
        .bind(&order.oof_shard)
        .execute(conn.executor())
        .await?;
        Ok(())
    }

    async fn list_order_uids(&self, cx: &mut DbContext<'_, PgTx>) -> RepoResult<Vec<String>> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        let uids: Vec<String> = sqlx::query_scalar("SELECT order_uid FROM orders")
            .fetch_all(conn.executor())
            .await?;
        Ok(uids)
    }
}
