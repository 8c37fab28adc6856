//! Delivery repository (1:1 with the order, keyed by `order_uid`)

use async_trait::async_trait;
use shared::models::Delivery;
use sqlx::PgPool;

use super::{DbContext, PgTx, RepoError, RepoResult, pg_conn};

#[async_trait]
pub trait DeliveryRepository<Tx>: Send + Sync {
    /// A missing row is a store error: every stored order owns a delivery.
    async fn get_by_order_uid(
        &self,
        cx: &mut DbContext<'_, Tx>,
        order_uid: &str,
    ) -> RepoResult<Delivery>;

    async fn save(&self, cx: &mut DbContext<'_, Tx>, delivery: &Delivery) -> RepoResult<()>;
}

#[derive(Clone)]
pub struct PgDeliveryRepository {
    pool: PgPool,
}

impl PgDeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryRepository<PgTx> for PgDeliveryRepository {
    async fn get_by_order_uid(
        &self,
        cx: &mut DbContext<'_, PgTx>,
        order_uid: &str,
    ) -> RepoResult<Delivery> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        let delivery: Option<Delivery> = sqlx::query_as(
            r#"
            SELECT order_uid, name, phone, zip, city, address, region, email
            FROM deliveries
            WHERE order_uid = $1
            "#,
        )
        .bind(order_uid)
        .fetch_optional(conn.executor())
        .await?;
        delivery.ok_or_else(|| {
            RepoError::Database(format!("delivery missing for order {order_uid}").into())
        })
    }

    async fn save(&self, cx: &mut DbContext<'_, PgTx>, delivery: &Delivery) -> RepoResult<()> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        sqlx::query(
            r#"
            INSERT INTO deliveries (order_uid, name, phone, zip, city, address, region, email)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&delivery.order_uid)
        .bind(&delivery.name)
        .bind(&delivery.phone)
        .bind(&delivery.zip)
        .bind(&delivery.city)
        .bind(&delivery.address)
        .bind(&delivery.region)
        .bind(&delivery.email)
        .execute(conn.executor())
        .await?;
        Ok(())
    }
}
