//! Line item repository
//!
//! Items are related to their order through the shared `track_number`, not the
//! order id.

use async_trait::async_trait;
use shared::models::Item;
use sqlx::PgPool;

use super::{DbContext, PgTx, RepoResult, pg_conn};

#[async_trait]
pub trait ItemRepository<Tx>: Send + Sync {
    /// May be empty.
    async fn get_by_track_number(
        &self,
        cx: &mut DbContext<'_, Tx>,
        track_number: &str,
    ) -> RepoResult<Vec<Item>>;

    async fn save(&self, cx: &mut DbContext<'_, Tx>, item: &Item) -> RepoResult<()>;
}

#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepository<PgTx> for PgItemRepository {
    async fn get_by_track_number(
        &self,
        cx: &mut DbContext<'_, PgTx>,
        track_number: &str,
    ) -> RepoResult<Vec<Item>> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        let items: Vec<Item> = sqlx::query_as(
            r#"
            SELECT rid, track_number, chrt_id, price, name, sale, size,
                   total_price, nm_id, brand, status
            FROM items
            WHERE track_number = $1
            "#,
        )
        .bind(track_number)
        .fetch_all(conn.executor())
        .await?;
        Ok(items)
    }

    async fn save(&self, cx: &mut DbContext<'_, PgTx>, item: &Item) -> RepoResult<()> {
        let mut conn = pg_conn(&self.pool, cx).await?;
        sqlx::query(
            r#"
            INSERT INTO items (
                rid, track_number, chrt_id, price, name, sale, size,
                total_price, nm_id, brand, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&item.rid)
        .bind(&item.track_number)
        .bind(item.chrt_id)
        .bind(item.price)
        .bind(&item.name)
        .bind(item.sale)
        .bind(&item.size)
        .bind(item.total_price)
        .bind(item.nm_id)
        .bind(&item.brand)
        .bind(item.status)
        .execute(conn.executor())
        .await?;
        Ok(())
    }
}
