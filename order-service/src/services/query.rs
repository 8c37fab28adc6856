//! Order assembly (read path)

use std::sync::Arc;

use shared::models::Order;

use crate::cache::OrderCache;
use crate::db::{DbContext, RepoError, Repositories};
use crate::error::{OrderError, OrderResult};

pub struct OrderQueryService<Tx> {
    repos: Repositories<Tx>,
    cache: OrderCache,
}

impl<Tx: Send + 'static> OrderQueryService<Tx> {
    pub fn new(repos: Repositories<Tx>, cache: OrderCache) -> Self {
        Self { repos, cache }
    }

    /// Number of aggregates currently cached
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Cache first; on a miss assemble the aggregate from the four
    /// repositories and cache it. Any store error aborts, so a partial
    /// aggregate is never returned or cached.
    pub async fn get_order_by_id(&self, order_uid: &str) -> OrderResult<Arc<Order>> {
        if let Some(order) = self.cache.get(order_uid) {
            return Ok(order);
        }

        let mut cx = DbContext::Ambient;

        let mut order = match self.repos.orders.get_by_id(&mut cx, order_uid).await {
            Ok(order) => order,
            Err(RepoError::NotFound(_)) => return Err(OrderError::NotFound(order_uid.to_string())),
            Err(e) => return Err(e.into()),
        };

        order.delivery = self.repos.deliveries.get_by_order_uid(&mut cx, order_uid).await?;
        // Payment is keyed by transaction, which equals the order id
        order.payment = self.repos.payments.get_by_transaction(&mut cx, order_uid).await?;
        order.items = self
            .repos
            .items
            .get_by_track_number(&mut cx, &order.track_number)
            .await?;

        let order = Arc::new(order);
        self.cache.put(order_uid, order.clone());
        tracing::debug!(order_uid, items = order.items.len(), "Order assembled from store");
        Ok(order)
    }

    /// Warm the cache with every stored order.
    ///
    /// Per-order failures are logged and skipped; only a failure to list the
    /// ids is returned.
    pub async fn restore_cache(&self) -> OrderResult<usize> {
        let order_uids = self
            .repos
            .orders
            .list_order_uids(&mut DbContext::Ambient)
            .await?;

        let mut restored = 0usize;
        for order_uid in &order_uids {
            match self.get_order_by_id(order_uid).await {
                Ok(_) => restored += 1,
                Err(e) => {
                    tracing::warn!(order_uid = %order_uid, error = %e, "Failed to restore order into cache");
                }
            }
        }

        tracing::info!(restored, total = order_uids.len(), "Order cache restored");
        Ok(restored)
    }
}
