//! Idempotent order ingestion (write path)
//!
//! One unit of work per order: existence check, then root, delivery, payment
//! and items in input order. Either every row commits or none does.

use std::sync::Arc;

use futures::FutureExt;
use shared::models::Order;

use crate::db::{RepoError, Repositories, TransactionManager, run_in_transaction};
use crate::error::{OrderError, OrderResult};

pub struct OrderIngestService<Tx> {
    repos: Repositories<Tx>,
    tx_manager: Arc<dyn TransactionManager<Tx = Tx>>,
}

impl<Tx: Send + 'static> OrderIngestService<Tx> {
    pub fn new(repos: Repositories<Tx>, tx_manager: Arc<dyn TransactionManager<Tx = Tx>>) -> Self {
        Self { repos, tx_manager }
    }

    /// Persist the aggregate.
    ///
    /// Returns [`OrderError::AlreadyExists`] when the order id is already
    /// stored, whether found by the existence check or reported by the root
    /// key constraint on insert.
    pub async fn save(&self, mut order: Order) -> OrderResult<()> {
        stamp_children(&mut order);

        let order_uid = order.order_uid.clone();
        let item_count = order.items.len();
        let repos = self.repos.clone();

        run_in_transaction(self.tx_manager.as_ref(), move |mut cx| {
            async move {
                match repos.orders.get_by_id(&mut cx, &order.order_uid).await {
                    Ok(_) => return Err(OrderError::AlreadyExists(order.order_uid)),
                    Err(RepoError::NotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                }

                match repos.orders.save(&mut cx, &order).await {
                    Ok(()) => {}
                    Err(RepoError::Duplicate(_)) => {
                        return Err(OrderError::AlreadyExists(order.order_uid));
                    }
                    Err(e) => return Err(e.into()),
                }

                repos.deliveries.save(&mut cx, &order.delivery).await?;
                repos.payments.save(&mut cx, &order.payment).await?;
                for item in &order.items {
                    repos.items.save(&mut cx, item).await?;
                }
                Ok(())
            }
            .boxed()
        })
        .await?;

        tracing::info!(order_uid = %order_uid, items = item_count, "Order saved");
        Ok(())
    }
}

/// The root is authoritative: delivery and payment take its id, items take
/// its track number.
fn stamp_children(order: &mut Order) {
    order.delivery.order_uid = order.order_uid.clone();
    order.payment.transaction = order.order_uid.clone();
    for item in &mut order.items {
        if item.track_number != order.track_number {
            tracing::warn!(
                order_uid = %order.order_uid,
                rid = %item.rid,
                item_track = %item.track_number,
                order_track = %order.track_number,
                "Item track number differs from order, overwriting"
            );
            item.track_number = order.track_number.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::OrderCache;
    use crate::db::memory::{MemoryStore, MemoryTx, sample_order};
    use crate::db::{DbContext, OrderRepository, RepoResult};
    use crate::services::OrderQueryService;
    use async_trait::async_trait;

    fn service(store: &MemoryStore) -> OrderIngestService<MemoryTx> {
        OrderIngestService::new(store.repositories(), store.tx_manager())
    }

    #[tokio::test]
    async fn test_save_writes_every_row() {
        let store = MemoryStore::new();
        let svc = service(&store);

        svc.save(sample_order("abc-1", "T1", 2)).await.unwrap();

        assert_eq!(store.order_count(), 1);
        assert_eq!(store.delivery_count(), 1);
        assert_eq!(store.payment_count(), 1);
        assert_eq!(store.item_count(), 2);
        assert_eq!(store.calls("tx.commit"), 1);
    }

    #[tokio::test]
    async fn test_second_save_already_exists() {
        let store = MemoryStore::new();
        let svc = service(&store);

        svc.save(sample_order("abc-1", "T1", 2)).await.unwrap();
        let err = svc.save(sample_order("abc-1", "T1", 2)).await.unwrap_err();

        assert!(matches!(err, OrderError::AlreadyExists(ref uid) if uid == "abc-1"));
        assert_eq!(store.order_count(), 1);
        assert_eq!(store.item_count(), 2);
        assert_eq!(store.calls("tx.rollback"), 1);
    }

    #[tokio::test]
    async fn test_item_failure_rolls_back_everything() {
        let store = MemoryStore::new();
        let svc = service(&store);
        store.fail_next("items.save", 1);

        let err = svc.save(sample_order("abc-1", "T1", 3)).await.unwrap_err();

        assert!(matches!(err, OrderError::Store(_)));
        assert_eq!(store.order_count(), 0);
        assert_eq!(store.delivery_count(), 0);
        assert_eq!(store.payment_count(), 0);
        assert_eq!(store.item_count(), 0);
        assert_eq!(store.calls("items.save"), 1);
    }

    #[tokio::test]
    async fn test_existence_check_failure_aborts() {
        let store = MemoryStore::new();
        let svc = service(&store);
        store.fail_next("orders.get", 1);

        let err = svc.save(sample_order("abc-1", "T1", 1)).await.unwrap_err();

        assert!(matches!(err, OrderError::Store(_)));
        assert_eq!(store.calls("orders.save"), 0);
        assert_eq!(store.order_count(), 0);
    }

    #[tokio::test]
    async fn test_retry_after_transient_failure_stores_once() {
        let store = MemoryStore::new();
        let svc = service(&store);
        store.fail_next("payments.save", 1);

        assert!(svc.save(sample_order("abc-1", "T1", 2)).await.is_err());
        svc.save(sample_order("abc-1", "T1", 2)).await.unwrap();

        assert_eq!(store.order_count(), 1);
        assert_eq!(store.item_count(), 2);
    }

    #[tokio::test]
    async fn test_children_stamped_from_root() {
        let store = MemoryStore::new();
        let svc = service(&store);

        let mut order = sample_order("abc-1", "T1", 2);
        order.payment.transaction = "something-else".into();
        order.delivery.order_uid = "stale".into();
        order.items[1].track_number = "WRONG".into();
        svc.save(order).await.unwrap();

        let query = OrderQueryService::new(store.repositories(), OrderCache::new());
        let stored = query.get_order_by_id("abc-1").await.unwrap();
        assert_eq!(stored.payment.transaction, "abc-1");
        assert_eq!(stored.delivery.order_uid, "abc-1");
        assert_eq!(stored.items.len(), 2);
    }

    /// Order repository whose existence check never sees anything, standing in
    /// for a concurrent writer that committed between check and insert.
    struct BlindOrders(MemoryStore);

    #[async_trait]
    impl OrderRepository<MemoryTx> for BlindOrders {
        async fn get_by_id(
            &self,
            _cx: &mut DbContext<'_, MemoryTx>,
            order_uid: &str,
        ) -> RepoResult<Order> {
            Err(RepoError::NotFound(order_uid.to_string()))
        }

        async fn save(&self, cx: &mut DbContext<'_, MemoryTx>, order: &Order) -> RepoResult<()> {
            OrderRepository::save(&self.0, cx, order).await
        }

        async fn list_order_uids(
            &self,
            cx: &mut DbContext<'_, MemoryTx>,
        ) -> RepoResult<Vec<String>> {
            OrderRepository::list_order_uids(&self.0, cx).await
        }
    }

    #[tokio::test]
    async fn test_root_key_violation_is_already_exists() {
        let store = MemoryStore::new();
        store.seed(&sample_order("abc-1", "T1", 1));

        let mut repos = store.repositories();
        repos.orders = Arc::new(BlindOrders(store.clone()));
        let svc = OrderIngestService::new(repos, store.tx_manager());

        let err = svc.save(sample_order("abc-1", "T1", 1)).await.unwrap_err();
        assert!(matches!(err, OrderError::AlreadyExists(_)));
        assert_eq!(store.order_count(), 1);
        assert_eq!(store.item_count(), 1);
    }
}
