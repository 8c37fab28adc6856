//! Read-through order cache
//!
//! Process-lifetime map of `order_uid` to the fully assembled aggregate. No
//! capacity bound, no expiry, and the write path never touches it: the store is
//! the system of record and the cache can be rebuilt from it at any time.

use std::sync::Arc;

use dashmap::DashMap;
use shared::models::Order;

#[derive(Clone, Default)]
pub struct OrderCache {
    orders: Arc<DashMap<String, Arc<Order>>>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, order_uid: &str) -> Option<Arc<Order>> {
        let hit = self.orders.get(order_uid).map(|entry| entry.value().clone());
        tracing::debug!(order_uid, hit = hit.is_some(), "Order cache lookup");
        hit
    }

    /// Insert or overwrite.
    pub fn put(&self, order_uid: impl Into<String>, order: Arc<Order>) {
        let order_uid = order_uid.into();
        tracing::debug!(order_uid = %order_uid, "Order cached");
        self.orders.insert(order_uid, order);
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
