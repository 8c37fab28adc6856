//! In-memory store for tests
//!
//! Implements the four repositories and the transaction manager over plain
//! vectors. Writes inside a transaction are staged on the [`MemoryTx`] and
//! only become visible to other callers on commit. Every operation is counted,
//! and any operation can be made to fail with [`MemoryStore::fail_next`].
//!
//! Operation names: `orders.get`, `orders.save`, `orders.list`,
//! `deliveries.get`, `deliveries.save`, `payments.get`, `payments.save`,
//! `items.get`, `items.save`, `tx.begin`, `tx.commit`, `tx.rollback`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use shared::models::{Delivery, Item, Order, Payment};

use super::{
    DbContext, DeliveryRepository, ItemRepository, OrderRepository, PaymentRepository,
    RepoError, RepoResult, Repositories, TransactionManager,
};

#[derive(Default)]
struct Tables {
    orders: Vec<Order>,
    deliveries: Vec<Delivery>,
    payments: Vec<Payment>,
    items: Vec<Item>,
}

impl Tables {
    fn has_order(&self, order_uid: &str) -> bool {
        self.orders.iter().any(|o| o.order_uid == order_uid)
    }
}

/// Open in-memory transaction with its staged rows
#[derive(Default)]
pub struct MemoryTx {
    staged: Tables,
}

#[derive(Default)]
struct Inner {
    committed: Tables,
    faults: HashMap<&'static str, usize>,
    calls: HashMap<&'static str, usize>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repositories backed by this store
    pub fn repositories(&self) -> Repositories<MemoryTx> {
        Repositories {
            orders: Arc::new(self.clone()),
            deliveries: Arc::new(self.clone()),
            payments: Arc::new(self.clone()),
            items: Arc::new(self.clone()),
        }
    }

    pub fn tx_manager(&self) -> Arc<dyn TransactionManager<Tx = MemoryTx>> {
        Arc::new(self.clone())
    }

    /// Make the next `times` calls of `op` fail with a store error.
    pub fn fail_next(&self, op: &'static str, times: usize) {
        self.lock().faults.insert(op, times);
    }

    pub fn calls(&self, op: &str) -> usize {
        self.lock().calls.get(op).copied().unwrap_or(0)
    }

    /// Total calls of every `*.get` / `*.list` operation
    pub fn read_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|(op, _)| op.ends_with(".get") || op.ends_with(".list"))
            .map(|(_, n)| n)
            .sum()
    }

    pub fn reset_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn order_count(&self) -> usize {
        self.lock().committed.orders.len()
    }

    pub fn delivery_count(&self) -> usize {
        self.lock().committed.deliveries.len()
    }

    pub fn payment_count(&self) -> usize {
        self.lock().committed.payments.len()
    }

    pub fn item_count(&self) -> usize {
        self.lock().committed.items.len()
    }

    /// Write a full aggregate straight into the committed tables.
    pub fn seed(&self, order: &Order) {
        let mut inner = self.lock();
        let tables = &mut inner.committed;
        tables.orders.push(root_row(order));
        let mut delivery = order.delivery.clone();
        delivery.order_uid = order.order_uid.clone();
        tables.deliveries.push(delivery);
        tables.payments.push(order.payment.clone());
        tables.items.extend(order.items.iter().cloned());
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Count the call and consume an injected fault if one is armed.
    fn enter(&self, op: &'static str) -> RepoResult<MutexGuard<'_, Inner>> {
        let mut inner = self.lock();
        *inner.calls.entry(op).or_default() += 1;
        let armed = match inner.faults.get_mut(op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };
        if armed {
            return Err(RepoError::Database(format!("injected failure: {op}").into()));
        }
        Ok(inner)
    }
}

fn root_row(order: &Order) -> Order {
    Order {
        delivery: Delivery::default(),
        payment: Payment::default(),
        items: Vec::new(),
        ..order.clone()
    }
}

fn staged<'a>(cx: &'a mut DbContext<'_, MemoryTx>) -> Option<&'a mut Tables> {
    match cx {
        DbContext::Ambient => None,
        DbContext::Tx(tx) => Some(&mut tx.staged),
    }
}

#[async_trait]
impl OrderRepository<MemoryTx> for MemoryStore {
    async fn get_by_id(
        &self,
        cx: &mut DbContext<'_, MemoryTx>,
        order_uid: &str,
    ) -> RepoResult<Order> {
        let inner = self.enter("orders.get")?;
        let staged = staged(cx);
        inner
            .committed
            .orders
            .iter()
            .chain(staged.iter().flat_map(|t| t.orders.iter()))
            .find(|o| o.order_uid == order_uid)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("order {order_uid}")))
    }

    async fn save(&self, cx: &mut DbContext<'_, MemoryTx>, order: &Order) -> RepoResult<()> {
        let mut inner = self.enter("orders.save")?;
        let duplicate = inner.committed.has_order(&order.order_uid)
            || staged(cx).is_some_and(|t| t.has_order(&order.order_uid));
        if duplicate {
            return Err(RepoError::Duplicate(format!(
                "orders_pkey: {}",
                order.order_uid
            )));
        }
        match staged(cx) {
            Some(tables) => tables.orders.push(root_row(order)),
            None => inner.committed.orders.push(root_row(order)),
        }
        Ok(())
    }

    async fn list_order_uids(&self, cx: &mut DbContext<'_, MemoryTx>) -> RepoResult<Vec<String>> {
        let inner = self.enter("orders.list")?;
        let staged = staged(cx);
        Ok(inner
            .committed
            .orders
            .iter()
            .chain(staged.iter().flat_map(|t| t.orders.iter()))
            .map(|o| o.order_uid.clone())
            .collect())
    }
}

#[async_trait]
impl DeliveryRepository<MemoryTx> for MemoryStore {
    async fn get_by_order_uid(
        &self,
        cx: &mut DbContext<'_, MemoryTx>,
        order_uid: &str,
    ) -> RepoResult<Delivery> {
        let inner = self.enter("deliveries.get")?;
        let staged = staged(cx);
        inner
            .committed
            .deliveries
            .iter()
            .chain(staged.iter().flat_map(|t| t.deliveries.iter()))
            .find(|d| d.order_uid == order_uid)
            .cloned()
            .ok_or_else(|| {
                RepoError::Database(format!("delivery missing for order {order_uid}").into())
            })
    }

    async fn save(&self, cx: &mut DbContext<'_, MemoryTx>, delivery: &Delivery) -> RepoResult<()> {
        let mut inner = self.enter("deliveries.save")?;
        match staged(cx) {
            Some(tables) => tables.deliveries.push(delivery.clone()),
            None => inner.committed.deliveries.push(delivery.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentRepository<MemoryTx> for MemoryStore {
    async fn get_by_transaction(
        &self,
        cx: &mut DbContext<'_, MemoryTx>,
        transaction: &str,
    ) -> RepoResult<Payment> {
        let inner = self.enter("payments.get")?;
        let staged = staged(cx);
        inner
            .committed
            .payments
            .iter()
            .chain(staged.iter().flat_map(|t| t.payments.iter()))
            .find(|p| p.transaction == transaction)
            .cloned()
            .ok_or_else(|| {
                RepoError::Database(format!("payment missing for transaction {transaction}").into())
            })
    }

    async fn save(&self, cx: &mut DbContext<'_, MemoryTx>, payment: &Payment) -> RepoResult<()> {
        let mut inner = self.enter("payments.save")?;
        match staged(cx) {
            Some(tables) => tables.payments.push(payment.clone()),
            None => inner.committed.payments.push(payment.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRepository<MemoryTx> for MemoryStore {
    async fn get_by_track_number(
        &self,
        cx: &mut DbContext<'_, MemoryTx>,
        track_number: &str,
    ) -> RepoResult<Vec<Item>> {
        let inner = self.enter("items.get")?;
        let staged = staged(cx);
        Ok(inner
            .committed
            .items
            .iter()
            .chain(staged.iter().flat_map(|t| t.items.iter()))
            .filter(|i| i.track_number == track_number)
            .cloned()
            .collect())
    }

    async fn save(&self, cx: &mut DbContext<'_, MemoryTx>, item: &Item) -> RepoResult<()> {
        let mut inner = self.enter("items.save")?;
        match staged(cx) {
            Some(tables) => tables.items.push(item.clone()),
            None => inner.committed.items.push(item.clone()),
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionManager for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> RepoResult<MemoryTx> {
        drop(self.enter("tx.begin")?);
        Ok(MemoryTx::default())
    }

    async fn commit(&self, tx: MemoryTx) -> RepoResult<()> {
        let mut inner = self.enter("tx.commit")?;
        let staged = tx.staged;
        // Root key uniqueness is enforced again at commit
        if let Some(dup) = staged
            .orders
            .iter()
            .find(|o| inner.committed.has_order(&o.order_uid))
        {
            return Err(RepoError::Duplicate(format!("orders_pkey: {}", dup.order_uid)));
        }
        let committed = &mut inner.committed;
        committed.orders.extend(staged.orders);
        committed.deliveries.extend(staged.deliveries);
        committed.payments.extend(staged.payments);
        committed.items.extend(staged.items);
        Ok(())
    }

    async fn rollback(&self, tx: MemoryTx) -> RepoResult<()> {
        drop(self.enter("tx.rollback")?);
        drop(tx);
        Ok(())
    }
}

// ── Fixtures ──

/// A complete aggregate: payment keyed by `order_uid`, `n_items` items on `track`.
pub fn sample_order(order_uid: &str, track: &str, n_items: usize) -> Order {
    Order {
        order_uid: order_uid.to_string(),
        track_number: track.to_string(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            order_uid: String::new(),
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: order_uid.to_string(),
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: 1637907727,
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: (0..n_items)
            .map(|i| Item {
                chrt_id: 9934930 + i as i64,
                track_number: track.to_string(),
                price: 453,
                rid: format!("{order_uid}-rid-{i}"),
                name: format!("Item {i}"),
                sale: 30,
                size: "0".to_string(),
                total_price: 317,
                nm_id: 2389212,
                brand: "Vivienne Sabo".to_string(),
                status: 202,
            })
            .collect(),
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        date_created: Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap(),
        oof_shard: "1".to_string(),
    }
}
