//! Order aggregate model
//!
//! One order is stored across four tables (`orders`, `deliveries`, `payments`,
//! `items`) and travels as a single nested JSON document on the wire.
//! Relations are populated by application code and skipped by `FromRow`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order aggregate root (keyed by `order_uid`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub order_uid: String,
    pub track_number: String,
    pub entry: String,

    // -- Relations (populated by application code, skipped by FromRow) --

    #[cfg_attr(feature = "db", sqlx(skip))]
    pub delivery: Delivery,
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub payment: Payment,
    #[cfg_attr(feature = "db", sqlx(skip))]
    pub items: Vec<Item>,

    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    /// Shard manager id
    pub sm_id: i32,
    pub date_created: DateTime<Utc>,
    pub oof_shard: String,
}

/// Delivery details (1:1 with the order, keyed by `order_uid`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Delivery {
    /// Store-side foreign key; stamped from the root on write, never emitted
    #[serde(default, skip_serializing)]
    pub order_uid: String,
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment details (1:1 with the order; `transaction` equals `order_uid`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Unix timestamp (seconds)
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

/// Order line item (N:1 with the order through `track_number`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Item {
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    pub rid: String,
    pub name: String,
    /// Sale percentage
    pub sale: i32,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i32,
}
