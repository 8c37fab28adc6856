//! Data models
//!
//! Shared between order-service and the publisher.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod order;

// Re-exports
pub use order::*;
