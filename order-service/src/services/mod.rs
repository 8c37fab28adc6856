//! Order use cases
//!
//! - [`OrderQueryService`]: read-through assembly and cache warm-up
//! - [`OrderIngestService`]: idempotent transactional write

pub mod ingest;
pub mod query;

pub use ingest::OrderIngestService;
pub use query::OrderQueryService;
