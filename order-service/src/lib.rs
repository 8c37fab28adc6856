//! order-service: order ingestion and query
//!
//! - Consumes order events from Kafka, decodes them, and persists each order
//!   idempotently across four tables in one transaction
//! - Routes undecodable payloads to a dead-letter topic
//! - Serves assembled orders over HTTP through a process-lifetime read-through cache

pub mod api;
pub mod cache;
pub mod config;
pub mod consumer;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
