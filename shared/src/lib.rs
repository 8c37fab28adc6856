//! Shared types for the order service
//!
//! Wire models, stream message envelopes and the unified error system used
//! by both the service and the publisher.

pub mod error;
pub mod message;
pub mod models;
