//! Stream message types
//!
//! Shared between order-service (consumer side) and the publisher.

pub mod dead_letter;

pub use dead_letter::{DEFAULT_DEAD_LETTER_TOPIC, DeadLetterMessage};
