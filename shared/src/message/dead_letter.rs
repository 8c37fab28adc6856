//! Dead-letter envelope for payloads that could not be decoded

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Default dead-letter destination
pub const DEFAULT_DEAD_LETTER_TOPIC: &str = "orders_dlq";

/// Message published to the dead-letter topic
///
/// Carries the original payload verbatim (lossy UTF-8 for non-text bytes)
/// together with its source coordinates so it can be replayed by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadLetterMessage {
    pub original_message: String,
    pub error: String,
    /// RFC 3339, second precision
    pub timestamp: String,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl DeadLetterMessage {
    pub fn new(
        payload: &[u8],
        error: impl ToString,
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            original_message: String::from_utf8_lossy(payload).into_owned(),
            error: error.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            topic: topic.into(),
            partition,
            offset,
        }
    }
}
