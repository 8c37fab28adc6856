//! Ingestion pipeline
//!
//! Sequential receive → decode → save → acknowledge loop over one stream.
//!
//! ```text
//! OrderStream::recv
//!       │
//!       ▼
//!   decode ── error ──► DeadLetterSink::send ──► commit
//!       │
//!       ▼
//! OrderIngestService::save
//!       ├── Ok / AlreadyExists ──► commit
//!       └── store error ─────────► retry (left unacknowledged)
//! ```
//!
//! A message is acknowledged only after a terminal outcome. Cancellation is
//! checked while waiting for the next message, never mid-processing.

pub mod kafka;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::message::DeadLetterMessage;
use shared::models::Order;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::db::BoxError;
use crate::error::OrderError;
use crate::services::OrderIngestService;

/// One received stream record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    /// Empty for tombstones
    pub payload: Vec<u8>,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

/// Source of order messages with manual acknowledgment
#[async_trait]
pub trait OrderStream: Send + Sync {
    /// Wait for the next message.
    async fn recv(&self) -> Result<StreamMessage, BoxError>;

    /// Acknowledge `msg`: it will not be delivered again to this group.
    async fn commit(&self, msg: &StreamMessage) -> Result<(), BoxError>;

    /// Leave `msg` unacknowledged and arrange for it to be delivered again.
    async fn retry(&self, msg: &StreamMessage) -> Result<(), BoxError>;
}

#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn send(&self, letter: &DeadLetterMessage) -> Result<(), BoxError>;
}

#[derive(Debug, Error)]
#[error("malformed order payload: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

pub fn decode_order(payload: &[u8]) -> Result<Order, DecodeError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Terminal (or retry) decision for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Already stored; acknowledged as applied
    Duplicate,
    DeadLettered,
    /// Store failure; not acknowledged
    Retry,
}

impl Outcome {
    pub fn acknowledges(self) -> bool {
        !matches!(self, Outcome::Retry)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub received: u64,
    pub applied: u64,
    pub duplicates: u64,
    pub dead_lettered: u64,
    pub retried: u64,
    pub receive_errors: u64,
}

impl PipelineStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Duplicate => self.duplicates += 1,
            Outcome::DeadLettered => self.dead_lettered += 1,
            Outcome::Retry => self.retried += 1,
        }
    }
}

pub struct IngestionPipeline<S, D, Tx> {
    stream: S,
    dead_letters: D,
    ingest: Arc<OrderIngestService<Tx>>,
}

impl<S, D, Tx> IngestionPipeline<S, D, Tx>
where
    S: OrderStream,
    D: DeadLetterSink,
    Tx: Send + 'static,
{
    pub fn new(stream: S, dead_letters: D, ingest: Arc<OrderIngestService<Tx>>) -> Self {
        Self {
            stream,
            dead_letters,
            ingest,
        }
    }

    /// Run until `shutdown` is cancelled. The message in flight when
    /// cancellation arrives is finished and acknowledged first.
    pub async fn run(self, shutdown: CancellationToken) -> PipelineStats {
        let mut stats = PipelineStats::default();
        tracing::info!("Ingestion pipeline started");

        loop {
            let received = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                msg = self.stream.recv() => msg,
            };

            let msg = match received {
                Ok(msg) => msg,
                Err(e) => {
                    stats.receive_errors += 1;
                    tracing::warn!(error = %e, "Stream receive error");
                    continue;
                }
            };
            stats.received += 1;

            let outcome = self.process(&msg).await;
            stats.record(outcome);

            if outcome.acknowledges() {
                if let Err(e) = self.stream.commit(&msg).await {
                    tracing::warn!(
                        topic = %msg.topic,
                        partition = msg.partition,
                        offset = msg.offset,
                        error = %e,
                        "Offset commit failed"
                    );
                }
            } else if let Err(e) = self.stream.retry(&msg).await {
                tracing::warn!(
                    topic = %msg.topic,
                    partition = msg.partition,
                    offset = msg.offset,
                    error = %e,
                    "Failed to schedule redelivery"
                );
            }
        }

        tracing::info!(?stats, "Ingestion pipeline stopped");
        stats
    }

    /// Decide the outcome for one message. Never acknowledges.
    pub async fn process(&self, msg: &StreamMessage) -> Outcome {
        let order = match decode_order(&msg.payload) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(
                    topic = %msg.topic,
                    partition = msg.partition,
                    offset = msg.offset,
                    error = %e,
                    "Routing malformed message to dead-letter topic"
                );
                let letter = DeadLetterMessage::new(
                    &msg.payload,
                    &e,
                    &msg.topic,
                    msg.partition,
                    msg.offset,
                    Utc::now(),
                );
                // Best effort: the original is acknowledged either way
                if let Err(send_err) = self.dead_letters.send(&letter).await {
                    tracing::error!(
                        topic = %msg.topic,
                        partition = msg.partition,
                        offset = msg.offset,
                        error = %send_err,
                        "Dead-letter publish failed"
                    );
                }
                return Outcome::DeadLettered;
            }
        };

        let order_uid = order.order_uid.clone();
        match self.ingest.save(order).await {
            Ok(()) => Outcome::Applied,
            Err(OrderError::AlreadyExists(_)) => {
                tracing::info!(order_uid = %order_uid, offset = msg.offset, "Order already stored, acknowledging");
                Outcome::Duplicate
            }
            Err(e) => {
                tracing::error!(
                    order_uid = %order_uid,
                    topic = %msg.topic,
                    partition = msg.partition,
                    offset = msg.offset,
                    error = %e,
                    "Order ingestion failed, leaving message unacknowledged"
                );
                Outcome::Retry
            }
        }
    }
}
