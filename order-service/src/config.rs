//! Order service configuration

use std::str::FromStr;

use shared::message::DEFAULT_DEAD_LETTER_TOPIC;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Order service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    /// Kafka bootstrap servers (comma separated)
    pub kafka_brokers: String,
    /// Inbound order topic
    pub kafka_topic: String,
    pub kafka_group_id: String,
    /// Dead-letter destination for undecodable payloads
    pub kafka_dlq_topic: String,
    /// Pause before an unacknowledged message is fetched again
    pub kafka_retry_backoff_ms: u64,
    /// Query interface port
    pub http_port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let string = |name: &str, default: &str| {
            var(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            database_url: var("DATABASE_URL")
                .filter(|v| !v.is_empty())
                .ok_or("DATABASE_URL must be set")?,
            database_max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), 10),
            database_min_connections: parse_or(var("DATABASE_MIN_CONNECTIONS"), 2),
            kafka_brokers: string("KAFKA_BROKERS", "localhost:9092"),
            kafka_topic: string("KAFKA_TOPIC", "orders"),
            kafka_group_id: string("KAFKA_GROUP_ID", "order-service"),
            kafka_dlq_topic: string("KAFKA_DLQ_TOPIC", DEFAULT_DEAD_LETTER_TOPIC),
            kafka_retry_backoff_ms: parse_or(var("KAFKA_RETRY_BACKOFF_MS"), 1000),
            http_port: parse_or(var("HTTP_PORT"), 8081),
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}
