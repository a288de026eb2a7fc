mod errors;

use std::time::Duration;

use clap::Parser;

use crate::broker::KafkaSettings;

pub use errors::ConfigError;

/// Process configuration, from flags or the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "transaction-stream-bridge")]
#[command(about = "Serves live card transactions from a Kafka topic as snapshots and event streams", long_about = None)]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen_addr: String,

    /// Kafka bootstrap broker (host:port)
    #[arg(long, env = "KAFKA_BROKER", default_value = "localhost:9092")]
    pub broker: String,

    /// Topic the producer publishes transactions to
    #[arg(long, env = "KAFKA_TOPIC", default_value = "fake-data")]
    pub topic: String,

    /// Kafka client id used by snapshot sessions
    #[arg(long, env = "SNAPSHOT_CLIENT_ID", default_value = "web-dashboard-consumer")]
    pub snapshot_client_id: String,

    /// Kafka client id used by stream sessions
    #[arg(long, env = "STREAM_CLIENT_ID", default_value = "web-dashboard-stream-consumer")]
    pub stream_client_id: String,

    /// Consumer group prefix for snapshot sessions
    #[arg(long, env = "SNAPSHOT_GROUP_PREFIX", default_value = "web-dashboard-group")]
    pub snapshot_group_prefix: String,

    /// Consumer group prefix for stream sessions
    #[arg(long, env = "STREAM_GROUP_PREFIX", default_value = "web-dashboard-stream")]
    pub stream_group_prefix: String,

    /// Maximum number of transactions returned by one snapshot
    #[arg(long, env = "SNAPSHOT_MAX_MESSAGES", default_value = "10")]
    pub max_messages: usize,

    /// How long one snapshot waits for transactions, in milliseconds
    #[arg(long, env = "SNAPSHOT_TIMEOUT_MS", default_value = "5000")]
    pub snapshot_timeout_ms: u64,

    #[arg(long, env = "KAFKA_SESSION_TIMEOUT_MS", default_value = "30000")]
    pub session_timeout_ms: u64,

    #[arg(long, env = "KAFKA_HEARTBEAT_INTERVAL_MS", default_value = "3000")]
    pub heartbeat_interval_ms: u64,

    /// How long to wait for the broker before reporting it unavailable, in milliseconds
    #[arg(long, env = "KAFKA_CONNECT_TIMEOUT_MS", default_value = "5000")]
    pub connect_timeout_ms: u64,

    /// Events buffered per stream subscriber before the broker session waits
    #[arg(long, env = "STREAM_BUFFER", default_value = "256")]
    pub stream_buffer: usize,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max-messages", self.max_messages as u64),
            ("snapshot-timeout-ms", self.snapshot_timeout_ms),
            ("session-timeout-ms", self.session_timeout_ms),
            ("heartbeat-interval-ms", self.heartbeat_interval_ms),
            ("connect-timeout-ms", self.connect_timeout_ms),
            ("stream-buffer", self.stream_buffer as u64),
        ];

        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive(*name));
        }

        if self.heartbeat_interval_ms >= self.session_timeout_ms {
            return Err(ConfigError::HeartbeatTooSlow {
                heartbeat_interval_ms: self.heartbeat_interval_ms,
                session_timeout_ms: self.session_timeout_ms
            });
        }

        if self.broker.trim().is_empty() || self.topic.trim().is_empty() {
            return Err(ConfigError::Missing("broker and topic"));
        }

        Ok(())
    }

    pub fn snapshot_timeout(&self) -> Duration {
        Duration::from_millis(self.snapshot_timeout_ms)
    }

    pub fn kafka_settings(&self) -> KafkaSettings {
        KafkaSettings {
            address: self.broker.clone(),
            session_timeout: Duration::from_millis(self.session_timeout_ms),
            heartbeat_interval: Duration::from_millis(self.heartbeat_interval_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms)
        }
    }
}
