mod errors;
mod kafka;
pub mod memory;

use async_trait::async_trait;

use crate::types::GroupId;

pub use errors::BrokerError;
pub use kafka::{KafkaBroker, KafkaConsumer, KafkaSettings};
pub use memory::{MemoryBroker, MemoryConsumer};

/// One record as delivered by the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// `None` for tombstones, which carry no transaction.
    pub payload: Option<Vec<u8>>
}

/// Per-session consumer parameters.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub client_id: String,
    pub group_id: GroupId,
    /// When false the consumer only observes records published after it subscribed.
    pub from_beginning: bool
}

/// Process-wide broker client configuration. Read-only once built and shared by every session.
pub trait Broker: Send + Sync + 'static {
    type Consumer: Consumer;

    /// `host:port` of the broker, used in user-facing status messages.
    fn address(&self) -> &str;

    /// Creates an unconnected consumer owned by a single session.
    fn create_consumer(&self, settings: &ConsumerSettings) -> Result<Self::Consumer, BrokerError>;
}

#[async_trait]
pub trait Consumer: Send + 'static {
    async fn connect(&mut self) -> Result<(), BrokerError>;

    async fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError>;

    /// Awaits the next record. `None` means the broker closed the stream for good.
    async fn next_message(&mut self) -> Option<Result<RawMessage, BrokerError>>;

    async fn disconnect(&mut self) -> Result<(), BrokerError>;
}
