use rdkafka::error::KafkaError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Broker error: {0}")]
    Kafka(#[from] KafkaError),
    #[error("Broker error: {address} is not reachable: {detail}")]
    Unreachable {
        address: String,
        detail: String
    },
    #[error("Broker error: subscription to topic [{0}] was rejected")]
    SubscriptionRejected(String),
    #[error("Broker error: consumer is not connected")]
    NotConnected,
    #[error("Broker error: {0}")]
    Consumer(String),
    #[error("Broker error: metadata probe did not complete: {0}")]
    Probe(#[from] JoinError)
}
