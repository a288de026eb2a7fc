use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer as _, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::Message;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

use crate::broker::{Broker, BrokerError, Consumer, ConsumerSettings, RawMessage};

/// Connection parameters shared by every consumer the process opens.
#[derive(Debug, Clone)]
pub struct KafkaSettings {
    /// `host:port` of the bootstrap broker.
    pub address: String,
    pub session_timeout: Duration,
    pub heartbeat_interval: Duration,
    /// Upper bound on the metadata probe that decides whether the broker is reachable.
    pub connect_timeout: Duration
}

pub struct KafkaBroker {
    settings: KafkaSettings
}

impl KafkaBroker {
    pub fn new(settings: KafkaSettings) -> Self {
        Self { settings }
    }

    pub(crate) fn client_config(&self, settings: &ConsumerSettings) -> ClientConfig {
        let offset_reset = if settings.from_beginning { "earliest" } else { "latest" };
        let mut config = ClientConfig::new();

        //NOTE: Offsets are never committed, every session starts from the live end of the topic.
        config
            .set("bootstrap.servers", &self.settings.address)
            .set("client.id", &settings.client_id)
            .set("group.id", settings.group_id.as_str())
            .set("auto.offset.reset", offset_reset)
            .set("enable.auto.commit", "false")
            .set("session.timeout.ms", self.settings.session_timeout.as_millis().to_string())
            .set("heartbeat.interval.ms", self.settings.heartbeat_interval.as_millis().to_string());

        config
    }
}

impl Broker for KafkaBroker {
    type Consumer = KafkaConsumer;

    fn address(&self) -> &str {
        &self.settings.address
    }

    fn create_consumer(&self, settings: &ConsumerSettings) -> Result<Self::Consumer, BrokerError> {
        let consumer: StreamConsumer = self.client_config(settings).create()?;

        Ok(KafkaConsumer {
            consumer: Some(Arc::new(consumer)),
            address: self.settings.address.clone(),
            connect_timeout: self.settings.connect_timeout
        })
    }
}

/// A `StreamConsumer` owned by exactly one session. Dropping the inner handle closes it.
pub struct KafkaConsumer {
    consumer: Option<Arc<StreamConsumer>>,
    address: String,
    connect_timeout: Duration
}

impl KafkaConsumer {
    fn handle(&self) -> Result<&Arc<StreamConsumer>, BrokerError> {
        self.consumer.as_ref().ok_or(BrokerError::NotConnected)
    }
}

#[async_trait]
impl Consumer for KafkaConsumer {
    async fn connect(&mut self) -> Result<(), BrokerError> {
        let consumer = self.handle()?.clone();
        let timeout = self.connect_timeout;

        //NOTE: librdkafka connects lazily, a blocking metadata fetch is what surfaces an unreachable broker.
        let metadata = spawn_blocking(move || {
            consumer.fetch_metadata(None, timeout).map(|metadata| metadata.brokers().len())
        }).await?;

        match metadata {
            Ok(0) => Err(BrokerError::Unreachable {
                address: self.address.clone(),
                detail: "cluster metadata lists no brokers".to_string()
            }),
            Ok(brokers) => {
                debug!("Metadata probe against {} found {brokers} broker(s)", self.address);
                Ok(())
            }
            Err(error) => Err(BrokerError::Unreachable {
                address: self.address.clone(),
                detail: error.to_string()
            })
        }
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        self.handle()?.subscribe(&[topic])?;
        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<RawMessage, BrokerError>> {
        let consumer = match self.handle() {
            Ok(consumer) => consumer,
            Err(error) => return Some(Err(error))
        };

        loop {
            match consumer.recv().await {
                Ok(message) => {
                    return Some(Ok(RawMessage {
                        topic: message.topic().to_string(),
                        partition: message.partition(),
                        offset: message.offset(),
                        payload: message.payload().map(<[u8]>::to_vec)
                    }));
                }
                Err(error) if is_recoverable(&error) => {
                    warn!("Consumer on {} reported a recoverable error, still waiting for records: {error}", self.address);
                }
                Err(error) => return Some(Err(BrokerError::Kafka(error)))
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), BrokerError> {
        let consumer = self.consumer.take().ok_or(BrokerError::NotConnected)?;
        consumer.unsubscribe();

        Ok(())
    }
}

/// Errors librdkafka reports per topic or partition while the consumer itself stays usable.
///
/// A topic that does not exist yet is the common one: the session keeps waiting and picks the
/// topic up once a producer creates it.
pub(crate) fn is_recoverable(error: &KafkaError) -> bool {
    match error {
        KafkaError::PartitionEOF(_) => true,
        KafkaError::MessageConsumption(code) => matches!(
            code,
            RDKafkaErrorCode::UnknownTopicOrPartition
                | RDKafkaErrorCode::UnknownTopic
                | RDKafkaErrorCode::UnknownPartition
                | RDKafkaErrorCode::PartitionEOF
                | RDKafkaErrorCode::LeaderNotAvailable
                | RDKafkaErrorCode::NotLeaderForPartition
        ),
        _ => false
    }
}
