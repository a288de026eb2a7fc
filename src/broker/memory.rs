//! In-process broker with the same subscription semantics as a Kafka topic.
//!
//! Every topic is an append-only log. A consumer subscribing with `from_beginning` disabled
//! starts at the current end of the log and only sees records published afterwards. Failure
//! switches and call counters make it the broker of choice for exercising session lifecycles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tokio::sync::watch;
use tokio::time::sleep;

use crate::broker::{Broker, BrokerError, Consumer, ConsumerSettings, RawMessage};
use crate::types::GroupId;

#[derive(Debug, Clone)]
enum MemoryRecord {
    Payload(Option<Vec<u8>>),
    Failure(String)
}

struct MemoryState {
    address: String,
    topics: DashMap<String, watch::Sender<Vec<MemoryRecord>>>,
    reachable: AtomicBool,
    reject_subscriptions: AtomicBool,
    fail_disconnects: AtomicBool,
    consumers_created: AtomicUsize,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    group_ids: DashSet<GroupId>
}

#[derive(Clone)]
pub struct MemoryBroker {
    state: Arc<MemoryState>
}

impl MemoryBroker {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            state: Arc::new(MemoryState {
                address: address.into(),
                topics: DashMap::new(),
                reachable: AtomicBool::new(true),
                reject_subscriptions: AtomicBool::new(false),
                fail_disconnects: AtomicBool::new(false),
                consumers_created: AtomicUsize::new(0),
                connects: AtomicUsize::new(0),
                disconnects: AtomicUsize::new(0),
                group_ids: DashSet::new()
            })
        }
    }

    pub fn publish(&self, topic: &str, payload: impl Into<Vec<u8>>) {
        self.append(topic, MemoryRecord::Payload(Some(payload.into())));
    }

    pub fn publish_tombstone(&self, topic: &str) {
        self.append(topic, MemoryRecord::Payload(None));
    }

    /// Makes every consumer of `topic` fail with `detail` when it reaches this position.
    pub fn publish_failure(&self, topic: &str, detail: &str) {
        self.append(topic, MemoryRecord::Failure(detail.to_string()));
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn reject_subscriptions(&self, reject: bool) {
        self.state.reject_subscriptions.store(reject, Ordering::SeqCst);
    }

    pub fn fail_disconnects(&self, fail: bool) {
        self.state.fail_disconnects.store(fail, Ordering::SeqCst);
    }

    pub fn consumers_created(&self) -> usize {
        self.state.consumers_created.load(Ordering::SeqCst)
    }

    pub fn connects(&self) -> usize {
        self.state.connects.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.state.disconnects.load(Ordering::SeqCst)
    }

    pub fn distinct_group_ids(&self) -> usize {
        self.state.group_ids.len()
    }

    /// Number of consumers currently subscribed to `topic`.
    pub fn subscribers(&self, topic: &str) -> usize {
        self.state.topics.get(topic)
            .map(|log| log.receiver_count())
            .unwrap_or(0)
    }

    pub async fn wait_for_subscribers(&self, topic: &str, count: usize) {
        while self.subscribers(topic) < count {
            sleep(Duration::from_millis(1)).await;
        }
    }

    fn append(&self, topic: &str, record: MemoryRecord) {
        self.state.topics.entry(topic.to_string())
            .or_insert_with(|| watch::channel(Vec::new()).0)
            .send_modify(|log| log.push(record));
    }
}

impl Broker for MemoryBroker {
    type Consumer = MemoryConsumer;

    fn address(&self) -> &str {
        &self.state.address
    }

    fn create_consumer(&self, settings: &ConsumerSettings) -> Result<Self::Consumer, BrokerError> {
        self.state.consumers_created.fetch_add(1, Ordering::SeqCst);
        self.state.group_ids.insert(settings.group_id.clone());

        Ok(MemoryConsumer {
            state: self.state.clone(),
            from_beginning: settings.from_beginning,
            connected: false,
            receiver: None,
            topic: String::new(),
            cursor: 0
        })
    }
}

pub struct MemoryConsumer {
    state: Arc<MemoryState>,
    from_beginning: bool,
    connected: bool,
    receiver: Option<watch::Receiver<Vec<MemoryRecord>>>,
    topic: String,
    cursor: usize
}

#[async_trait]
impl Consumer for MemoryConsumer {
    async fn connect(&mut self) -> Result<(), BrokerError> {
        if !self.state.reachable.load(Ordering::SeqCst) {
            return Err(BrokerError::Unreachable {
                address: self.state.address.clone(),
                detail: "connection refused".to_string()
            });
        }

        self.state.connects.fetch_add(1, Ordering::SeqCst);
        self.connected = true;

        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), BrokerError> {
        if !self.connected {
            return Err(BrokerError::NotConnected);
        }

        if self.state.reject_subscriptions.load(Ordering::SeqCst) {
            return Err(BrokerError::SubscriptionRejected(topic.to_string()));
        }

        let receiver = self.state.topics.entry(topic.to_string())
            .or_insert_with(|| watch::channel(Vec::new()).0)
            .subscribe();

        self.cursor = if self.from_beginning { 0 } else { receiver.borrow().len() };
        self.receiver = Some(receiver);
        self.topic = topic.to_string();

        Ok(())
    }

    async fn next_message(&mut self) -> Option<Result<RawMessage, BrokerError>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Some(Err(BrokerError::NotConnected));
        };

        loop {
            let record = {
                let log = receiver.borrow_and_update();
                log.get(self.cursor).cloned()
            };

            if let Some(record) = record {
                let offset = self.cursor as i64;
                self.cursor += 1;

                return Some(match record {
                    MemoryRecord::Payload(payload) => Ok(RawMessage {
                        topic: self.topic.clone(),
                        partition: 0,
                        offset,
                        payload
                    }),
                    MemoryRecord::Failure(detail) => Err(BrokerError::Consumer(detail))
                });
            }

            if receiver.changed().await.is_err() {
                return None;
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), BrokerError> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.receiver = None;
        self.connected = false;

        if self.state.fail_disconnects.load(Ordering::SeqCst) {
            return Err(BrokerError::Consumer("disconnect was refused".to_string()));
        }

        Ok(())
    }
}
