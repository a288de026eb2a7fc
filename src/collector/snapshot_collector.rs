use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tokio::{select, spawn};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broker::{Broker, RawMessage};
use crate::codec::decode;
use crate::models::Transaction;
use crate::session::{Directive, MessageHandler, SessionManager, SessionStatus};
use crate::types::GroupId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    /// `max_count` transactions were collected before the window closed.
    Full,
    /// The window closed first. Everything that arrived in time is included.
    TimedOut,
    /// Connect or subscribe failed, nothing was read.
    BrokerUnavailable(String),
    /// The consumer failed or the broker closed the stream mid-collection.
    Interrupted(String)
}

/// Result of one bounded collection. Transactions are in broker delivery order.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub status: SnapshotStatus,
    /// Records dropped because they failed to decode.
    pub skipped: usize
}

impl Snapshot {
    pub fn timed_out_or_full(&self) -> bool {
        matches!(self.status, SnapshotStatus::Full | SnapshotStatus::TimedOut)
    }
}

/// Collects up to `max_count` transactions or until a timeout elapses, whichever comes first.
pub struct SnapshotCollector<B: Broker> {
    sessions: SessionManager<B>,
    group_prefix: String
}

impl<B: Broker> SnapshotCollector<B> {
    pub fn new(sessions: SessionManager<B>, group_prefix: impl Into<String>) -> Self {
        Self {
            sessions,
            group_prefix: group_prefix.into()
        }
    }

    pub fn address(&self) -> &str {
        self.sessions.address()
    }

    pub async fn collect(&self, topic: &str, max_count: usize, timeout: Duration) -> Snapshot {
        // Shared by the timer and the handler, whichever fires first ends the session.
        let done = CancellationToken::new();
        let mut handler = SnapshotHandler {
            transactions: Vec::new(),
            skipped: 0,
            max_count,
            timeout,
            done: done.clone()
        };

        let report = self.sessions.run(topic, GroupId::generate(&self.group_prefix), &done, &mut handler).await;
        done.cancel();

        let SnapshotHandler { transactions, skipped, .. } = handler;

        let status = match (report.status, report.error) {
            (SessionStatus::Failed, Some(error)) if error.is_broker_unavailable() => {
                SnapshotStatus::BrokerUnavailable(error.to_string())
            }
            (SessionStatus::Failed, error) => SnapshotStatus::Interrupted(
                error.map(|error| error.to_string()).unwrap_or_else(|| "consumer failed".to_string())
            ),
            (SessionStatus::Ended, _) => SnapshotStatus::Interrupted("broker closed the stream".to_string()),
            (SessionStatus::Stopped | SessionStatus::Cancelled, _) if transactions.len() >= max_count => SnapshotStatus::Full,
            (SessionStatus::Stopped | SessionStatus::Cancelled, _) => SnapshotStatus::TimedOut
        };

        info!(
            "Snapshot [{}] collected {} transaction(s) from [{topic}], skipped {skipped}: {status:?}",
            report.group_id,
            transactions.len()
        );

        Snapshot {
            transactions,
            status,
            skipped
        }
    }
}

struct SnapshotHandler {
    transactions: Vec<Transaction>,
    skipped: usize,
    max_count: usize,
    timeout: Duration,
    done: CancellationToken
}

#[async_trait]
impl MessageHandler for SnapshotHandler {
    async fn on_subscribed(&mut self) {
        if self.max_count == 0 {
            self.done.cancel();
            return;
        }

        let done = self.done.clone();
        let timeout = self.timeout;

        spawn(async move {
            select! {
                _ = sleep(timeout) => {
                    debug!("Snapshot window of {timeout:?} elapsed");
                    done.cancel();
                }
                _ = done.cancelled() => {}
            }
        });
    }

    async fn on_message(&mut self, message: RawMessage) -> Directive {
        let RawMessage { payload, offset, partition, .. } = message;

        let Some(payload) = payload else {
            return Directive::Continue;
        };

        match decode(&payload) {
            Ok(transaction) => {
                self.transactions.push(transaction);

                if self.transactions.len() >= self.max_count {
                    self.done.cancel();
                    return Directive::Stop;
                }
            }
            Err(error) => {
                self.skipped += 1;
                warn!("Skipping record [{partition}]:[{offset}]: {error}");
            }
        }

        Directive::Continue
    }
}
