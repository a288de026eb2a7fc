use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;
use tokio::select;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::broker::{Broker, RawMessage};
use crate::codec::decode;
use crate::models::StreamEvent;
use crate::session::{Directive, MessageHandler, SessionManager, SessionReport, SessionStatus};
use crate::types::GroupId;

/// Relays a live topic to stream subscribers, one independent broker session per subscriber.
pub struct StreamRelay<B: Broker> {
    sessions: SessionManager<B>,
    group_prefix: String,
    backpressure: usize,
    shutdown: CancellationToken
}

impl<B: Broker> StreamRelay<B> {
    /// `shutdown` is the process-wide signal; cancelling it ends every open stream.
    pub fn new(sessions: SessionManager<B>, group_prefix: impl Into<String>, backpressure: usize, shutdown: CancellationToken) -> Self {
        Self {
            sessions,
            group_prefix: group_prefix.into(),
            backpressure: backpressure.max(1),
            shutdown
        }
    }

    /// Opens a stream on `topic`.
    ///
    /// The first `connection` event is queued before this returns. The stream ends after the
    /// broker session has been closed, so no event is ever written once it is gone.
    pub fn open_stream(&self, topic: &str) -> EventStream {
        let (sender, receiver) = mpsc::channel(self.backpressure);
        let cancel = self.shutdown.child_token();
        let address = self.sessions.address().to_string();

        //NOTE: The channel is empty and has capacity, this cannot fail.
        let _ = sender.try_send(StreamEvent::connection(format!("Connecting to Kafka broker on {address}...")));

        let handler = RelayHandler {
            sender,
            cancel: cancel.clone(),
            delivered: 0
        };

        let task = tokio::spawn(relay(
            self.sessions.clone(),
            topic.to_string(),
            GroupId::generate(&self.group_prefix),
            cancel.clone(),
            handler
        ));

        EventStream {
            receiver,
            cancel: cancel.clone(),
            task,
            _guard: cancel.drop_guard()
        }
    }
}

async fn relay<B: Broker>(
    sessions: SessionManager<B>,
    topic: String,
    group_id: GroupId,
    cancel: CancellationToken,
    mut handler: RelayHandler
) -> SessionReport {
    info!("Opening stream [{group_id}] on [{topic}]");

    let report = sessions.run(&topic, group_id, &cancel, &mut handler).await;
    let address = sessions.address();

    let closing_event = match (report.status, report.error.as_ref()) {
        (SessionStatus::Failed, Some(error)) if error.is_broker_unavailable() => Some(StreamEvent::error(
            format!("Failed to connect to Kafka broker on {address}. Please start your Kafka producer."),
            Some(error.to_string())
        )),
        (SessionStatus::Failed, error) => Some(StreamEvent::error(
            format!("Lost connection to Kafka broker on {address}"),
            error.map(|error| error.to_string())
        )),
        (SessionStatus::Ended, _) => Some(StreamEvent::error(format!("Kafka broker on {address} closed the stream"), None)),
        (SessionStatus::Stopped | SessionStatus::Cancelled, _) => {
            debug!("Stream [{}] closed by subscriber", report.group_id);
            None
        }
    };

    if let Some(event) = closing_event {
        handler.emit(event).await;
    }

    info!("Stream [{}] closed after relaying {} transaction(s)", report.group_id, handler.delivered);

    // Dropping the handler closes the sink, strictly after the broker session.
    drop(handler);

    report
}

struct RelayHandler {
    sender: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    delivered: usize
}

impl RelayHandler {
    /// Pushes one event, returning false once the subscriber is gone.
    async fn emit(&mut self, event: StreamEvent) -> bool {
        select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = self.sender.send(event) => {
                if result.is_err() {
                    self.cancel.cancel();
                }
                result.is_ok()
            }
        }
    }
}

#[async_trait]
impl MessageHandler for RelayHandler {
    async fn on_subscribed(&mut self) {
        self.emit(StreamEvent::connection("Connected to Kafka broker - listening for transactions...")).await;
    }

    async fn on_message(&mut self, message: RawMessage) -> Directive {
        let RawMessage { payload, offset, partition, .. } = message;

        let Some(payload) = payload else {
            return Directive::Continue;
        };

        let event = match decode(&payload) {
            Ok(transaction) => {
                self.delivered += 1;
                StreamEvent::transaction(transaction)
            }
            Err(error) => {
                warn!("Could not decode record [{partition}]:[{offset}]: {error}");
                StreamEvent::error("Error parsing transaction data", Some(error.to_string()))
            }
        };

        if self.emit(event).await {
            Directive::Continue
        } else {
            Directive::Stop
        }
    }
}

/// Lazy, non-restartable sequence of [`StreamEvent`]s for one subscriber.
///
/// Dropping the stream cancels it. The underlying session is disconnected exactly once either way.
pub struct EventStream {
    receiver: mpsc::Receiver<StreamEvent>,
    cancel: CancellationToken,
    task: JoinHandle<SessionReport>,
    _guard: DropGuard
}

impl EventStream {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancels the stream and waits for its session to finish, returning the session report.
    pub async fn close(self) -> Option<SessionReport> {
        let EventStream { receiver, cancel, task, _guard } = self;
        cancel.cancel();
        drop(receiver);

        task.await.ok()
    }
}

impl Stream for EventStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, context: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(context)
    }
}
