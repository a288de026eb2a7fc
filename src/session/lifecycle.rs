use std::sync::Arc;

use async_trait::async_trait;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::broker::{Broker, BrokerError, Consumer, ConsumerSettings, RawMessage};
use crate::session::{ConsumerSession, SessionError};
use crate::types::GroupId;

/// What the session should do after a handler has seen a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    Stop
}

/// Receives the records of one session, in broker delivery order.
#[async_trait]
pub trait MessageHandler: Send {
    /// Runs once the subscription is confirmed, before the first record is awaited.
    async fn on_subscribed(&mut self) {}

    async fn on_message(&mut self, message: RawMessage) -> Directive;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The handler returned [`Directive::Stop`].
    Stopped,
    /// The cancellation token fired.
    Cancelled,
    /// The broker closed the record stream.
    Ended,
    /// Connect, subscribe or consumption failed, see [`SessionReport::error`].
    Failed
}

/// Outcome of one session. The consumer is always disconnected by the time this exists.
#[derive(Debug)]
pub struct SessionReport {
    pub group_id: GroupId,
    pub status: SessionStatus,
    pub error: Option<SessionError>,
    /// Set when the final disconnect failed. Recorded only, never raised.
    pub disconnect_error: Option<BrokerError>,
    pub received: usize
}

impl SessionReport {
    pub fn is_broker_unavailable(&self) -> bool {
        self.error.as_ref().is_some_and(SessionError::is_broker_unavailable)
    }
}

/// Owns the connect, subscribe, run and disconnect sequence for every session of one client role.
///
/// The broker configuration is shared, the sessions are not: each call to
/// [`SessionManager::run`] builds its own consumer under its own group id and tears it down
/// before returning, whichever way the session ends.
pub struct SessionManager<B: Broker> {
    broker: Arc<B>,
    client_id: String
}

impl<B: Broker> Clone for SessionManager<B> {
    fn clone(&self) -> Self {
        Self {
            broker: self.broker.clone(),
            client_id: self.client_id.clone()
        }
    }
}

impl<B: Broker> SessionManager<B> {
    pub fn new(broker: Arc<B>, client_id: impl Into<String>) -> Self {
        Self {
            broker,
            client_id: client_id.into()
        }
    }

    pub fn address(&self) -> &str {
        self.broker.address()
    }

    /// Runs a live session on `topic` until the handler stops it, `cancel` fires or the broker fails.
    ///
    /// Dropping the returned future before it completes skips the disconnect, so callers that
    /// can be torn down from outside run it on a spawned task and stop it through `cancel`.
    pub async fn run<H: MessageHandler>(
        &self,
        topic: &str,
        group_id: GroupId,
        cancel: &CancellationToken,
        handler: &mut H
    ) -> SessionReport {
        let settings = ConsumerSettings {
            client_id: self.client_id.clone(),
            group_id: group_id.clone(),
            from_beginning: false
        };

        let consumer = match self.broker.create_consumer(&settings) {
            Ok(consumer) => consumer,
            Err(error) => {
                error!("Session [{group_id}] could not create a consumer for {}: {error}", self.address());

                return SessionReport {
                    group_id,
                    status: SessionStatus::Failed,
                    error: Some(SessionError::Connect(error)),
                    disconnect_error: None,
                    received: 0
                };
            }
        };

        let mut session = ConsumerSession::new(consumer, group_id.clone());
        let outcome = drive(&mut session, topic, cancel, handler).await;
        let disconnect_error = session.close().await;

        let (status, error) = match outcome {
            Ok(status) => {
                debug!("Session [{group_id}] finished with status [{status:?}]");
                (status, None)
            }
            Err(error) => {
                error!("Session [{group_id}] on {} failed: {error}", self.address());
                (SessionStatus::Failed, Some(error))
            }
        };

        SessionReport {
            group_id,
            status,
            error,
            disconnect_error,
            received: session.received()
        }
    }
}

async fn drive<C: Consumer, H: MessageHandler>(
    session: &mut ConsumerSession<C>,
    topic: &str,
    cancel: &CancellationToken,
    handler: &mut H
) -> Result<SessionStatus, SessionError> {
    select! {
        biased;
        _ = cancel.cancelled() => return Ok(SessionStatus::Cancelled),
        result = session.connect() => result?,
    }

    info!("Session [{}] connected", session.group_id());

    select! {
        biased;
        _ = cancel.cancelled() => return Ok(SessionStatus::Cancelled),
        result = session.subscribe(topic) => result?,
    }

    handler.on_subscribed().await;

    loop {
        let message = select! {
            biased;
            _ = cancel.cancelled() => return Ok(SessionStatus::Cancelled),
            message = session.next_message() => message,
        };

        match message {
            None => return Ok(SessionStatus::Ended),
            Some(Err(error)) => return Err(error),
            Some(Ok(message)) => {
                if handler.on_message(message).await == Directive::Stop {
                    return Ok(SessionStatus::Stopped);
                }
            }
        }
    }
}
