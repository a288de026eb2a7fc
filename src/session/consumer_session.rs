use tracing::{debug, error, info, warn};

use crate::broker::{BrokerError, Consumer, RawMessage};
use crate::session::SessionError;
use crate::types::GroupId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Connected,
    Subscribed,
    Running,
    Closed
}

/// A broker consumer moving through `Created -> Connected -> Subscribed -> Running -> Closed`.
///
/// `Closed` is reachable from every other state and is terminal: the consumer is disconnected
/// on the first call to [`ConsumerSession::close`] and never again.
pub struct ConsumerSession<C: Consumer> {
    consumer: C,
    group_id: GroupId,
    state: SessionState,
    received: usize
}

impl<C: Consumer> ConsumerSession<C> {
    pub fn new(consumer: C, group_id: GroupId) -> Self {
        Self {
            consumer,
            group_id,
            state: SessionState::Created,
            received: 0
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    /// Records handed out by [`ConsumerSession::next_message`], tombstones included.
    pub fn received(&self) -> usize {
        self.received
    }

    pub async fn connect(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::Created, SessionState::Connected)?;
        self.consumer.connect().await.map_err(SessionError::Connect)?;
        self.state = SessionState::Connected;

        Ok(())
    }

    pub async fn subscribe(&mut self, topic: &str) -> Result<(), SessionError> {
        self.transition(SessionState::Connected, SessionState::Subscribed)?;
        self.consumer.subscribe(topic).await.map_err(|source| SessionError::Subscribe {
            topic: topic.to_string(),
            source
        })?;
        self.state = SessionState::Subscribed;

        debug!("Session [{}] subscribed to [{topic}]", self.group_id);
        Ok(())
    }

    pub async fn next_message(&mut self) -> Option<Result<RawMessage, SessionError>> {
        match self.state {
            SessionState::Subscribed => self.state = SessionState::Running,
            SessionState::Running => {}
            from => return Some(Err(SessionError::InvalidTransition { from, to: SessionState::Running }))
        }

        let message = self.consumer.next_message().await?;

        if message.is_ok() {
            self.received += 1;
        }

        Some(message.map_err(SessionError::Runtime))
    }

    /// Disconnects the consumer unless the session is already closed.
    ///
    /// A failed disconnect is logged and returned for reporting, it never aborts the caller.
    pub async fn close(&mut self) -> Option<BrokerError> {
        if self.state == SessionState::Closed {
            return None;
        }

        let from = self.state;
        self.state = SessionState::Closed;

        match self.consumer.disconnect().await {
            Ok(()) => {
                info!("Session [{}] disconnected from [{from:?}] after {} record(s)", self.group_id, self.received);
                None
            }
            Err(error) => {
                error!("Session [{}] failed to disconnect cleanly: {error}", self.group_id);
                Some(error)
            }
        }
    }

    fn transition(&self, expected: SessionState, to: SessionState) -> Result<(), SessionError> {
        if self.state != expected {
            return Err(SessionError::InvalidTransition { from: self.state, to });
        }

        Ok(())
    }
}

impl<C: Consumer> Drop for ConsumerSession<C> {
    fn drop(&mut self) {
        if self.state != SessionState::Closed {
            warn!("Session [{}] dropped in state [{:?}] without disconnecting", self.group_id, self.state);
        }
    }
}
