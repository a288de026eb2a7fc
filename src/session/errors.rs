use thiserror::Error;

use crate::broker::BrokerError;
use crate::session::SessionState;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session error: could not connect to broker: {0}")]
    Connect(#[source] BrokerError),
    #[error("Session error: could not subscribe to topic [{topic}]: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: BrokerError
    },
    #[error("Session error: consumer failed while running: {0}")]
    Runtime(#[source] BrokerError),
    #[error("Session error: invalid transition from [{from:?}] to [{to:?}]")]
    InvalidTransition {
        from: SessionState,
        to: SessionState
    }
}

impl SessionError {
    /// Connect and subscribe failures mean the broker never delivered anything to this session.
    pub fn is_broker_unavailable(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::Subscribe { .. })
    }
}
