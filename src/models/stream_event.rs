use serde::{Deserialize, Serialize};

use crate::models::Transaction;
use crate::types::timestamp_now;

/// Unit pushed to a stream subscriber, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Liveness and progress of the broker handshake.
    Connection {
        message: String,
        timestamp: String
    },
    Transaction {
        data: Transaction
    },
    /// A failure the subscriber should know about. `error` carries the underlying detail.
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: String
    }
}

impl StreamEvent {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            timestamp: timestamp_now()
        }
    }

    pub fn transaction(data: Transaction) -> Self {
        Self::Transaction { data }
    }

    pub fn error(message: impl Into<String>, detail: Option<String>) -> Self {
        Self::Error {
            message: message.into(),
            error: detail,
            timestamp: timestamp_now()
        }
    }

    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Transaction { .. })
    }
}
