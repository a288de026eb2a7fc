use serde::{Deserialize, Serialize};

use crate::models::Transaction;

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub success: bool,
    pub data: Vec<Transaction>,
    pub message: String,
    /// Broker address, suffixed with `(offline)` when it could not be reached.
    pub broker: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broker: Option<String>
}

impl FailureResponse {
    pub fn new(error: impl Into<String>, broker: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            broker
        }
    }
}
