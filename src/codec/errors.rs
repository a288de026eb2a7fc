use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Decode error: payload is not a well-formed transaction record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Decode error: payload is {0}, expected a transaction object")]
    NotARecord(&'static str)
}
