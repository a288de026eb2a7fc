use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: [{0}] must be greater than zero")]
    NotPositive(&'static str),
    #[error("Configuration error: heartbeat interval [{heartbeat_interval_ms}ms] must be shorter than the session timeout [{session_timeout_ms}ms]")]
    HeartbeatTooSlow {
        heartbeat_interval_ms: u64,
        session_timeout_ms: u64
    },
    #[error("Configuration error: {0} must not be empty")]
    Missing(&'static str)
}
