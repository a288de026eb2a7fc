mod group_id;

use chrono::{DateTime, SecondsFormat, Utc};

pub use group_id::GroupId;

pub type TransactionId = i64;

/// Formats an instant the way every outbound timestamp is rendered (RFC 3339, millisecond precision).
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}
