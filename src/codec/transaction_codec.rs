use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Number, Value};

use crate::codec::errors::DecodeError;
use crate::models::Transaction;
use crate::types::{format_timestamp, TransactionId};

/// Shape of a record as the producer publishes it. Unknown fields are ignored.
///
/// Every field is read loosely: a value of an unexpected type is carried through or dropped,
/// it never rejects the record.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SourceRecord {
    id: Value,
    trans_num: Value,
    amt: Value,
    merchant: Value,
    category: Value,
    first: Value,
    last: Value,
    city: Value,
    state: Value,
    is_fraud: Value,
    trans_date_trans_time: Value
}

/// Decodes one broker payload into a [`Transaction`], using the current time for fallbacks.
pub fn decode(payload: &[u8]) -> Result<Transaction, DecodeError> {
    decode_at(payload, Utc::now())
}

/// Decodes one broker payload, taking `now` as the fallback for a missing `id` or timestamp.
pub fn decode_at(payload: &[u8], now: DateTime<Utc>) -> Result<Transaction, DecodeError> {
    let record: SourceRecord = match serde_json::from_slice::<Value>(payload)? {
        fields @ Value::Object(_) => serde_json::from_value(fields)?,
        other => return Err(DecodeError::NotARecord(json_kind(&other)))
    };

    Ok(Transaction {
        id: source_id(&record.id).unwrap_or_else(|| now.timestamp_millis()),
        transaction_number: text(record.trans_num),
        amount: amount(&record.amt),
        merchant: text(record.merchant),
        category: text(record.category),
        customer: customer_name(text(record.first), text(record.last)),
        city: text(record.city),
        state: text(record.state),
        is_fraud: is_truthy(&record.is_fraud),
        timestamp: text(record.trans_date_trans_time)
            .filter(|timestamp| !timestamp.is_empty())
            .unwrap_or_else(|| format_timestamp(now))
    })
}

//NOTE: A zero id falls back like a missing one, as `id || now` does. The producer's row index
//      starts at 0, so the first exported row really is replaced.
fn source_id(value: &Value) -> Option<TransactionId> {
    let id = match value {
        Value::Number(number) => number.as_i64().or_else(|| integral(number)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None
    };

    id.filter(|id| *id != 0)
}

fn integral(number: &Number) -> Option<i64> {
    number.as_f64()
        .filter(|value| value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .map(|value| value as i64)
}

/// Numeric amounts outside the decimal range are dropped rather than failing the record.
fn amount(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None
    };

    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

/// Renders a pass-through field as text. `null` counts as absent.
fn text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string())
    }
}

fn customer_name(first: Option<String>, last: Option<String>) -> String {
    [first, last].into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object"
    }
}
