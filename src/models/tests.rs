use super::{StreamEvent, Transaction};

use std::str::FromStr;

use anyhow::Result;
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn create_transaction(amount: Option<&str>) -> Result<Transaction> {
    Ok(Transaction {
        id: 42,
        transaction_number: Some("2da90c7d74bd46a0caf3777415b3ebd3".to_string()),
        amount: match amount {
            Some(s) => Some(Decimal::from_str(s)?),
            None => None
        },
        merchant: Some("fraud_Rippin, Kub and Mann".to_string()),
        category: Some("misc_net".to_string()),
        customer: "Jennifer Banks".to_string(),
        city: Some("Moravian Falls".to_string()),
        state: Some("NC".to_string()),
        is_fraud: false,
        timestamp: "2019-01-01 00:00:18".to_string()
    })
}

#[test]
fn test_transaction_serializes_with_dashboard_field_names() -> Result<()> {
    let value = serde_json::to_value(create_transaction(Some("4.97"))?)?;

    assert_eq!(value["trans_num"], "2da90c7d74bd46a0caf3777415b3ebd3");
    assert_eq!(value["amount"], json!(4.97));
    assert_eq!(value["is_fraud"], json!(false));
    assert_eq!(value["customer"], "Jennifer Banks");
    assert!(value.get("transaction_number").is_none());

    Ok(())
}

#[test]
fn test_transaction_omits_absent_source_fields() -> Result<()> {
    let mut transaction = create_transaction(None)?;
    transaction.merchant = None;

    let value = serde_json::to_value(&transaction)?;

    assert!(value.get("amount").is_none());
    assert!(value.get("merchant").is_none());

    Ok(())
}

#[test]
fn test_stream_events_are_tagged_by_type() -> Result<()> {
    let connection = serde_json::to_value(StreamEvent::connection("Connecting"))?;
    assert_eq!(connection["type"], "connection");
    assert_eq!(connection["message"], "Connecting");
    assert!(connection["timestamp"].is_string());

    let transaction = serde_json::to_value(StreamEvent::transaction(create_transaction(Some("10.5"))?))?;
    assert_eq!(transaction["type"], "transaction");
    assert_eq!(transaction["data"]["id"], json!(42));

    Ok(())
}

#[test]
fn test_error_event_only_carries_detail_when_present() -> Result<()> {
    let without_detail = serde_json::to_value(StreamEvent::error("Error parsing transaction data", None))?;
    assert_eq!(without_detail["type"], "error");
    assert!(without_detail.get("error").is_none());

    let with_detail = serde_json::to_value(StreamEvent::error("Failed to connect", Some("timed out".to_string())))?;
    assert_eq!(with_detail["error"], Value::from("timed out"));

    Ok(())
}

#[test]
fn test_stream_event_parses_back_from_the_wire() -> Result<()> {
    let event = StreamEvent::transaction(create_transaction(Some("107.23"))?);
    let wire = serde_json::to_string(&event)?;

    let parsed: StreamEvent = serde_json::from_str(&wire)?;

    assert!(parsed.is_transaction());
    assert_eq!(parsed, event);

    Ok(())
}
