use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::TransactionId;

/// A normalized card transaction as served to dashboard clients.
///
/// Every value is produced by the codec from exactly one broker record and is never
/// modified afterwards. Source fields that were absent stay `None` and are omitted from
/// the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Source `id`, or the decode time in unix milliseconds when the source had none.
    pub id: TransactionId,
    /// Source-provided unique token.
    #[serde(rename = "trans_num", default, skip_serializing_if = "Option::is_none")]
    pub transaction_number: Option<String>,
    /// Source field `amt`.
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// `"<first> <last>"` of the card holder.
    pub customer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub is_fraud: bool,
    /// Source `trans_date_trans_time`, or the decode time when the source had none.
    pub timestamp: String
}
