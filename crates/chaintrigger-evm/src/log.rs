//! Raw EVM logs and their two delivery framings.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use chaintrigger_core::cursor::decode_quantity;
use chaintrigger_core::error::ManagerError;

/// A raw log as returned by `*_getLogs` or pushed by a `logs` subscription.
///
/// Conflux reports `epochNumber` where Ethereum-style nodes report
/// `blockNumber`; both land in [`RawLog::block_number`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLog {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(rename = "blockNumber", alias = "epochNumber", default)]
    pub block_number: Option<String>,
    #[serde(rename = "blockHash", default)]
    pub block_hash: Option<String>,
    #[serde(rename = "transactionHash", default)]
    pub tx_hash: Option<String>,
    #[serde(rename = "logIndex", default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: Option<bool>,
}

impl RawLog {
    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }

    /// The including block number, at full precision.
    pub fn block_number(&self) -> Result<BigUint, ManagerError> {
        let raw = self
            .block_number
            .as_deref()
            .ok_or_else(|| ManagerError::Decode("log is missing its block number".into()))?;
        decode_quantity(raw)
    }

    /// First topic (the event signature), if any.
    pub fn topic0(&self) -> Option<&str> {
        self.topics.first().map(String::as_str)
    }
}

/// Unwrap a pull delivery: the result is the log array itself.
pub fn pull_entries(result: Value) -> Result<Vec<Value>, ManagerError> {
    match result {
        Value::Array(entries) => Ok(entries),
        other => Err(ManagerError::Decode(format!(
            "expected a log array result, got {}",
            json_kind(&other)
        ))),
    }
}

/// Unwrap a push delivery: `params.result` holds one log (or, on some
/// nodes, an array of logs).
pub fn push_entries(params: Value) -> Result<Vec<Value>, ManagerError> {
    let mut params = match params {
        Value::Object(map) => map,
        other => {
            return Err(ManagerError::Decode(format!(
                "expected notification params object, got {}",
                json_kind(&other)
            )))
        }
    };
    match params.remove("result") {
        Some(Value::Array(entries)) => Ok(entries),
        Some(entry @ Value::Object(_)) => Ok(vec![entry]),
        Some(other) => Err(ManagerError::Decode(format!(
            "expected a log in notification result, got {}",
            json_kind(&other)
        ))),
        None => Err(ManagerError::Decode("notification carries no result".into())),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
