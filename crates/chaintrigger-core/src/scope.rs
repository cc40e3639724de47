//! Filter scope and the log query descriptor built from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cursor::Cursor;

/// Event signature of the oracle contract's `OracleRequest` log:
/// `keccak256("OracleRequest(bytes32,address,bytes32,uint256,address,bytes4,uint256,uint256,bytes)")`.
pub const ORACLE_REQUEST_TOPIC: &str =
    "0xd8d7ecc4800d25fa53ce0372f13a416d98907a7ef3d8d3bdd79cf4fe75529c65";

/// Which logs a subscription cares about.
///
/// Fixed for the lifetime of a manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterScope {
    /// Contract addresses (empty = any address).
    #[serde(default)]
    pub addresses: Vec<String>,
    /// Accepted values for the first topic position (empty = any event).
    #[serde(default)]
    pub topics: Vec<String>,
}

impl FilterScope {
    pub fn new(addresses: Vec<String>, topics: Vec<String>) -> Self {
        Self { addresses, topics }
    }

    /// Scope matching oracle requests emitted by `addresses`.
    pub fn oracle_requests(addresses: Vec<String>) -> Self {
        Self {
            addresses,
            topics: vec![ORACLE_REQUEST_TOPIC.to_string()],
        }
    }

    /// Returns `true` if `address` is inside this scope.
    pub fn matches_address(&self, address: &str) -> bool {
        self.addresses.is_empty()
            || self.addresses.iter().any(|a| a.eq_ignore_ascii_case(address))
    }

    /// Build the filter object embedded in a log query.
    ///
    /// `from_field` is the chain's name for the lower bound (`fromBlock` on
    /// Ethereum-style nodes, `fromEpoch` on Conflux).
    pub fn query_descriptor(&self, cursor: &Cursor, from_field: &str) -> Value {
        let mut filter = Map::new();
        filter.insert(
            from_field.to_string(),
            Value::String(cursor.to_query_param()),
        );
        if !self.addresses.is_empty() {
            filter.insert(
                "address".to_string(),
                Value::Array(self.addresses.iter().cloned().map(Value::String).collect()),
            );
        }
        if !self.topics.is_empty() {
            let first: Vec<Value> = self.topics.iter().cloned().map(Value::String).collect();
            filter.insert("topics".to_string(), Value::Array(vec![Value::Array(first)]));
        }
        Value::Object(filter)
    }
}
