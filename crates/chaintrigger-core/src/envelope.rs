//! JSON-RPC 2.0 envelope codec.
//!
//! A single [`Envelope`] type covers requests, responses and subscription
//! notifications. Every field is optional on decode so the same decoder
//! accepts all three shapes; callers check which fields a given reply must
//! carry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ManagerError;

/// Protocol version tag carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Correlation id used for every request the managers build.
pub const DEFAULT_REQUEST_ID: u64 = 1;

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// The request/response wire wrapper.
///
/// `params`, `result` and `error` are kept as raw JSON; their shape is
/// chain-specific and interpreted by the chain managers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "jsonrpc", default)]
    pub version: String,
    /// Correlation id. Opaque: any JSON value the node echoes back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Envelope {
    /// Create a request envelope with the default correlation id.
    ///
    /// `params` of `None` omits the field entirely, which is what nodes
    /// expect for parameterless calls such as `eth_blockNumber`.
    pub fn request(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            version: JSONRPC_VERSION.into(),
            id: Some(Value::from(DEFAULT_REQUEST_ID)),
            method: Some(method.into()),
            params,
            result: None,
            error: None,
        }
    }

    /// Serialize to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, ManagerError> {
        serde_json::to_vec(self).map_err(|e| ManagerError::Decode(format!("encode envelope: {e}")))
    }

    /// Parse wire bytes. Unknown fields are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, ManagerError> {
        serde_json::from_slice(data).map_err(ManagerError::from)
    }

    /// Returns `true` for server-pushed notifications (method set, no id).
    pub fn is_notification(&self) -> bool {
        self.method.is_some() && self.id.is_none()
    }

    /// The error object, if the node returned one in the standard shape.
    ///
    /// Non-standard error payloads are reported with code `0` and the raw
    /// JSON as message.
    pub fn rpc_error(&self) -> Option<JsonRpcError> {
        let raw = self.error.as_ref()?;
        Some(
            serde_json::from_value::<JsonRpcError>(raw.clone()).unwrap_or_else(|_| JsonRpcError {
                code: 0,
                message: raw.to_string(),
                data: None,
            }),
        )
    }

    /// Take the result value of a response.
    ///
    /// An error response yields [`ManagerError::Rpc`]; a reply carrying
    /// neither result nor error is a decode failure.
    pub fn into_result(self) -> Result<Value, ManagerError> {
        if let Some(err) = self.rpc_error() {
            return Err(ManagerError::Rpc(err));
        }
        self.result
            .ok_or_else(|| ManagerError::Decode("response carries neither result nor error".into()))
    }
}
