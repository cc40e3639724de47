//! Error types for chain managers.

use thiserror::Error;

use crate::envelope::JsonRpcError;

/// Conditions a chain manager reports back to its caller.
///
/// None of these are fatal: the caller decides whether to retry, drop the
/// subscription, or alert.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Malformed or truncated wire payload. Manager state is left untouched.
    #[error("decode error: {0}")]
    Decode(String),

    /// The manager has no behavior for the requested connection mode.
    #[error("unknown connection type '{mode}' for chain '{chain}'")]
    UnsupportedMode { chain: String, mode: String },

    /// No manager variant exists for the configured chain.
    #[error("unknown chain '{0}'")]
    UnknownChain(String),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Subscription configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// The manager was stopped and no longer accepts input.
    #[error("manager for subscription '{subscription_id}' is stopped")]
    Stopped { subscription_id: String },
}

impl ManagerError {
    /// Returns `true` for malformed-input failures.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` when the connection mode is not supported.
    pub fn is_unsupported_mode(&self) -> bool {
        matches!(self, Self::UnsupportedMode { .. })
    }

    /// Build an [`ManagerError::UnsupportedMode`] for `chain`.
    pub fn unsupported_mode(chain: impl Into<String>, mode: impl ToString) -> Self {
        Self::UnsupportedMode {
            chain: chain.into(),
            mode: mode.to_string(),
        }
    }
}

impl From<serde_json::Error> for ManagerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
