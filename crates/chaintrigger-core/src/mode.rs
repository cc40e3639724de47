//! Connection mode — push subscription or pull polling.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ManagerError;

/// How events reach the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// Persistent subscription, server-driven delivery (WebSocket).
    #[serde(alias = "ws", alias = "websocket")]
    Push,
    /// Client-driven periodic query (HTTP JSON-RPC).
    #[serde(alias = "rpc", alias = "http")]
    Pull,
}

impl ConnectionMode {
    /// Infer the mode from an endpoint URL scheme.
    ///
    /// `ws://` and `wss://` select [`Push`](Self::Push); `http://` and
    /// `https://` select [`Pull`](Self::Pull).
    pub fn from_endpoint_url(url: &str) -> Result<Self, ManagerError> {
        let scheme = url
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| ManagerError::Config(format!("endpoint url '{url}' has no scheme")))?;
        match scheme.as_str() {
            "ws" | "wss" => Ok(Self::Push),
            "http" | "https" => Ok(Self::Pull),
            other => Err(ManagerError::unsupported_mode(url, other)),
        }
    }

    pub fn is_push(&self) -> bool {
        matches!(self, Self::Push)
    }
}

impl FromStr for ConnectionMode {
    type Err = ManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "push" | "ws" | "websocket" => Ok(Self::Push),
            "pull" | "rpc" | "http" => Ok(Self::Pull),
            other => Err(ManagerError::unsupported_mode("*", other)),
        }
    }
}

impl std::fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Pull => write!(f, "pull"),
        }
    }
}
