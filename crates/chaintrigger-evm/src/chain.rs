//! Supported EVM-family chains and their JSON-RPC dialects.

use std::str::FromStr;

use chaintrigger_core::error::ManagerError;
use chaintrigger_core::mode::ConnectionMode;

/// A chain backend served by [`EvmManager`](crate::EvmManager).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Ethereum,
    Harmony,
    Conflux,
    Tron,
}

/// Method and field names a chain uses for log delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainProfile {
    /// Canonical slug, e.g. `"ethereum"`.
    pub name: &'static str,
    /// Subscribe call for push delivery; `None` if the chain has no pubsub.
    pub subscribe_method: Option<&'static str>,
    /// Matching unsubscribe call.
    pub unsubscribe_method: Option<&'static str>,
    /// Method name on server-pushed notifications.
    pub notification_method: Option<&'static str>,
    /// Log query for pull delivery.
    pub get_logs_method: &'static str,
    /// Head block (or epoch) number query.
    pub head_method: &'static str,
    /// Name of the lower bound in the log filter.
    pub from_field: &'static str,
}

impl ChainProfile {
    /// Returns `true` if the chain can deliver logs in `mode`.
    pub fn supports(&self, mode: ConnectionMode) -> bool {
        match mode {
            ConnectionMode::Push => self.subscribe_method.is_some(),
            ConnectionMode::Pull => true,
        }
    }
}

impl Chain {
    /// Every supported chain.
    pub const ALL: [Chain; 4] = [Chain::Ethereum, Chain::Harmony, Chain::Conflux, Chain::Tron];

    pub fn profile(&self) -> ChainProfile {
        match self {
            Self::Ethereum => ChainProfile {
                name: "ethereum",
                subscribe_method: Some("eth_subscribe"),
                unsubscribe_method: Some("eth_unsubscribe"),
                notification_method: Some("eth_subscription"),
                get_logs_method: "eth_getLogs",
                head_method: "eth_blockNumber",
                from_field: "fromBlock",
            },
            Self::Harmony => ChainProfile {
                name: "harmony",
                subscribe_method: Some("hmy_subscribe"),
                unsubscribe_method: Some("hmy_unsubscribe"),
                notification_method: Some("hmy_subscription"),
                get_logs_method: "hmy_getLogs",
                head_method: "hmy_blockNumber",
                from_field: "fromBlock",
            },
            Self::Conflux => ChainProfile {
                name: "conflux",
                subscribe_method: Some("cfx_subscribe"),
                unsubscribe_method: Some("cfx_unsubscribe"),
                notification_method: Some("cfx_subscription"),
                get_logs_method: "cfx_getLogs",
                head_method: "cfx_epochNumber",
                from_field: "fromEpoch",
            },
            // Tron's JSON-RPC gateway is HTTP only.
            Self::Tron => ChainProfile {
                name: "tron",
                subscribe_method: None,
                unsubscribe_method: None,
                notification_method: None,
                get_logs_method: "eth_getLogs",
                head_method: "eth_blockNumber",
                from_field: "fromBlock",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.profile().name
    }
}

impl FromStr for Chain {
    type Err = ManagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Self::Ethereum),
            "harmony" | "hmy" => Ok(Self::Harmony),
            "conflux" | "cfx" => Ok(Self::Conflux),
            "tron" | "trx" => Ok(Self::Tron),
            _ => Err(ManagerError::UnknownChain(s.to_string())),
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
