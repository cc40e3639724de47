//! chaintrigger-evm — chain managers for EVM-family JSON-RPC nodes.
//!
//! Ethereum, Harmony, Conflux and Tron share one log model and differ only
//! in method prefixes, the name of the block lower bound, and whether
//! pubsub is available. [`Chain::profile`] captures those differences and a
//! single [`EvmManager`] serves all four.
//!
//! # Example
//!
//! ```rust
//! use chaintrigger_core::{ChainManager, SubscriptionConfig};
//! use chaintrigger_evm::create_manager;
//!
//! let config = SubscriptionConfig::from_json_str(r#"{
//!     "job_id": "4c7b7ffb66b344fbaa64995af81e355a",
//!     "endpoint_name": "mainnet",
//!     "endpoint_url": "https://node.example/rpc",
//!     "chain": "ethereum"
//! }"#).unwrap();
//! let manager = create_manager(&config, None).unwrap();
//! let health = manager.build_health_check_request().unwrap();
//! assert!(String::from_utf8(health).unwrap().contains("eth_blockNumber"));
//! ```

pub mod chain;
pub mod log;
pub mod manager;
pub mod oracle;
pub mod translator;

use std::sync::Arc;

use chaintrigger_core::config::SubscriptionConfig;
use chaintrigger_core::error::ManagerError;
use chaintrigger_core::manager::ChainManager;
use chaintrigger_core::liveness::SourcePingRecorder;

pub use chain::{Chain, ChainProfile};
pub use log::RawLog;
pub use manager::EvmManager;
pub use oracle::{decode_oracle_request, OracleRequest};
pub use translator::EvmLogTranslator;

/// Build the manager for a subscription.
///
/// Fails on an unknown chain, an invalid config, or a connection mode the
/// chain cannot serve.
pub fn create_manager(
    config: &SubscriptionConfig,
    pings: Option<Arc<dyn SourcePingRecorder>>,
) -> Result<Box<dyn ChainManager>, ManagerError> {
    let chain: Chain = config.chain.parse()?;
    let manager_config = config.manager_config()?;
    if !chain.profile().supports(manager_config.mode) {
        return Err(ManagerError::unsupported_mode(chain.name(), manager_config.mode));
    }

    tracing::info!(
        chain = %chain,
        mode = %manager_config.mode,
        endpoint = %manager_config.endpoint_label,
        job_id = %manager_config.subscription_id,
        "creating chain manager"
    );

    let mut manager = EvmManager::new(chain, manager_config);
    if let Some(pings) = pings {
        manager = manager.with_ping_recorder(pings);
    }
    Ok(Box::new(manager))
}
