//! chaintrigger-core — the chain-agnostic half of ChainTrigger.
//!
//! # Overview
//!
//! ChainTrigger bridges on-chain logs into job-run requests for an off-chain
//! execution pipeline. Each subscription is served by a [`ChainManager`]
//! that builds JSON-RPC requests and parses node responses, for both push
//! (WebSocket subscription) and pull (HTTP polling) delivery. The core crate
//! defines:
//!
//! - [`Envelope`] — JSON-RPC 2.0 wire codec
//! - [`Cursor`] / [`FilterScope`] — incremental "from block" log queries
//! - [`ConnectionMode`] — push or pull
//! - [`ChainManager`] — the four-operation contract chain crates implement
//! - [`normalizer`] — removed-log filtering and cursor advancement
//! - [`SubscriptionConfig`] — per-job configuration
//! - [`MetricsPingRecorder`] — endpoint liveness pings via `metrics`

pub mod config;
pub mod cursor;
pub mod envelope;
pub mod error;
pub mod job;
pub mod liveness;
pub mod logging;
pub mod manager;
pub mod mode;
pub mod normalizer;
pub mod scope;

pub use config::SubscriptionConfig;
pub use cursor::Cursor;
pub use envelope::{Envelope, JsonRpcError};
pub use error::ManagerError;
pub use job::{JobIdMatcher, JobRunRequest};
pub use liveness::{MetricsPingRecorder, SourcePingRecorder};
pub use logging::{init_tracing, LogConfig};
pub use manager::{ChainManager, ManagerConfig, ManagerPhase, ManagerState};
pub use mode::ConnectionMode;
pub use normalizer::{LogTranslator, NormalizedBatch};
pub use scope::FilterScope;
