//! [`EvmManager`] — the [`ChainManager`] for EVM-style JSON-RPC nodes.

use std::sync::Arc;

use serde_json::{json, Value};

use chaintrigger_core::cursor::decode_quantity;
use chaintrigger_core::envelope::Envelope;
use chaintrigger_core::error::ManagerError;
use chaintrigger_core::job::JobRunRequest;
use chaintrigger_core::liveness::SourcePingRecorder;
use chaintrigger_core::manager::{ChainManager, ManagerConfig, ManagerState};
use chaintrigger_core::mode::ConnectionMode;

use crate::chain::{Chain, ChainProfile};
use crate::log::{pull_entries, push_entries};
use crate::translator::EvmLogTranslator;

/// Manager for one subscription on an EVM-family chain.
///
/// Push mode speaks `<prefix>_subscribe("logs", filter)`; pull mode polls
/// `<prefix>_getLogs(filter)` from the cursor, after bootstrapping the
/// cursor from `<prefix>_blockNumber`.
pub struct EvmManager {
    chain: Chain,
    profile: ChainProfile,
    state: ManagerState,
    translator: EvmLogTranslator,
    /// Subscription id assigned by the node once it confirms a subscribe.
    node_subscription: Option<String>,
    pings: Option<Arc<dyn SourcePingRecorder>>,
}

impl EvmManager {
    /// Construct a manager. A mode the chain cannot serve is accepted here
    /// and reported by every operation.
    pub fn new(chain: Chain, config: ManagerConfig) -> Self {
        let state = ManagerState::new(&config);
        Self {
            chain,
            profile: chain.profile(),
            translator: EvmLogTranslator::new(chain, config.scope.clone(), config.job_matcher),
            state,
            node_subscription: None,
            pings: None,
        }
    }

    /// Report a ping to `recorder` on every event response.
    pub fn with_ping_recorder(mut self, recorder: Arc<dyn SourcePingRecorder>) -> Self {
        self.pings = Some(recorder);
        self
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }

    /// The node-side subscription id, once a push subscribe was confirmed.
    pub fn node_subscription(&self) -> Option<&str> {
        self.node_subscription.as_deref()
    }

    /// Request cancelling the confirmed push subscription.
    ///
    /// `None` before confirmation, or if the chain has no pubsub.
    pub fn build_unsubscribe_request(&self) -> Option<Vec<u8>> {
        let method = self.profile.unsubscribe_method?;
        let id = self.node_subscription.as_ref()?;
        self.encode(Envelope::request(method, Some(json!([id]))))
    }

    fn check_mode(&self) -> Result<(), ManagerError> {
        let mode = self.state.mode();
        if self.profile.supports(mode) {
            Ok(())
        } else {
            Err(ManagerError::unsupported_mode(self.profile.name, mode))
        }
    }

    /// Shared guard for the request builders.
    fn can_build(&self, what: &str) -> bool {
        if self.state.ensure_active().is_err() {
            tracing::debug!(
                job_id = %self.state.subscription_id(),
                "{what} requested on a stopped manager"
            );
            return false;
        }
        if let Err(e) = self.check_mode() {
            tracing::error!(
                endpoint = %self.state.endpoint_label(),
                job_id = %self.state.subscription_id(),
                error = %e,
                "cannot build {what}"
            );
            return false;
        }
        true
    }

    fn encode(&self, envelope: Envelope) -> Option<Vec<u8>> {
        match envelope.encode() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::error!(
                    job_id = %self.state.subscription_id(),
                    error = %e,
                    "failed to encode request"
                );
                None
            }
        }
    }

    /// Unwrap a push delivery into raw log entries.
    ///
    /// Returns `Ok(None)` for the subscribe confirmation, which carries no
    /// logs.
    fn push_delivery(&mut self, envelope: Envelope) -> Result<Option<Vec<Value>>, ManagerError> {
        if let Some(err) = envelope.rpc_error() {
            return Err(ManagerError::Rpc(err));
        }

        if envelope.is_notification() {
            let params = envelope
                .params
                .ok_or_else(|| ManagerError::Decode("notification carries no params".into()))?;
            if let (Some(expected), Some(actual)) = (
                self.node_subscription.as_deref(),
                params.get("subscription").and_then(Value::as_str),
            ) {
                if expected != actual {
                    tracing::debug!(expected, actual, "notification for another subscription");
                    return Ok(Some(Vec::new()));
                }
            }
            return push_entries(params).map(Some);
        }

        match envelope.result {
            Some(Value::String(id)) => {
                tracing::info!(
                    endpoint = %self.state.endpoint_label(),
                    job_id = %self.state.subscription_id(),
                    subscription = %id,
                    "subscription confirmed"
                );
                self.node_subscription = Some(id);
                Ok(None)
            }
            Some(_) => Err(ManagerError::Decode(
                "subscribe reply result is not a subscription id".into(),
            )),
            None => Err(ManagerError::Decode(
                "push reply is neither a notification nor a subscribe reply".into(),
            )),
        }
    }
}

impl ChainManager for EvmManager {
    fn build_trigger_request(&mut self) -> Option<Vec<u8>> {
        if !self.can_build("trigger request") {
            return None;
        }

        let descriptor = self.state.query_descriptor(self.profile.from_field);
        let envelope = match self.state.mode() {
            ConnectionMode::Push => {
                let method = self.profile.subscribe_method?;
                Envelope::request(method, Some(json!(["logs", descriptor])))
            }
            ConnectionMode::Pull => {
                Envelope::request(self.profile.get_logs_method, Some(json!([descriptor])))
            }
        };

        let bytes = self.encode(envelope)?;
        self.state.begin_streaming();
        Some(bytes)
    }

    fn build_health_check_request(&self) -> Option<Vec<u8>> {
        if !self.can_build("health check") {
            return None;
        }
        match self.state.mode() {
            ConnectionMode::Push => None,
            ConnectionMode::Pull => self.encode(Envelope::request(self.profile.head_method, None)),
        }
    }

    fn parse_health_check_response(&mut self, data: &[u8]) -> Result<(), ManagerError> {
        self.state.ensure_active()?;
        self.check_mode()?;
        if self.state.mode().is_push() {
            return Ok(());
        }

        let result = Envelope::decode(data)?.into_result()?;
        let head = result
            .as_str()
            .ok_or_else(|| ManagerError::Decode(format!("head number is not a string: {result}")))?;
        self.state.bootstrap_cursor(decode_quantity(head)?);
        Ok(())
    }

    fn parse_event_response(&mut self, data: &[u8]) -> Result<Vec<JobRunRequest>, ManagerError> {
        self.state.ensure_active()?;
        if let Some(pings) = &self.pings {
            pings.record_ping(self.state.endpoint_label(), self.state.subscription_id());
        }
        self.check_mode()?;

        let envelope = Envelope::decode(data)?;
        let entries = match self.state.mode() {
            ConnectionMode::Push => match self.push_delivery(envelope)? {
                Some(entries) => entries,
                None => return Ok(Vec::new()),
            },
            ConnectionMode::Pull => pull_entries(envelope.into_result()?)?,
        };

        let batch = self.state.apply_batch(&self.translator, entries);
        Ok(batch.requests)
    }

    fn state(&self) -> &ManagerState {
        &self.state
    }

    fn stop(&mut self) {
        self.state.stop();
        tracing::info!(
            endpoint = %self.state.endpoint_label(),
            job_id = %self.state.subscription_id(),
            chain = %self.chain,
            "manager stopped"
        );
    }
}
