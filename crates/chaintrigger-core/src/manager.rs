//! The `ChainManager` trait — the per-subscription event protocol.
//!
//! A manager turns a subscription into outbound request bytes and inbound
//! response bytes into [`JobRunRequest`]s. It performs no I/O: a transport
//! owned by the caller moves the bytes, and one caller drives each manager
//! sequentially.
//!
//! ```text
//! Idle ──trigger request──▶ Streaming ──stop()──▶ Stopped
//! ```

use num_bigint::BigUint;
use serde_json::Value;

use crate::cursor::Cursor;
use crate::error::ManagerError;
use crate::job::{JobIdMatcher, JobRunRequest};
use crate::mode::ConnectionMode;
use crate::normalizer::{normalize_batch, LogTranslator, NormalizedBatch};
use crate::scope::FilterScope;

/// Lifecycle phase of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerPhase {
    /// Constructed; no trigger request built yet.
    Idle,
    /// Trigger requests are being sent and responses parsed.
    Streaming,
    /// Torn down; every operation is refused.
    Stopped,
}

impl std::fmt::Display for ManagerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Streaming => write!(f, "streaming"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Everything needed to construct a manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub scope: FilterScope,
    pub mode: ConnectionMode,
    /// Human-readable endpoint name, used in logs and ping tracking.
    pub endpoint_label: String,
    /// Job / subscription identifier.
    pub subscription_id: String,
    /// Starting position. Only meaningful in pull mode.
    pub cursor: Cursor,
    /// When set, only logs carrying a matching job id produce requests.
    pub job_matcher: Option<JobIdMatcher>,
}

impl ManagerConfig {
    pub fn new(
        scope: FilterScope,
        mode: ConnectionMode,
        endpoint_label: impl Into<String>,
        subscription_id: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            mode,
            endpoint_label: endpoint_label.into(),
            subscription_id: subscription_id.into(),
            cursor: Cursor::Unset,
            job_matcher: None,
        }
    }

    /// Start from `cursor` instead of [`Cursor::Unset`].
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = cursor;
        self
    }

    /// Only emit requests for logs whose job id satisfies `matcher`.
    pub fn with_job_matcher(mut self, matcher: JobIdMatcher) -> Self {
        self.job_matcher = Some(matcher);
        self
    }
}

/// State owned by one manager instance.
///
/// Scope, mode and identity are fixed at construction; the cursor and phase
/// change only through the methods below.
#[derive(Debug, Clone)]
pub struct ManagerState {
    scope: FilterScope,
    mode: ConnectionMode,
    cursor: Cursor,
    endpoint_label: String,
    subscription_id: String,
    phase: ManagerPhase,
}

impl ManagerState {
    pub fn new(config: &ManagerConfig) -> Self {
        Self {
            scope: config.scope.clone(),
            mode: config.mode,
            cursor: config.cursor.clone(),
            endpoint_label: config.endpoint_label.clone(),
            subscription_id: config.subscription_id.clone(),
            phase: ManagerPhase::Idle,
        }
    }

    pub fn scope(&self) -> &FilterScope {
        &self.scope
    }

    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn endpoint_label(&self) -> &str {
        &self.endpoint_label
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn phase(&self) -> ManagerPhase {
        self.phase
    }

    /// Query descriptor for the current scope and cursor.
    pub fn query_descriptor(&self, from_field: &str) -> Value {
        self.scope.query_descriptor(&self.cursor, from_field)
    }

    /// Fails with [`ManagerError::Stopped`] once the manager is torn down.
    pub fn ensure_active(&self) -> Result<(), ManagerError> {
        if self.phase == ManagerPhase::Stopped {
            return Err(ManagerError::Stopped {
                subscription_id: self.subscription_id.clone(),
            });
        }
        Ok(())
    }

    /// Enter [`ManagerPhase::Streaming`] from `Idle`.
    pub fn begin_streaming(&mut self) {
        if self.phase == ManagerPhase::Idle {
            self.phase = ManagerPhase::Streaming;
        }
    }

    pub fn stop(&mut self) {
        self.phase = ManagerPhase::Stopped;
    }

    /// Move the cursor to the head reported by a health check.
    pub fn bootstrap_cursor(&mut self, head: BigUint) {
        if self.cursor.bootstrap(head) {
            tracing::info!(
                endpoint = %self.endpoint_label,
                job_id = %self.subscription_id,
                cursor = %self.cursor,
                "cursor bootstrapped from chain head"
            );
        }
    }

    /// Run the shared normalizer over a decoded batch.
    pub fn apply_batch<T: LogTranslator>(
        &mut self,
        translator: &T,
        entries: Vec<Value>,
    ) -> NormalizedBatch {
        let batch = normalize_batch(translator, entries, &mut self.cursor);
        tracing::debug!(
            endpoint = %self.endpoint_label,
            job_id = %self.subscription_id,
            requests = batch.requests.len(),
            removed = batch.removed,
            malformed = batch.malformed,
            unmatched = batch.unmatched,
            cursor = %self.cursor,
            "batch normalized"
        );
        batch
    }
}

/// The per-chain event protocol.
///
/// Implementations exist per chain backend; the orchestration layer only
/// ever talks to `dyn ChainManager`.
pub trait ChainManager: Send {
    /// Request that starts event delivery: a subscribe call in push mode, a
    /// log query from the current cursor in pull mode.
    ///
    /// `None` means there is nothing to send (unsupported mode or stopped).
    fn build_trigger_request(&mut self) -> Option<Vec<u8>>;

    /// Request probing the endpoint. Pull mode asks for the head block;
    /// push mode has no health check and returns `None`.
    fn build_health_check_request(&self) -> Option<Vec<u8>>;

    /// Consume the health check response. In pull mode the reported head becomes
    /// the cursor; push mode always succeeds without touching state.
    fn parse_health_check_response(&mut self, data: &[u8]) -> Result<(), ManagerError>;

    /// Turn a delivery into job-run requests, advancing the cursor.
    ///
    /// On error the state is unchanged.
    fn parse_event_response(&mut self, data: &[u8]) -> Result<Vec<JobRunRequest>, ManagerError>;

    /// Read-only view of the manager's state.
    fn state(&self) -> &ManagerState;

    /// Tear the manager down.
    fn stop(&mut self);
}
