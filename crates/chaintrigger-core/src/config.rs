//! Subscription configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::ManagerError;
use crate::job::JobIdMatcher;
use crate::manager::ManagerConfig;
use crate::mode::ConnectionMode;
use crate::scope::FilterScope;

/// One job's subscription to one chain endpoint, as loaded from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    /// Job identifier; also the subscription id.
    pub job_id: String,
    /// Endpoint name used for logging and ping tracking.
    pub endpoint_name: String,
    /// Endpoint URL, e.g. "wss://mainnet.infura.io/ws/v3/..."
    pub endpoint_url: String,
    /// Chain slug, e.g. "ethereum", "harmony".
    pub chain: String,
    /// Connection mode; inferred from the URL scheme when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ConnectionMode>,
    /// Contract addresses to watch (empty = all contracts).
    #[serde(default)]
    pub addresses: Vec<String>,
    /// First-topic filter. Empty means "oracle requests for this job".
    #[serde(default)]
    pub topics: Vec<String>,
    /// Initial cursor: "", "latest" or a hex block number.
    #[serde(default)]
    pub from: String,
    /// Accept the placeholder "mock" job id (test environments only).
    #[serde(default)]
    pub accept_mock_job_id: bool,
}

impl SubscriptionConfig {
    /// Parse a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self, ManagerError> {
        serde_json::from_str(s).map_err(|e| ManagerError::Config(e.to_string()))
    }

    /// Read and parse a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ManagerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ManagerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&content)
    }

    /// Reject configs missing the identity fields.
    pub fn validate(&self) -> Result<(), ManagerError> {
        if self.job_id.trim().is_empty() {
            return Err(ManagerError::Config("job_id must not be empty".into()));
        }
        if self.endpoint_url.trim().is_empty() {
            return Err(ManagerError::Config(format!(
                "endpoint_url must not be empty (job {})",
                self.job_id
            )));
        }
        Ok(())
    }

    /// The effective connection mode.
    pub fn connection_mode(&self) -> Result<ConnectionMode, ManagerError> {
        match self.mode {
            Some(mode) => Ok(mode),
            None => ConnectionMode::from_endpoint_url(&self.endpoint_url),
        }
    }

    /// Label used in logs: the endpoint name, or the URL when unnamed.
    pub fn endpoint_label(&self) -> &str {
        if self.endpoint_name.is_empty() {
            &self.endpoint_url
        } else {
            &self.endpoint_name
        }
    }

    /// Build the manager construction tuple.
    ///
    /// Without explicit topics the scope targets oracle requests and a job id
    /// matcher is attached.
    pub fn manager_config(&self) -> Result<ManagerConfig, ManagerError> {
        self.validate()?;
        let mode = self.connection_mode()?;
        let cursor: Cursor = self.from.parse()?;

        let config = if self.topics.is_empty() {
            ManagerConfig::new(
                FilterScope::oracle_requests(self.addresses.clone()),
                mode,
                self.endpoint_label(),
                &self.job_id,
            )
            .with_job_matcher(JobIdMatcher::new(&self.job_id, self.accept_mock_job_id))
        } else {
            ManagerConfig::new(
                FilterScope::new(self.addresses.clone(), self.topics.clone()),
                mode,
                self.endpoint_label(),
                &self.job_id,
            )
        };
        Ok(config.with_cursor(cursor))
    }
}
