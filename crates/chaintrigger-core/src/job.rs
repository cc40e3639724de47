//! Job-run requests and job id matching.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Job id reported by test harnesses in place of a real one.
pub const MOCK_JOB_ID: &str = "mock";

/// Normalized trigger payload handed to the job execution pipeline.
///
/// The key set depends on the chain that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobRunRequest(Map<String, Value>);

impl JobRunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an alternating `[key, value, key, value, ...]` list.
    ///
    /// Empty entries are skipped, and a key without a following value is
    /// dropped.
    pub fn from_kv_pairs(items: &[String]) -> Self {
        let mut map = Map::new();
        let mut key: Option<&str> = None;
        for (i, item) in items.iter().enumerate() {
            if item.is_empty() {
                continue;
            }
            if i % 2 == 0 {
                key = Some(item.as_str());
            } else if let Some(k) = key.take() {
                map.insert(k.to_string(), Value::String(item.clone()));
            }
        }
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Copy every entry of `other` into `self`; `other` wins on conflicts.
    pub fn merge(mut self, other: JobRunRequest) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for JobRunRequest {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Decides whether a job id found on-chain belongs to this subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobIdMatcher {
    expected: String,
    accept_mock: bool,
}

impl JobIdMatcher {
    /// `accept_mock` also admits [`MOCK_JOB_ID`]; enable it only for test
    /// environments.
    pub fn new(expected: impl Into<String>, accept_mock: bool) -> Self {
        Self {
            expected: expected.into(),
            accept_mock,
        }
    }

    pub fn expected(&self) -> &str {
        &self.expected
    }

    pub fn matches(&self, actual: &str) -> bool {
        actual == self.expected || (self.accept_mock && actual == MOCK_JOB_ID)
    }
}
