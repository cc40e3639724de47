//! Event normalizer — raw log batches to job-run requests.
//!
//! Push and pull deliveries are unwrapped by the chain manager into a plain
//! list of raw log objects; this module is the single place that turns such
//! a list into [`JobRunRequest`]s and moves the cursor.
//!
//! Logs flagged `removed` by a reorg are dropped as if they never existed.
//! The cursor is not rewound to re-query the invalidated range, so events
//! re-included in a block the cursor already passed are not re-delivered.

use num_bigint::BigUint;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cursor::Cursor;
use crate::error::ManagerError;
use crate::job::JobRunRequest;

/// Chain-specific knowledge the normalizer needs about a raw log.
pub trait LogTranslator {
    /// The chain's raw log shape.
    type Log: DeserializeOwned;

    /// Returns `true` if the log was invalidated by a reorg.
    fn is_removed(&self, log: &Self::Log) -> bool;

    /// The block (or epoch) the log was included in.
    fn block_number(&self, log: &Self::Log) -> Result<BigUint, ManagerError>;

    /// Build the job-run request for a live log.
    ///
    /// `Ok(None)` means the log is well formed but not addressed to this
    /// subscription: it still counts as observed for the cursor.
    fn translate(&self, log: &Self::Log) -> Result<Option<JobRunRequest>, ManagerError>;
}

/// Outcome of normalizing one batch.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    /// Requests for live logs, in batch order.
    pub requests: Vec<JobRunRequest>,
    /// Entries dropped because they were marked removed.
    pub removed: usize,
    /// Entries dropped because they could not be parsed or translated.
    pub malformed: usize,
    /// Live entries addressed to another subscription.
    pub unmatched: usize,
}

/// Normalize `entries` in order, advancing `cursor` past every live log.
///
/// A malformed entry is skipped without affecting the rest of the batch.
pub fn normalize_batch<T: LogTranslator>(
    translator: &T,
    entries: Vec<Value>,
    cursor: &mut Cursor,
) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for (index, entry) in entries.into_iter().enumerate() {
        let log: T::Log = match serde_json::from_value(entry) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unparsable log entry");
                batch.malformed += 1;
                continue;
            }
        };

        if translator.is_removed(&log) {
            tracing::debug!(index, "skipping removed log");
            batch.removed += 1;
            continue;
        }

        let block = match translator.block_number(&log) {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping log with bad block number");
                batch.malformed += 1;
                continue;
            }
        };

        match translator.translate(&log) {
            Ok(Some(request)) => batch.requests.push(request),
            Ok(None) => batch.unmatched += 1,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping log that failed to translate");
                batch.malformed += 1;
                continue;
            }
        }

        if cursor.advance(&block) {
            tracing::debug!(cursor = %cursor, "cursor advanced");
        }
    }

    batch
}
