//! EVM log → job-run request translation.

use num_bigint::BigUint;
use serde_json::Value;

use chaintrigger_core::cursor::encode_quantity;
use chaintrigger_core::error::ManagerError;
use chaintrigger_core::job::{JobIdMatcher, JobRunRequest};
use chaintrigger_core::normalizer::LogTranslator;
use chaintrigger_core::scope::{FilterScope, ORACLE_REQUEST_TOPIC};

use crate::chain::Chain;
use crate::log::RawLog;
use crate::oracle::{decode_oracle_request, job_id_from_topic};

/// Translates [`RawLog`]s for one subscription.
#[derive(Debug, Clone)]
pub struct EvmLogTranslator {
    chain: Chain,
    scope: FilterScope,
    job_matcher: Option<JobIdMatcher>,
}

impl EvmLogTranslator {
    pub fn new(chain: Chain, scope: FilterScope, job_matcher: Option<JobIdMatcher>) -> Self {
        Self {
            chain,
            scope,
            job_matcher,
        }
    }

    /// Check the job id in topic 1 against the matcher.
    ///
    /// Returns the job id on a match, `Ok(None)` when the log belongs to a
    /// different job.
    fn matched_job_id(&self, log: &RawLog) -> Result<Option<String>, ManagerError> {
        let Some(matcher) = &self.job_matcher else {
            return Ok(None);
        };
        let topic = log
            .topics
            .get(1)
            .ok_or_else(|| ManagerError::Decode("job-scoped log has no job id topic".into()))?;
        let job_id = job_id_from_topic(topic)?;
        if matcher.matches(&job_id) {
            Ok(Some(job_id))
        } else {
            tracing::debug!(
                expected = matcher.expected(),
                actual = %job_id,
                "log addressed to another job"
            );
            Ok(None)
        }
    }
}

impl LogTranslator for EvmLogTranslator {
    type Log = RawLog;

    fn is_removed(&self, log: &RawLog) -> bool {
        log.is_removed()
    }

    fn block_number(&self, log: &RawLog) -> Result<BigUint, ManagerError> {
        log.block_number()
    }

    fn translate(&self, log: &RawLog) -> Result<Option<JobRunRequest>, ManagerError> {
        if !self.scope.matches_address(&log.address) {
            tracing::debug!(address = %log.address, "log from contract outside scope");
            return Ok(None);
        }
        let job_id = match (&self.job_matcher, self.matched_job_id(log)?) {
            (Some(_), None) => return Ok(None),
            (_, job_id) => job_id,
        };

        let mut request = JobRunRequest::new();
        request.insert("chain", self.chain.name());
        request.insert("address", log.address.to_ascii_lowercase());
        request.insert("blockNumber", encode_quantity(&log.block_number()?));
        if let Some(hash) = &log.block_hash {
            request.insert("blockHash", hash.clone());
        }
        if let Some(hash) = &log.tx_hash {
            request.insert("transactionHash", hash.clone());
        }
        if let Some(index) = &log.log_index {
            request.insert("logIndex", index.clone());
        }
        request.insert(
            "topics",
            Value::Array(log.topics.iter().cloned().map(Value::String).collect()),
        );
        request.insert("data", log.data.clone());
        if let Some(job_id) = job_id {
            request.insert("jobId", job_id);
        }

        if log
            .topic0()
            .is_some_and(|t| t.eq_ignore_ascii_case(ORACLE_REQUEST_TOPIC))
        {
            let oracle = decode_oracle_request(&log.data)?;
            request.insert("requester", oracle.requester);
            request.insert("requestId", oracle.request_id);
            request.insert("payment", oracle.payment.to_string());
            request.insert("callbackAddress", oracle.callback_address);
            request.insert("callbackFunctionId", oracle.callback_function_id);
            request.insert("expiration", oracle.cancel_expiration.to_string());
            request.insert("dataVersion", oracle.data_version.to_string());
            request.insert("requestData", oracle.request_data);
        }

        Ok(Some(request))
    }
}
