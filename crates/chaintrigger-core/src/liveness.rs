//! Source liveness metrics.
//!
//! Every manager reports a "ping" whenever its endpoint delivers a response.
//! [`MetricsPingRecorder`] exports pings through the `metrics` facade; the
//! host process installs whichever exporter it uses (Prometheus, OTLP, ...).

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, gauge, Unit};

/// Responses received, labeled by `endpoint` and `job_id`.
pub const SOURCE_PINGS_TOTAL: &str = "chaintrigger_source_pings_total";
/// Unix time (seconds) of the latest response, labeled by `endpoint` and `job_id`.
pub const LAST_SOURCE_PING: &str = "chaintrigger_last_source_ping_unix";

/// Sink for per-subscription liveness pings.
pub trait SourcePingRecorder: Send + Sync {
    /// Record that `endpoint` delivered data for `job_id` just now.
    fn record_ping(&self, endpoint: &str, job_id: &str);
}

/// Records pings to the globally installed `metrics` recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsPingRecorder;

impl MetricsPingRecorder {
    pub fn new() -> Self {
        Self
    }

    /// Register descriptions for the ping metrics. Call once after the
    /// exporter is installed.
    pub fn describe() {
        describe_counter!(
            SOURCE_PINGS_TOTAL,
            Unit::Count,
            "Responses received from a chain endpoint"
        );
        describe_gauge!(
            LAST_SOURCE_PING,
            Unit::Seconds,
            "Unix time of the latest response from a chain endpoint"
        );
    }
}

impl SourcePingRecorder for MetricsPingRecorder {
    fn record_ping(&self, endpoint: &str, job_id: &str) {
        counter!(
            SOURCE_PINGS_TOTAL,
            "endpoint" => endpoint.to_string(),
            "job_id" => job_id.to_string()
        )
        .increment(1);
        gauge!(
            LAST_SOURCE_PING,
            "endpoint" => endpoint.to_string(),
            "job_id" => job_id.to_string()
        )
        .set(Utc::now().timestamp_millis() as f64 / 1000.0);
    }
}
