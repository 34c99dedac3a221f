use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_source_call(
    chain: &str,
    source_kind: &str,
    method: &str,
    status: &str,
    duration: Duration,
) {
    counter!(
        "scout_source_calls_total",
        "chain" => chain.to_string(),
        "source_kind" => source_kind.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "scout_source_call_duration_seconds",
        "chain" => chain.to_string(),
        "source_kind" => source_kind.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

/// One source failure absorbed by fallback, whether or not a later source answered.
pub fn record_source_failure(chain: &str, source_kind: &str, method: &str, transient: bool) {
    counter!(
        "scout_source_failures_total",
        "chain" => chain.to_string(),
        "source_kind" => source_kind.to_string(),
        "method" => method.to_string(),
        "transient" => transient.to_string()
    )
    .increment(1);
}

pub fn record_providers_exhausted(chain: &str, method: &str, attempts: usize) {
    counter!(
        "scout_providers_exhausted_total",
        "chain" => chain.to_string(),
        "method" => method.to_string()
    )
    .increment(1);
    histogram!(
        "scout_providers_exhausted_attempts",
        "chain" => chain.to_string(),
        "method" => method.to_string()
    )
    .record(attempts as f64);
}

pub fn record_log_chunk(
    host: &str,
    status: &str,
    duration: Duration,
    block_span: u64,
    logs: usize,
) {
    counter!(
        "scout_log_chunks_total",
        "host" => host.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "scout_log_chunk_duration_seconds",
        "host" => host.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
    histogram!(
        "scout_log_chunk_blocks",
        "host" => host.to_string(),
        "status" => status.to_string()
    )
    .record(block_span as f64);
    histogram!(
        "scout_log_chunk_events",
        "host" => host.to_string(),
        "status" => status.to_string()
    )
    .record(logs as f64);
}

pub fn record_explorer_throttle_wait(host: &str, wait: Duration) {
    counter!("scout_explorer_throttled_total", "host" => host.to_string()).increment(1);
    histogram!(
        "scout_explorer_throttle_wait_seconds",
        "host" => host.to_string()
    )
    .record(wait.as_secs_f64());
}
