use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_resolver_search(
    chain: &str,
    strategy: &str,
    status: &str,
    duration: Duration,
    messages: usize,
) {
    counter!(
        "scout_resolver_searches_total",
        "chain" => chain.to_string(),
        "strategy" => strategy.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "scout_resolver_search_duration_seconds",
        "chain" => chain.to_string(),
        "strategy" => strategy.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
    histogram!(
        "scout_resolver_search_messages",
        "chain" => chain.to_string(),
        "strategy" => strategy.to_string()
    )
    .record(messages as f64);
}

pub fn record_decode_failure(chain: &str, event: &str) {
    counter!(
        "scout_resolver_decode_failures_total",
        "chain" => chain.to_string(),
        "event" => event.to_string()
    )
    .increment(1);
}
