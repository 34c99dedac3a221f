//! Tracing setup for the CLI.
//!
//! Everything is written to stderr; stdout is reserved for the JSON report. `RUST_LOG` overrides
//! the configured level. A Prometheus listener is only installed when enabled in config.

mod config;

use std::io::{self, IsTerminal};

pub(crate) use config::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub(crate) fn initialize(logger_config: &LoggerConfig, telemetry_config: &TelemetryConfig) {
    let filter = env_filter(&logger_config.level);

    let layer = match logger_config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_target(false)
            .compact()
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(io::stderr)
            .json()
            .flatten_event(true)
            .boxed(),
    };

    // A subscriber may already be set when the crate is embedded in a test harness.
    if tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("Global subscriber already installed");
    }

    if telemetry_config.metrics.enabled {
        install_prometheus(&telemetry_config.metrics);
    }
}

fn env_filter(configured: &str) -> EnvFilter {
    filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), configured)
}

fn filter_from(env: Option<&str>, configured: &str) -> EnvFilter {
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| {
            eprintln!("invalid log level {configured:?}; falling back to info");
            EnvFilter::new("info")
        })
}

fn install_prometheus(metrics_config: &TelemetryMetricsConfig) {
    let bind_address = metrics_config.bind_address;
    match PrometheusBuilder::new()
        .with_http_listener(bind_address)
        .install()
    {
        Ok(()) => tracing::info!(%bind_address, "Prometheus exporter listening"),
        Err(error) => tracing::warn!(
            %bind_address,
            error = %error,
            "Prometheus exporter unavailable; continuing without metrics"
        ),
    }
}
