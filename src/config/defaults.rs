//! Typed default configuration.
//!
//! Every setting except the chain list has a default here, so a config file only needs its
//! `[chains.<name>]` tables.

use std::{collections::BTreeMap, net::SocketAddr};

use scout_chain::SourceSettings;
use scout_resolver::DEFAULT_BLOCK_WINDOW;

use super::{ConfigRaw, ResolverConfig};
use crate::logger::{LogFormat, LoggerConfig, TelemetryConfig, TelemetryMetricsConfig};

pub(crate) fn config() -> ConfigRaw {
    ConfigRaw {
        logger: LoggerConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
        telemetry: TelemetryConfig {
            metrics: TelemetryMetricsConfig {
                enabled: false,
                bind_address: SocketAddr::from(([127, 0, 0, 1], 9464)),
            },
        },
        explorer: SourceSettings::default(),
        resolver: ResolverConfig {
            default_block_window: DEFAULT_BLOCK_WINDOW,
        },
        chains: BTreeMap::new(),
    }
}
