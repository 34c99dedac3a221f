use std::collections::BTreeMap;

use scout_chain::{ChainMetadata, ChainMetadataRaw, SourceSettings};
use scout_domain::ChainName;
use serde::{Deserialize, Serialize};

use crate::{
    config::ConfigError,
    logger::{LoggerConfig, TelemetryConfig},
};

/// Resolver tuning.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ResolverConfig {
    /// Blocks searched back from the chain head when no `--from-block` is given.
    pub default_block_window: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigRaw {
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
    pub explorer: SourceSettings,
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub chains: BTreeMap<String, ChainMetadataRaw>,
}

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub logger: LoggerConfig,
    pub telemetry: TelemetryConfig,
    pub explorer: SourceSettings,
    pub resolver: ResolverConfig,
    pub chains: Vec<ChainMetadata>,
}

impl ConfigRaw {
    pub(crate) fn resolve(self) -> Result<Config, ConfigError> {
        if self.resolver.default_block_window == 0 {
            return Err(ConfigError::InvalidConfig(
                "resolver.default_block_window must be greater than 0".to_string(),
            ));
        }
        if self.explorer.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "explorer.request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        let mut chains = Vec::with_capacity(self.chains.len());
        for (name, raw) in self.chains {
            let name = ChainName::new(&name);
            if chains
                .iter()
                .any(|chain: &ChainMetadata| chain.name == name)
            {
                return Err(ConfigError::InvalidConfig(format!(
                    "chain '{}' is configured more than once",
                    name
                )));
            }
            chains.push(raw.resolve(name)?);
        }

        Ok(Config {
            logger: self.logger,
            telemetry: self.telemetry,
            explorer: self.explorer,
            resolver: self.resolver,
            chains,
        })
    }
}
