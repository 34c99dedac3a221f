use std::time::Duration;

use alloy::primitives::Address;
use scout_domain::{ChainName, DomainId};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

/// Default spacing between requests to the same keyless explorer host.
pub const DEFAULT_EXPLORER_THROTTLE_MS: u64 = 6_000;
/// Default transport timeout for explorer and RPC HTTP requests.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Block-range limits an RPC node enforces on `eth_getLogs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcPagination {
    /// Largest span (in blocks) a single `eth_getLogs` may cover.
    pub max_block_range: Option<u64>,
    /// Oldest block the node still serves (pruned nodes).
    pub min_block_number: Option<u64>,
}

impl RpcPagination {
    pub fn is_unlimited(&self) -> bool {
        self.max_block_range.is_none() && self.min_block_number.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcEndpointRaw {
    pub http: String,
    #[serde(default)]
    pub pagination: Option<RpcPagination>,
    /// Maximum requests per second to this endpoint. Common values: 25 (free tier),
    /// 50-100 (paid tier), unset (unlimited).
    #[serde(default)]
    pub max_requests_per_second: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplorerFamily {
    Etherscan,
    Blockscout,
    Routescan,
    Other,
}

impl ExplorerFamily {
    /// Whether the explorer speaks the etherscan-compatible `module`/`action` API.
    pub fn is_etherscan_compatible(&self) -> bool {
        !matches!(self, ExplorerFamily::Other)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockExplorerRaw {
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub family: ExplorerFamily,
}

/// Chain entry as read from configuration, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainMetadataRaw {
    pub chain_id: u64,
    pub domain_id: DomainId,
    #[serde(default)]
    pub display_name: Option<String>,
    pub mailbox: String,
    #[serde(default)]
    pub is_testnet: bool,
    #[serde(default)]
    pub rpc_urls: Vec<RpcEndpointRaw>,
    #[serde(default)]
    pub block_explorers: Vec<BlockExplorerRaw>,
}

impl ChainMetadataRaw {
    /// Ensures the chain has at least one data source.
    pub fn ensure_sources(&self, name: &ChainName) -> Result<(), ConfigError> {
        if self.rpc_urls.is_empty() && self.block_explorers.is_empty() {
            return Err(ConfigError::InvalidConfig(format!(
                "chain '{}' must include at least one rpc url or block explorer",
                name
            )));
        }
        Ok(())
    }

    /// Ensures pagination and rate limits, if configured, are greater than zero.
    pub fn ensure_positive_limits(&self, name: &ChainName) -> Result<(), ConfigError> {
        for endpoint in &self.rpc_urls {
            let zero_range = endpoint
                .pagination
                .is_some_and(|pagination| pagination.max_block_range == Some(0));
            if zero_range {
                return Err(ConfigError::InvalidConfig(format!(
                    "chain '{}': max_block_range must be greater than 0 when set ({})",
                    name, endpoint.http
                )));
            }
            if endpoint.max_requests_per_second == Some(0) {
                return Err(ConfigError::InvalidConfig(format!(
                    "chain '{}': max_requests_per_second must be greater than 0 when set ({})",
                    name, endpoint.http
                )));
            }
        }
        Ok(())
    }

    pub fn resolve(self, name: ChainName) -> Result<ChainMetadata, ConfigError> {
        self.ensure_sources(&name)?;
        self.ensure_positive_limits(&name)?;

        let mailbox = self.mailbox.parse::<Address>().map_err(|e| {
            ConfigError::InvalidConfig(format!(
                "chain '{}': invalid mailbox address '{}': {}",
                name, self.mailbox, e
            ))
        })?;

        let rpc_urls = self
            .rpc_urls
            .into_iter()
            .map(|endpoint| {
                Ok(RpcEndpoint {
                    url: parse_url(&name, &endpoint.http)?,
                    pagination: endpoint.pagination.filter(|p| !p.is_unlimited()),
                    max_requests_per_second: endpoint.max_requests_per_second,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let block_explorers = self
            .block_explorers
            .into_iter()
            .map(|explorer| {
                Ok(BlockExplorer {
                    api_url: parse_url(&name, &explorer.api_url)?,
                    api_key: explorer.api_key.filter(|key| !key.trim().is_empty()),
                    family: explorer.family,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(ChainMetadata {
            display_name: self.display_name.unwrap_or_else(|| name.to_string()),
            name,
            chain_id: self.chain_id,
            domain_id: self.domain_id,
            mailbox,
            is_testnet: self.is_testnet,
            rpc_urls,
            block_explorers,
        })
    }
}

fn parse_url(chain: &ChainName, value: &str) -> Result<Url, ConfigError> {
    value.parse::<Url>().map_err(|e| {
        ConfigError::InvalidConfig(format!("chain '{}': invalid url '{}': {}", chain, value, e))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub url: Url,
    pub pagination: Option<RpcPagination>,
    pub max_requests_per_second: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockExplorer {
    pub api_url: Url,
    pub api_key: Option<String>,
    pub family: ExplorerFamily,
}

/// Validated chain configuration. Immutable for the lifetime of the providers built from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMetadata {
    pub name: ChainName,
    pub chain_id: u64,
    pub domain_id: DomainId,
    pub display_name: String,
    pub mailbox: Address,
    pub is_testnet: bool,
    pub rpc_urls: Vec<RpcEndpoint>,
    pub block_explorers: Vec<BlockExplorer>,
}

impl ChainMetadata {
    pub fn mailbox(&self) -> Address {
        self.mailbox
    }
}

/// Transport settings shared by every source built from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSettings {
    /// Minimum spacing between requests to one keyless explorer host, in milliseconds.
    pub throttle_window_ms: u64,
    /// HTTP timeout for explorer requests, in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            throttle_window_ms: DEFAULT_EXPLORER_THROTTLE_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl SourceSettings {
    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
