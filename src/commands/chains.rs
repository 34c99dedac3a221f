use scout_chain::{Address, ChainMetadata, ExplorerFamily};
use scout_domain::{ChainName, DomainId};
use serde::Serialize;

use super::CommandOutput;
use crate::{config::Config, error::AppError};

/// Public view of a configured chain. Urls are reduced to hosts so api keys never leak.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChainSummary {
    name: ChainName,
    display_name: String,
    chain_id: u64,
    domain_id: DomainId,
    mailbox: Address,
    is_testnet: bool,
    rpc_hosts: Vec<String>,
    explorers: Vec<ExplorerSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerSummary {
    host: String,
    family: ExplorerFamily,
    keyed: bool,
}

impl From<&ChainMetadata> for ChainSummary {
    fn from(metadata: &ChainMetadata) -> Self {
        Self {
            name: metadata.name.clone(),
            display_name: metadata.display_name.clone(),
            chain_id: metadata.chain_id,
            domain_id: metadata.domain_id,
            mailbox: metadata.mailbox,
            is_testnet: metadata.is_testnet,
            rpc_hosts: metadata
                .rpc_urls
                .iter()
                .map(|endpoint| endpoint.url.host_str().unwrap_or_default().to_string())
                .collect(),
            explorers: metadata
                .block_explorers
                .iter()
                .map(|explorer| ExplorerSummary {
                    host: explorer.api_url.host_str().unwrap_or_default().to_string(),
                    family: explorer.family,
                    keyed: explorer.api_key.is_some(),
                })
                .collect(),
        }
    }
}

pub(super) fn list(config: &Config) -> Result<CommandOutput, AppError> {
    let summaries: Vec<ChainSummary> = config.chains.iter().map(ChainSummary::from).collect();
    CommandOutput::json(&summaries, !summaries.is_empty())
}
