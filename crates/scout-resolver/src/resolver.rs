use std::sync::Arc;

use alloy::primitives::B256;
use scout_chain::ProviderRegistry;
use scout_domain::{ChainName, DeliveryStatus, DispatchRecord};
use tokio_util::sync::CancellationToken;

use crate::{
    BlockWindow, ChainResolver, DEFAULT_BLOCK_WINDOW, MultiChainOutcome, QueryType,
    ResolverError, classify, search_chains,
};

/// Entry point for resolving identifiers over the chains of a [`ProviderRegistry`].
#[derive(Debug, Clone)]
pub struct MessageResolver {
    registry: Arc<ProviderRegistry>,
    default_window: u64,
}

impl MessageResolver {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            default_window: DEFAULT_BLOCK_WINDOW,
        }
    }

    pub fn with_default_window(mut self, blocks: u64) -> Self {
        self.default_window = blocks;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Resolver for one configured chain, using the mailbox from its metadata.
    pub fn chain_resolver(&self, chain: &ChainName) -> Result<ChainResolver, ResolverError> {
        let metadata =
            self.registry
                .metadata(chain)
                .ok_or_else(|| ResolverError::UnknownChain {
                    chain: chain.clone(),
                })?;
        let provider = self.registry.provider(chain)?;
        Ok(ChainResolver::new(provider, metadata.mailbox())
            .with_default_window(self.default_window))
    }

    /// Classifies `input` and searches `chains` (every configured chain when empty).
    ///
    /// Malformed input and unknown chains fail before any network call.
    pub async fn resolve(
        &self,
        input: &str,
        hint: Option<QueryType>,
        chains: &[ChainName],
        window: BlockWindow,
        cancel: &CancellationToken,
    ) -> Result<MultiChainOutcome, ResolverError> {
        let identifiers = classify(input, hint)?;

        let targets: Vec<ChainName> = if chains.is_empty() {
            self.registry.chains().cloned().collect()
        } else {
            chains.to_vec()
        };
        let resolvers = targets
            .iter()
            .map(|chain| self.chain_resolver(chain))
            .collect::<Result<Vec<_>, _>>()?;

        let interpretations: Vec<&str> = identifiers
            .iter()
            .map(|id| id.query_type().as_str())
            .collect();
        tracing::info!(
            input = input.trim(),
            ?interpretations,
            chains = ?targets.iter().map(ChainName::as_str).collect::<Vec<_>>(),
            "Resolving identifier"
        );
        Ok(search_chains(&resolvers, &identifiers, window, cancel).await)
    }

    /// Delivery status of `message_id` on `destination`.
    pub async fn delivery_status(
        &self,
        message_id: B256,
        destination: &ChainName,
        window: BlockWindow,
    ) -> Result<DeliveryStatus, ResolverError> {
        self.chain_resolver(destination)?
            .delivery_status(message_id, window)
            .await
    }

    /// Delivery status of a resolved message, looked up on the chain serving its destination
    /// domain.
    pub async fn delivery_for(
        &self,
        record: &DispatchRecord,
        window: BlockWindow,
    ) -> Result<DeliveryStatus, ResolverError> {
        let destination = self
            .registry
            .metadata_by_domain(record.destination_domain)
            .ok_or(ResolverError::UnknownDomain {
                domain: record.destination_domain,
            })?
            .name
            .clone();
        self.delivery_status(record.message_id, &destination, window)
            .await
    }
}
