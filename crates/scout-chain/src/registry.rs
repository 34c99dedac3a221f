use std::{collections::BTreeMap, sync::Arc};

use dashmap::DashMap;
use scout_domain::{ChainName, DomainId};

use crate::{ChainMetadata, ExplorerRateLimiter, MultiProvider, ProviderError, SourceSettings};

/// Per-chain provider cache.
///
/// A [`MultiProvider`] is built the first time its chain is requested and reused afterwards.
/// Every provider shares one [`ExplorerRateLimiter`], so keyless explorer hosts are throttled
/// across chains.
#[derive(Debug)]
pub struct ProviderRegistry {
    chains: BTreeMap<ChainName, ChainMetadata>,
    providers: DashMap<ChainName, Arc<MultiProvider>>,
    limiter: ExplorerRateLimiter,
    settings: SourceSettings,
}

impl ProviderRegistry {
    pub fn new(chains: impl IntoIterator<Item = ChainMetadata>, settings: SourceSettings) -> Self {
        let chains = chains
            .into_iter()
            .map(|metadata| (metadata.name.clone(), metadata))
            .collect();
        Self {
            chains,
            providers: DashMap::new(),
            limiter: ExplorerRateLimiter::new(settings.throttle_window()),
            settings,
        }
    }

    /// Configured chain names, sorted.
    pub fn chains(&self) -> impl Iterator<Item = &ChainName> {
        self.chains.keys()
    }

    pub fn metadata(&self, chain: &ChainName) -> Option<&ChainMetadata> {
        self.chains.get(chain)
    }

    pub fn metadata_by_domain(&self, domain: DomainId) -> Option<&ChainMetadata> {
        self.chains
            .values()
            .find(|metadata| metadata.domain_id == domain)
    }

    /// Returns the cached provider for `chain`, building it on first use.
    pub fn provider(&self, chain: &ChainName) -> Result<Arc<MultiProvider>, ProviderError> {
        if let Some(provider) = self.providers.get(chain) {
            return Ok(Arc::clone(provider.value()));
        }

        let metadata = self
            .chains
            .get(chain)
            .ok_or_else(|| ProviderError::UnknownChain {
                chain: chain.clone(),
            })?;
        let provider = Arc::new(MultiProvider::new(
            metadata,
            self.limiter.clone(),
            &self.settings,
        )?);

        // A concurrent caller may have won the race; keep whichever landed first.
        let entry = self
            .providers
            .entry(chain.clone())
            .or_insert(provider);
        Ok(Arc::clone(entry.value()))
    }

    pub fn cached_providers(&self) -> usize {
        self.providers.len()
    }
}
