use std::{fmt, sync::Arc};

use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256, Bytes, U256},
    rpc::types::{Block, Log, Transaction, TransactionReceipt, TransactionRequest},
};
use scout_domain::ChainName;

use crate::{
    CapabilitySet, ChainDataSource, ChainMetadata, ChainRequest, ChainResponse,
    ExplorerRateLimiter, ExplorerSource, JsonRpcSource, LogFilter, Method, ProviderError,
    SourceError, SourceFailure, SourceSettings,
};

/// Static identity of the chain a [`MultiProvider`] serves.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NetworkInfo {
    name: ChainName,
    chain_id: u64,
}

/// A successful [`MultiProvider::perform_traced`] call.
#[derive(Debug)]
pub struct Served {
    pub response: ChainResponse,
    /// Label of the source that answered.
    pub source: String,
    /// Failures of the sources tried before it, in try order.
    pub absorbed: Vec<SourceFailure>,
}

/// Chain-data provider that routes each request over an ordered list of sources.
///
/// Sources are tried strictly one after another; the first success wins. Failures are logged,
/// collected and attached to [`ProviderError::AllProvidersFailed`] once every capable source
/// has been tried.
pub struct MultiProvider {
    network: NetworkInfo,
    sources: Vec<Arc<dyn ChainDataSource>>,
    capabilities: CapabilitySet,
}

impl MultiProvider {
    /// Builds explorer sources first, then RPC sources, each in configuration order.
    pub fn new(
        metadata: &ChainMetadata,
        explorer_limiter: ExplorerRateLimiter,
        settings: &SourceSettings,
    ) -> Result<Self, ProviderError> {
        let mut sources: Vec<Arc<dyn ChainDataSource>> = Vec::new();

        for explorer in &metadata.block_explorers {
            let source = ExplorerSource::new(
                metadata.name.clone(),
                explorer,
                explorer_limiter.clone(),
                settings.request_timeout(),
            )
            .map_err(|e| ProviderError::SourceInit(e.to_string()))?;
            if source.capabilities().is_empty() {
                tracing::debug!(
                    chain = %metadata.name,
                    source = source.label(),
                    "Explorer family has no supported methods; source kept for ordering only"
                );
            }
            sources.push(Arc::new(source));
        }
        for endpoint in &metadata.rpc_urls {
            let source =
                JsonRpcSource::new(metadata.name.clone(), endpoint, settings.request_timeout())
                    .map_err(|e| ProviderError::SourceInit(e.to_string()))?;
            sources.push(Arc::new(source));
        }

        let provider = Self::with_network(
            NetworkInfo {
                name: metadata.name.clone(),
                chain_id: metadata.chain_id,
            },
            sources,
        )?;

        tracing::info!(
            chain = %provider.network.name,
            chain_id = provider.network.chain_id,
            sources = ?provider.source_labels(),
            "Multi-source provider initialized"
        );
        Ok(provider)
    }

    /// Assembles a provider from already constructed sources, preserving their order.
    pub fn from_sources(
        name: ChainName,
        chain_id: u64,
        sources: Vec<Arc<dyn ChainDataSource>>,
    ) -> Result<Self, ProviderError> {
        Self::with_network(NetworkInfo { name, chain_id }, sources)
    }

    fn with_network(
        network: NetworkInfo,
        sources: Vec<Arc<dyn ChainDataSource>>,
    ) -> Result<Self, ProviderError> {
        if sources.is_empty() {
            return Err(ProviderError::NoSourceConfigured {
                chain: network.name,
            });
        }
        let capabilities = sources.iter().fold(CapabilitySet::empty(), |acc, source| {
            acc.union(source.capabilities())
        });

        Ok(Self {
            network,
            sources,
            capabilities,
        })
    }

    /// Configured chain name.
    pub fn name(&self) -> &ChainName {
        &self.network.name
    }

    /// Configured chain id. Never queried from a source.
    pub fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    /// Union of every source's capability set.
    pub fn supported_methods(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Source labels in try order.
    pub fn source_labels(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.label()).collect()
    }

    /// Executes `request` against the first source that answers it successfully.
    pub async fn perform(&self, request: &ChainRequest) -> Result<ChainResponse, ProviderError> {
        self.perform_traced(request).await.map(|served| served.response)
    }

    /// Like [`Self::perform`], but also returns which source answered and the failures absorbed
    /// on the way there.
    pub async fn perform_traced(&self, request: &ChainRequest) -> Result<Served, ProviderError> {
        let method = request.method();
        if !self.capabilities.contains(method) {
            return Err(ProviderError::UnsupportedMethod {
                chain: self.network.name.clone(),
                method,
            });
        }

        let mut failures = Vec::new();
        for source in self.sources.iter().filter(|source| source.supports(method)) {
            let result = source
                .perform(request)
                .await
                .and_then(|response| match response.method() {
                    got if got == method => Ok(response),
                    got => Err(SourceError::MismatchedResponse {
                        expected: method,
                        got,
                    }),
                });

            match result {
                Ok(response) => {
                    if !failures.is_empty() {
                        tracing::debug!(
                            chain = %self.network.name,
                            source = source.label(),
                            %method,
                            failed_before = failures.len(),
                            "Request served after fallback"
                        );
                    }
                    return Ok(Served {
                        response,
                        source: source.label().to_string(),
                        absorbed: failures,
                    });
                }
                Err(error) => {
                    tracing::warn!(
                        chain = %self.network.name,
                        source = source.label(),
                        kind = source.kind().as_str(),
                        %method,
                        error = %error,
                        "Source failed; falling back to next source"
                    );
                    scout_observability::record_source_failure(
                        self.network.name.as_str(),
                        source.kind().as_str(),
                        method.as_str(),
                        error.is_transient(),
                    );
                    failures.push(SourceFailure {
                        source: source.label().to_string(),
                        error,
                    });
                }
            }
        }

        tracing::error!(
            chain = %self.network.name,
            %method,
            attempts = failures.len(),
            "All sources failed"
        );
        scout_observability::record_providers_exhausted(
            self.network.name.as_str(),
            method.as_str(),
            failures.len(),
        );
        Err(ProviderError::AllProvidersFailed {
            chain: self.network.name.clone(),
            method,
            failures,
        })
    }

    /// Current head block number.
    pub async fn get_block_number(&self) -> Result<u64, ProviderError> {
        match self.perform(&ChainRequest::GetBlockNumber).await? {
            ChainResponse::BlockNumber(number) => Ok(number),
            other => Err(self.mismatch(Method::GetBlockNumber, &other)),
        }
    }

    /// Block header and transaction hashes at `block`.
    pub async fn get_block(&self, block: BlockNumberOrTag) -> Result<Block, ProviderError> {
        match self.perform(&ChainRequest::GetBlock { block }).await? {
            ChainResponse::Block(block) => Ok(*block),
            other => Err(self.mismatch(Method::GetBlock, &other)),
        }
    }

    /// Native balance of `address` at `block`.
    pub async fn get_balance(
        &self,
        address: Address,
        block: BlockNumberOrTag,
    ) -> Result<U256, ProviderError> {
        match self
            .perform(&ChainRequest::GetBalance { address, block })
            .await?
        {
            ChainResponse::Balance(balance) => Ok(balance),
            other => Err(self.mismatch(Method::GetBalance, &other)),
        }
    }

    /// Deployed bytecode of `address`; empty for accounts.
    pub async fn get_code(
        &self,
        address: Address,
        block: BlockNumberOrTag,
    ) -> Result<Bytes, ProviderError> {
        match self.perform(&ChainRequest::GetCode { address, block }).await? {
            ChainResponse::Code(code) => Ok(code),
            other => Err(self.mismatch(Method::GetCode, &other)),
        }
    }

    /// Raw storage slot value.
    pub async fn get_storage_at(
        &self,
        address: Address,
        slot: U256,
        block: BlockNumberOrTag,
    ) -> Result<U256, ProviderError> {
        match self
            .perform(&ChainRequest::GetStorageAt {
                address,
                slot,
                block,
            })
            .await?
        {
            ChainResponse::Storage(value) => Ok(value),
            other => Err(self.mismatch(Method::GetStorageAt, &other)),
        }
    }

    /// Transaction by hash. An unknown hash is an absorbed `EmptyResult` failure.
    pub async fn get_transaction(&self, hash: B256) -> Result<Transaction, ProviderError> {
        match self.perform(&ChainRequest::GetTransaction { hash }).await? {
            ChainResponse::Transaction(tx) => Ok(*tx),
            other => Err(self.mismatch(Method::GetTransaction, &other)),
        }
    }

    /// Nonce of `address` at `block`.
    pub async fn get_transaction_count(
        &self,
        address: Address,
        block: BlockNumberOrTag,
    ) -> Result<u64, ProviderError> {
        match self
            .perform(&ChainRequest::GetTransactionCount { address, block })
            .await?
        {
            ChainResponse::TransactionCount(count) => Ok(count),
            other => Err(self.mismatch(Method::GetTransactionCount, &other)),
        }
    }

    /// Receipt by transaction hash, including its logs.
    pub async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<TransactionReceipt, ProviderError> {
        match self
            .perform(&ChainRequest::GetTransactionReceipt { hash })
            .await?
        {
            ChainResponse::Receipt(receipt) => Ok(*receipt),
            other => Err(self.mismatch(Method::GetTransactionReceipt, &other)),
        }
    }

    /// Logs matching `filter`, block-ascending. RPC sources may split the query into chunks.
    pub async fn get_logs(&self, filter: LogFilter) -> Result<Vec<Log>, ProviderError> {
        match self.perform(&ChainRequest::GetLogs(filter)).await? {
            ChainResponse::Logs(logs) => Ok(logs),
            other => Err(self.mismatch(Method::GetLogs, &other)),
        }
    }

    /// Current gas price in wei.
    pub async fn get_gas_price(&self) -> Result<u128, ProviderError> {
        match self.perform(&ChainRequest::GetGasPrice).await? {
            ChainResponse::GasPrice(price) => Ok(price),
            other => Err(self.mismatch(Method::GetGasPrice, &other)),
        }
    }

    /// Read-only `eth_call`. Only RPC sources serve this.
    pub async fn call(
        &self,
        tx: TransactionRequest,
        block: BlockNumberOrTag,
    ) -> Result<Bytes, ProviderError> {
        match self
            .perform(&ChainRequest::Call {
                tx: Box::new(tx),
                block,
            })
            .await?
        {
            ChainResponse::CallResult(output) => Ok(output),
            other => Err(self.mismatch(Method::Call, &other)),
        }
    }

    /// Gas estimate for `tx`.
    pub async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64, ProviderError> {
        match self
            .perform(&ChainRequest::EstimateGas { tx: Box::new(tx) })
            .await?
        {
            ChainResponse::GasEstimate(gas) => Ok(gas),
            other => Err(self.mismatch(Method::EstimateGas, &other)),
        }
    }

    /// Broadcasts a signed transaction and returns its hash.
    pub async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ProviderError> {
        match self.perform(&ChainRequest::SendTransaction { raw }).await? {
            ChainResponse::TransactionHash(hash) => Ok(hash),
            other => Err(self.mismatch(Method::SendTransaction, &other)),
        }
    }

    // `perform` already rejects mismatched responses; this only keeps the wrappers total.
    fn mismatch(&self, method: Method, response: &ChainResponse) -> ProviderError {
        ProviderError::AllProvidersFailed {
            chain: self.network.name.clone(),
            method,
            failures: vec![SourceFailure {
                source: "multi_provider".to_string(),
                error: SourceError::MismatchedResponse {
                    expected: method,
                    got: response.method(),
                },
            }],
        }
    }
}

impl fmt::Debug for MultiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiProvider")
            .field("network", &self.network)
            .field("sources", &self.source_labels())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}
