mod chunking;

use std::time::{Duration, Instant};

use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::Log},
    transports::http::Http,
};
use async_trait::async_trait;
use scout_domain::ChainName;

use crate::{
    CapabilitySet, ChainDataSource, ChainRequest, ChainResponse, LogChunk, LogFilter,
    RpcEndpoint, RpcPagination, SourceError, SourceKind, rpc_rate_limiter::RpcRateLimiter,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC node source. Serves every method and transparently splits `eth_getLogs` queries
/// that exceed the node's pagination limits.
pub struct JsonRpcSource {
    chain: ChainName,
    provider: DynProvider,
    host: String,
    label: String,
    pagination: Option<RpcPagination>,
    rate_limiter: RpcRateLimiter,
}

impl JsonRpcSource {
    /// Builds the source over its own HTTP client so `request_timeout` bounds every call.
    pub fn new(
        chain: ChainName,
        endpoint: &RpcEndpoint,
        request_timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(request_timeout.min(CONNECT_TIMEOUT))
            .timeout(request_timeout)
            .build()?;
        let transport = Http::with_client(http, endpoint.url.clone());
        let client = RpcClient::builder().transport(transport, false);
        let provider = ProviderBuilder::new().connect_client(client).erased();

        // Only the host is logged: provider urls often embed api keys in the path.
        let host = endpoint.url.host_str().unwrap_or("unknown").to_string();
        let rate_limiter = RpcRateLimiter::new(endpoint.max_requests_per_second);
        if rate_limiter.is_limited() {
            tracing::info!(
                chain = %chain,
                host = %host,
                limiter = ?rate_limiter,
                "RPC rate limiting enabled"
            );
        }

        Ok(Self {
            label: format!("rpc:{host}"),
            chain,
            provider,
            host,
            pagination: endpoint.pagination,
            rate_limiter,
        })
    }

    async fn block_number(&self) -> Result<u64, SourceError> {
        self.rate_limiter.acquire(&self.host).await;
        Ok(self.provider.get_block_number().await?)
    }

    async fn logs_for_chunk(
        &self,
        filter: &LogFilter,
        chunk: LogChunk,
    ) -> Result<Vec<Log>, SourceError> {
        self.rate_limiter.acquire(&self.host).await;
        let started = Instant::now();
        let result = self.provider.get_logs(&filter.chunk_rpc_filter(chunk)).await;

        let (status, count) = match &result {
            Ok(logs) => ("ok", logs.len()),
            Err(_) => ("error", 0),
        };
        scout_observability::record_log_chunk(
            &self.host,
            status,
            started.elapsed(),
            chunk.span(),
            count,
        );
        Ok(result?)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, SourceError> {
        let Some(pagination) = self.pagination.filter(|p| !p.is_unlimited()) else {
            self.rate_limiter.acquire(&self.host).await;
            return Ok(self.provider.get_logs(&filter.to_rpc_filter()).await?);
        };

        chunking::fetch_chunked(
            filter,
            &pagination,
            || self.block_number(),
            |chunk| self.logs_for_chunk(filter, chunk),
        )
        .await
    }

    async fn dispatch(&self, request: &ChainRequest) -> Result<ChainResponse, SourceError> {
        if let ChainRequest::GetLogs(filter) = request {
            return self.get_logs(filter).await.map(ChainResponse::Logs);
        }

        self.rate_limiter.acquire(&self.host).await;
        let provider = &self.provider;
        let response = match request {
            ChainRequest::GetBlock { block } => ChainResponse::Block(Box::new(
                provider
                    .get_block_by_number(*block)
                    .await?
                    .ok_or(SourceError::EmptyResult)?,
            )),
            ChainRequest::GetBlockNumber => {
                ChainResponse::BlockNumber(provider.get_block_number().await?)
            }
            ChainRequest::GetBalance { address, block } => ChainResponse::Balance(
                provider
                    .get_balance(*address)
                    .block_id((*block).into())
                    .await?,
            ),
            ChainRequest::GetCode { address, block } => ChainResponse::Code(
                provider
                    .get_code_at(*address)
                    .block_id((*block).into())
                    .await?,
            ),
            ChainRequest::GetStorageAt {
                address,
                slot,
                block,
            } => ChainResponse::Storage(
                provider
                    .get_storage_at(*address, *slot)
                    .block_id((*block).into())
                    .await?,
            ),
            ChainRequest::GetTransaction { hash } => ChainResponse::Transaction(Box::new(
                provider
                    .get_transaction_by_hash(*hash)
                    .await?
                    .ok_or(SourceError::EmptyResult)?,
            )),
            ChainRequest::GetTransactionCount { address, block } => {
                ChainResponse::TransactionCount(
                    provider
                        .get_transaction_count(*address)
                        .block_id((*block).into())
                        .await?,
                )
            }
            ChainRequest::GetTransactionReceipt { hash } => ChainResponse::Receipt(Box::new(
                provider
                    .get_transaction_receipt(*hash)
                    .await?
                    .ok_or(SourceError::EmptyResult)?,
            )),
            ChainRequest::GetGasPrice => ChainResponse::GasPrice(provider.get_gas_price().await?),
            ChainRequest::Call { tx, block } => ChainResponse::CallResult(
                provider
                    .call(tx.as_ref().clone())
                    .block((*block).into())
                    .await?,
            ),
            ChainRequest::EstimateGas { tx } => {
                ChainResponse::GasEstimate(provider.estimate_gas(tx.as_ref().clone()).await?)
            }
            ChainRequest::SendTransaction { raw } => {
                let pending = provider.send_raw_transaction(raw).await?;
                ChainResponse::TransactionHash(*pending.tx_hash())
            }
            ChainRequest::GetLogs(_) => unreachable!("log queries are handled above"),
        };
        Ok(response)
    }
}

impl std::fmt::Debug for JsonRpcSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcSource")
            .field("chain", &self.chain)
            .field("label", &self.label)
            .field("pagination", &self.pagination)
            .field("rate_limiter", &self.rate_limiter)
            .finish()
    }
}

#[async_trait]
impl ChainDataSource for JsonRpcSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn kind(&self) -> SourceKind {
        SourceKind::JsonRpc
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::all()
    }

    async fn perform(&self, request: &ChainRequest) -> Result<ChainResponse, SourceError> {
        let method = request.method();
        let started = Instant::now();
        let result = self.dispatch(request).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        scout_observability::record_source_call(
            self.chain.as_str(),
            self.kind().as_str(),
            method.as_str(),
            status,
            started.elapsed(),
        );
        result
    }
}
