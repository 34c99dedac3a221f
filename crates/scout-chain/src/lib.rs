mod config;
mod config_error;
mod error;
mod error_classification;
mod explorer;
mod explorer_rate_limiter;
mod filter;
mod method;
mod multi_provider;
mod registry;
mod request;
mod rpc;
mod rpc_rate_limiter;
mod source;

pub use config::{
    BlockExplorer, BlockExplorerRaw, ChainMetadata, ChainMetadataRaw,
    DEFAULT_EXPLORER_THROTTLE_MS, DEFAULT_REQUEST_TIMEOUT_MS, ExplorerFamily, RpcEndpoint,
    RpcEndpointRaw, RpcPagination, SourceSettings,
};
pub use config_error::ConfigError;
pub use error::{ProviderError, SourceError, SourceFailure};
pub use explorer::ExplorerSource;
pub use explorer_rate_limiter::{ExplorerRateLimiter, ThrottleTurn};
pub use filter::{BlockBound, LogChunk, LogFilter, plan_chunks};
pub use method::{CapabilitySet, Method};
pub use multi_provider::{MultiProvider, Served};
pub use registry::ProviderRegistry;
pub use request::{ChainRequest, ChainResponse};
pub use rpc::JsonRpcSource;
pub use source::{ChainDataSource, SourceKind};

// Re-export the alloy types that appear in this crate's public API.
pub use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256, Bytes, U256},
    rpc::types::{Log, TransactionReceipt},
};
