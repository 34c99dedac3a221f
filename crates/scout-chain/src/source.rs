use std::fmt;

use async_trait::async_trait;

use crate::{CapabilitySet, ChainRequest, ChainResponse, Method, SourceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Explorer,
    JsonRpc,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Explorer => "explorer",
            SourceKind::JsonRpc => "json_rpc",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One backend able to answer chain-data requests for a single chain.
///
/// Implementations must never return an absent value as success: a missing block, receipt or
/// transaction is reported as [`SourceError::EmptyResult`] so that fallback stays well defined.
#[async_trait]
pub trait ChainDataSource: Send + Sync + fmt::Debug {
    /// Human-readable identity used in logs and failure reports (never includes api keys).
    fn label(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Methods this source can reliably serve. Fixed at construction.
    fn capabilities(&self) -> CapabilitySet;

    fn supports(&self, method: Method) -> bool {
        self.capabilities().contains(method)
    }

    async fn perform(&self, request: &ChainRequest) -> Result<ChainResponse, SourceError>;
}
