use std::fmt;

use alloy::transports::{RpcError, TransportErrorKind};
use scout_domain::ChainName;

use crate::{Method, error_classification::is_transient_rpc_error};

/// Failure of a single source. Inside a [`crate::MultiProvider`] these are absorbed and
/// collected; they only reach callers through [`ProviderError::AllProvidersFailed`].
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("method {method} is not supported by this source")]
    UnsupportedMethod { method: Method },

    #[error("invalid block range [{start}, {end}]: {reason}")]
    InvalidBlockRange {
        start: u64,
        end: u64,
        reason: &'static str,
    },

    #[error("source returned an empty result")]
    EmptyResult,

    #[error("source answered {got} for a {expected} request")]
    MismatchedResponse { expected: Method, got: Method },

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error status: {0}")]
    HttpStatus(u16),

    #[error("explorer error: {message}")]
    Explorer { message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl SourceError {
    pub(crate) fn explorer(message: impl Into<String>) -> Self {
        Self::Explorer {
            message: message.into(),
        }
    }

    /// Whether repeating the same request later could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Rpc(err) => is_transient_rpc_error(err),
            SourceError::Http(err) => err.is_timeout() || err.is_connect(),
            SourceError::HttpStatus(status) => *status == 429 || *status >= 500,
            SourceError::Explorer { message } => {
                let lowered = message.to_ascii_lowercase();
                lowered.contains("rate limit") || lowered.contains("too many requests")
            }
            SourceError::EmptyResult => true,
            SourceError::UnsupportedMethod { .. }
            | SourceError::InvalidBlockRange { .. }
            | SourceError::MismatchedResponse { .. }
            | SourceError::Decode(_)
            | SourceError::InvalidRequest(_) => false,
        }
    }
}

/// One absorbed failure recorded while a [`crate::MultiProvider`] walked its sources.
#[derive(Debug)]
pub struct SourceFailure {
    pub source: String,
    pub error: SourceError,
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("chain '{chain}' has no RPC or explorer sources configured")]
    NoSourceConfigured { chain: ChainName },

    #[error("no source of chain '{chain}' supports {method}")]
    UnsupportedMethod { chain: ChainName, method: Method },

    #[error(
        "all {} source(s) of chain '{chain}' failed {method}: [{}]",
        failures.len(),
        failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    AllProvidersFailed {
        chain: ChainName,
        method: Method,
        failures: Vec<SourceFailure>,
    },

    #[error("chain '{chain}' is not configured")]
    UnknownChain { chain: ChainName },

    #[error("source construction failed: {0}")]
    SourceInit(String),
}

impl ProviderError {
    /// Exhausted providers may recover on retry; configuration problems will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::AllProvidersFailed { failures, .. } => {
                failures.iter().any(|failure| failure.error.is_transient())
            }
            _ => false,
        }
    }

    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            ProviderError::AllProvidersFailed { failures, .. } => failures,
            _ => &[],
        }
    }
}
