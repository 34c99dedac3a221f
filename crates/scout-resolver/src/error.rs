use scout_chain::ProviderError;
use scout_domain::ChainName;

use crate::QueryType;

#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("invalid identifier '{input}': {reason}")]
    InvalidIdentifier { input: String, reason: &'static str },

    #[error("identifier '{input}' cannot be a {hint}")]
    HintMismatch { input: String, hint: QueryType },

    #[error("invalid block window: from block {from} is after to block {to}")]
    InvalidWindow { from: u64, to: u64 },

    #[error("chain '{chain}' is not configured")]
    UnknownChain { chain: ChainName },

    #[error("no chain is configured for domain {domain}")]
    UnknownDomain { domain: u32 },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("search was cancelled")]
    Cancelled,
}

impl ResolverError {
    /// Errors raised before any network call was made.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ResolverError::InvalidIdentifier { .. }
                | ResolverError::HintMismatch { .. }
                | ResolverError::InvalidWindow { .. }
        )
    }
}
