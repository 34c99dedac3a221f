//! Locates mailbox `Dispatch` events from a transaction hash, message id or address, on chains
//! without a prebuilt index, using only log and receipt queries.

mod error;
mod identifier;
mod mailbox;
mod race;
mod resolver;
mod search;

pub use error::ResolverError;
pub use identifier::{Identifier, QueryType, classify};
pub use mailbox::{Mailbox, MailboxTopics, decode_dispatch};
pub use race::{MultiChainOutcome, search_chains};
pub use resolver::MessageResolver;
pub use search::{BlockWindow, ChainResolver, DEFAULT_BLOCK_WINDOW};
pub use tokio_util::sync::CancellationToken;
