mod chain_name;
mod delivery;
mod error;
mod message;

pub use chain_name::ChainName;
pub use delivery::DeliveryStatus;
pub use error::DecodeError;
pub use message::{DispatchRecord, MESSAGE_HEADER_LEN, MailboxMessage};

/// Messaging-layer domain identifier of a chain (distinct from the EVM chain id).
pub type DomainId = u32;
