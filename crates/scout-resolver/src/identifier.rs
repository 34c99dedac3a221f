use std::{fmt, str::FromStr};

use alloy::primitives::{Address, B256};

use crate::ResolverError;

/// Caller-supplied interpretation of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    TxHash,
    MessageId,
    Address,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::TxHash => "tx-hash",
            QueryType::MessageId => "message-id",
            QueryType::Address => "address",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "tx-hash" | "txhash" | "tx" => Ok(QueryType::TxHash),
            "message-id" | "messageid" | "msg-id" | "id" => Ok(QueryType::MessageId),
            "address" | "addr" => Ok(QueryType::Address),
            other => Err(format!(
                "unknown query type '{other}', expected tx-hash, message-id or address"
            )),
        }
    }
}

/// A classified search key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    TxHash(B256),
    MessageId(B256),
    Address(Address),
}

impl Identifier {
    pub fn query_type(&self) -> QueryType {
        match self {
            Identifier::TxHash(_) => QueryType::TxHash,
            Identifier::MessageId(_) => QueryType::MessageId,
            Identifier::Address(_) => QueryType::Address,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::TxHash(hash) => write!(f, "tx {hash}"),
            Identifier::MessageId(id) => write!(f, "message {id}"),
            Identifier::Address(address) => write!(f, "address {address}"),
        }
    }
}

const ADDRESS_HEX_LEN: usize = 40;
const HASH_HEX_LEN: usize = 64;

/// Classifies `input` into the interpretations to try, in order.
///
/// A 20-byte value is an address. A 32-byte value is a transaction hash or a message id: the
/// hint picks one, and without a hint the transaction hash is tried first.
pub fn classify(input: &str, hint: Option<QueryType>) -> Result<Vec<Identifier>, ResolverError> {
    let trimmed = input.trim();
    let invalid = |reason| ResolverError::InvalidIdentifier {
        input: input.to_string(),
        reason,
    };
    let mismatch = |hint| ResolverError::HintMismatch {
        input: input.to_string(),
        hint,
    };

    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| invalid("expected a 0x-prefixed hex value"))?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("contains non-hex characters"));
    }

    match hex.len() {
        ADDRESS_HEX_LEN => {
            if let Some(hint @ (QueryType::TxHash | QueryType::MessageId)) = hint {
                return Err(mismatch(hint));
            }
            let address = trimmed
                .parse::<Address>()
                .map_err(|_| invalid("not a valid address"))?;
            Ok(vec![Identifier::Address(address)])
        }
        HASH_HEX_LEN => {
            let hash = trimmed
                .parse::<B256>()
                .map_err(|_| invalid("not a valid 32-byte value"))?;
            match hint {
                Some(QueryType::TxHash) => Ok(vec![Identifier::TxHash(hash)]),
                Some(QueryType::MessageId) => Ok(vec![Identifier::MessageId(hash)]),
                Some(QueryType::Address) => Err(mismatch(QueryType::Address)),
                None => Ok(vec![Identifier::TxHash(hash), Identifier::MessageId(hash)]),
            }
        }
        _ => Err(invalid("expected 20 or 32 bytes of hex")),
    }
}
