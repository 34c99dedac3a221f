use alloy::primitives::{B256, Bytes, keccak256};
use serde::Serialize;

use crate::{DecodeError, DomainId};

/// version (1) + nonce (4) + origin (4) + sender (32) + destination (4) + recipient (32)
pub const MESSAGE_HEADER_LEN: usize = 77;

/// A mailbox message in its packed wire layout.
///
/// Integers are big-endian; sender and recipient are 32-byte left-padded addresses so that
/// non-EVM chains can share the format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxMessage {
    pub version: u8,
    pub nonce: u32,
    pub origin: DomainId,
    pub sender: B256,
    pub destination: DomainId,
    pub recipient: B256,
    pub body: Bytes,
}

impl MailboxMessage {
    pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() < MESSAGE_HEADER_LEN {
            return Err(DecodeError::MessageTooShort {
                len: raw.len(),
                min: MESSAGE_HEADER_LEN,
            });
        }

        Ok(Self {
            version: raw[0],
            nonce: read_u32(&raw[1..5]),
            origin: read_u32(&raw[5..9]),
            sender: B256::from_slice(&raw[9..41]),
            destination: read_u32(&raw[41..45]),
            recipient: B256::from_slice(&raw[45..77]),
            body: Bytes::copy_from_slice(&raw[MESSAGE_HEADER_LEN..]),
        })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut packed = Vec::with_capacity(MESSAGE_HEADER_LEN + self.body.len());
        packed.push(self.version);
        packed.extend_from_slice(&self.nonce.to_be_bytes());
        packed.extend_from_slice(&self.origin.to_be_bytes());
        packed.extend_from_slice(self.sender.as_slice());
        packed.extend_from_slice(&self.destination.to_be_bytes());
        packed.extend_from_slice(self.recipient.as_slice());
        packed.extend_from_slice(&self.body);
        packed.into()
    }

    /// Message id as emitted by `DispatchId`: keccak256 over the packed message.
    pub fn id(&self) -> B256 {
        keccak256(self.to_bytes())
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

/// A decoded `Dispatch` event together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRecord {
    pub message_id: B256,
    pub version: u8,
    pub nonce: u32,
    pub origin_domain: DomainId,
    pub sender: B256,
    pub destination_domain: DomainId,
    pub recipient: B256,
    pub body: Bytes,
    pub origin_tx_hash: B256,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
}

impl DispatchRecord {
    /// Builds a record from the raw message bytes carried by a `Dispatch` event.
    ///
    /// The id is hashed from `raw` rather than re-encoded so that trailing bytes the parser
    /// does not model still contribute to it.
    pub fn from_raw_message(
        raw: &[u8],
        origin_tx_hash: B256,
        block_number: Option<u64>,
        log_index: Option<u64>,
    ) -> Result<Self, DecodeError> {
        let message = MailboxMessage::parse(raw)?;
        Ok(Self {
            message_id: keccak256(raw),
            version: message.version,
            nonce: message.nonce,
            origin_domain: message.origin,
            sender: message.sender,
            destination_domain: message.destination,
            recipient: message.recipient,
            body: message.body,
            origin_tx_hash,
            block_number,
            log_index,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use alloy::primitives::{Address, b256};

    use super::*;

    fn sample_message() -> MailboxMessage {
        MailboxMessage {
            version: 3,
            nonce: 42,
            origin: 1,
            sender: Address::repeat_byte(0x11).into_word(),
            destination: 42161,
            recipient: Address::repeat_byte(0x22).into_word(),
            body: Bytes::from_static(b"hello"),
        }
    }

    #[test]
    fn packed_layout_matches_field_offsets() {
        let raw = sample_message().to_bytes();
        assert_eq!(raw.len(), MESSAGE_HEADER_LEN + 5);
        assert_eq!(raw[0], 3);
        assert_eq!(&raw[1..5], &42u32.to_be_bytes());
        assert_eq!(&raw[41..45], &42161u32.to_be_bytes());
        assert_eq!(&raw[MESSAGE_HEADER_LEN..], b"hello");
    }

    #[test]
    fn parse_rejects_truncated_header() {
        let raw = sample_message().to_bytes();
        let err = MailboxMessage::parse(&raw[..MESSAGE_HEADER_LEN - 1]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MessageTooShort { len: 76, min: 77 }
        ));
    }

    #[test]
    fn record_carries_message_fields_and_location() {
        let message = sample_message();
        let tx_hash = b256!("0x00000000000000000000000000000000000000000000000000000000000000aa");
        let record =
            DispatchRecord::from_raw_message(&message.to_bytes(), tx_hash, Some(7), Some(2))
                .unwrap();

        assert_eq!(record.message_id, message.id());
        assert_eq!(record.nonce, 42);
        assert_eq!(record.origin_domain, 1);
        assert_eq!(record.destination_domain, 42161);
        assert_eq!(record.sender, message.sender);
        assert_eq!(record.recipient, message.recipient);
        assert_eq!(record.body, message.body);
        assert_eq!(record.origin_tx_hash, tx_hash);
        assert_eq!(record.block_number, Some(7));
        assert_eq!(record.log_index, Some(2));
    }

    #[test]
    fn record_serializes_with_camel_case_keys() {
        let record = DispatchRecord::from_raw_message(
            &sample_message().to_bytes(),
            B256::ZERO,
            None,
            None,
        )
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["originDomain"], 1);
        assert_eq!(json["destinationDomain"], 42161);
        assert!(json.get("messageId").is_some());
    }
}
