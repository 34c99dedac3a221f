use alloy::primitives::B256;
use serde::Serialize;

/// Result of looking for a message's `ProcessId` event on its destination chain.
///
/// A missing pairing is reported as [`DeliveryStatus::Unknown`]: the message may still be in
/// flight, or the event may lie outside the searched window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DeliveryStatus {
    Delivered {
        transaction_hash: B256,
        block_number: Option<u64>,
    },
    Unknown,
}

impl DeliveryStatus {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered { .. })
    }
}
