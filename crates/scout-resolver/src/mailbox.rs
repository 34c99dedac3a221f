use alloy::{
    primitives::{Address, B256},
    rpc::types::Log,
    sol,
    sol_types::SolEvent,
};
use scout_domain::{DecodeError, DispatchRecord};

sol! {
    #[derive(Debug)]
    contract Mailbox {
        event Dispatch(
            address indexed sender,
            uint32 indexed destination,
            bytes32 indexed recipient,
            bytes message
        );
        event DispatchId(bytes32 indexed messageId);
        event Process(uint32 indexed origin, bytes32 indexed sender, address indexed recipient);
        event ProcessId(bytes32 indexed messageId);
    }
}

/// Mailbox address and event topics of one chain, computed once per resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxTopics {
    pub mailbox: Address,
    pub dispatch: B256,
    pub dispatch_id: B256,
    pub process: B256,
    pub process_id: B256,
}

impl MailboxTopics {
    pub fn new(mailbox: Address) -> Self {
        Self {
            mailbox,
            dispatch: Mailbox::Dispatch::SIGNATURE_HASH,
            dispatch_id: Mailbox::DispatchId::SIGNATURE_HASH,
            process: Mailbox::Process::SIGNATURE_HASH,
            process_id: Mailbox::ProcessId::SIGNATURE_HASH,
        }
    }

    pub fn is_dispatch(&self, log: &Log) -> bool {
        log.address() == self.mailbox && log.topic0() == Some(&self.dispatch)
    }
}

/// Decodes a mailbox `Dispatch` log into a record.
pub fn decode_dispatch(log: &Log, mailbox: Address) -> Result<DispatchRecord, DecodeError> {
    if log.address() != mailbox {
        return Err(DecodeError::WrongEmitter {
            expected: mailbox.to_string(),
        });
    }
    if log.topic0() != Some(&Mailbox::Dispatch::SIGNATURE_HASH) {
        return Err(DecodeError::UnexpectedEvent { event: "Dispatch" });
    }

    let event = Mailbox::Dispatch::decode_log_data(log.data()).map_err(|e| {
        DecodeError::MalformedEvent {
            event: "Dispatch",
            reason: e.to_string(),
        }
    })?;
    let origin_tx_hash = log.transaction_hash.ok_or(DecodeError::MissingField {
        field: "transaction_hash",
    })?;

    let record = DispatchRecord::from_raw_message(
        &event.message,
        origin_tx_hash,
        log.block_number,
        log.log_index,
    )?;

    // Indexed topics must agree with the packed message.
    if record.sender != event.sender.into_word()
        || record.destination_domain != event.destination
        || record.recipient != event.recipient
    {
        return Err(DecodeError::MalformedEvent {
            event: "Dispatch",
            reason: "indexed topics disagree with message body".to_string(),
        });
    }
    Ok(record)
}

/// Message id carried by a `DispatchId` or `ProcessId` log.
pub(crate) fn indexed_message_id(log: &Log) -> Option<B256> {
    log.topics().get(1).copied()
}
