use alloy::{
    eips::BlockNumberOrTag,
    primitives::{Address, B256, Bytes, U256},
    rpc::types::{Block, Log, Transaction, TransactionReceipt, TransactionRequest},
};

use crate::{LogFilter, Method};

/// A [`Method`] together with its parameters.
#[derive(Debug, Clone)]
pub enum ChainRequest {
    GetBlock {
        block: BlockNumberOrTag,
    },
    GetBlockNumber,
    GetBalance {
        address: Address,
        block: BlockNumberOrTag,
    },
    GetCode {
        address: Address,
        block: BlockNumberOrTag,
    },
    GetStorageAt {
        address: Address,
        slot: U256,
        block: BlockNumberOrTag,
    },
    GetTransaction {
        hash: B256,
    },
    GetTransactionCount {
        address: Address,
        block: BlockNumberOrTag,
    },
    GetTransactionReceipt {
        hash: B256,
    },
    GetLogs(LogFilter),
    GetGasPrice,
    Call {
        tx: Box<TransactionRequest>,
        block: BlockNumberOrTag,
    },
    EstimateGas {
        tx: Box<TransactionRequest>,
    },
    SendTransaction {
        raw: Bytes,
    },
}

impl ChainRequest {
    pub fn method(&self) -> Method {
        match self {
            ChainRequest::GetBlock { .. } => Method::GetBlock,
            ChainRequest::GetBlockNumber => Method::GetBlockNumber,
            ChainRequest::GetBalance { .. } => Method::GetBalance,
            ChainRequest::GetCode { .. } => Method::GetCode,
            ChainRequest::GetStorageAt { .. } => Method::GetStorageAt,
            ChainRequest::GetTransaction { .. } => Method::GetTransaction,
            ChainRequest::GetTransactionCount { .. } => Method::GetTransactionCount,
            ChainRequest::GetTransactionReceipt { .. } => Method::GetTransactionReceipt,
            ChainRequest::GetLogs(_) => Method::GetLogs,
            ChainRequest::GetGasPrice => Method::GetGasPrice,
            ChainRequest::Call { .. } => Method::Call,
            ChainRequest::EstimateGas { .. } => Method::EstimateGas,
            ChainRequest::SendTransaction { .. } => Method::SendTransaction,
        }
    }
}

/// A successful, non-absent result of a [`ChainRequest`].
#[derive(Debug, Clone)]
pub enum ChainResponse {
    Block(Box<Block>),
    BlockNumber(u64),
    Balance(U256),
    Code(Bytes),
    Storage(U256),
    Transaction(Box<Transaction>),
    TransactionCount(u64),
    Receipt(Box<TransactionReceipt>),
    Logs(Vec<Log>),
    GasPrice(u128),
    CallResult(Bytes),
    GasEstimate(u64),
    TransactionHash(B256),
}

impl ChainResponse {
    /// The method this response answers.
    pub fn method(&self) -> Method {
        match self {
            ChainResponse::Block(_) => Method::GetBlock,
            ChainResponse::BlockNumber(_) => Method::GetBlockNumber,
            ChainResponse::Balance(_) => Method::GetBalance,
            ChainResponse::Code(_) => Method::GetCode,
            ChainResponse::Storage(_) => Method::GetStorageAt,
            ChainResponse::Transaction(_) => Method::GetTransaction,
            ChainResponse::TransactionCount(_) => Method::GetTransactionCount,
            ChainResponse::Receipt(_) => Method::GetTransactionReceipt,
            ChainResponse::Logs(_) => Method::GetLogs,
            ChainResponse::GasPrice(_) => Method::GetGasPrice,
            ChainResponse::CallResult(_) => Method::Call,
            ChainResponse::GasEstimate(_) => Method::EstimateGas,
            ChainResponse::TransactionHash(_) => Method::SendTransaction,
        }
    }
}
