use alloy::{eips::BlockNumberOrTag, primitives::Address};

use crate::{BlockBound, ChainRequest, LogFilter, SourceError};

pub(crate) type QueryParams = Vec<(&'static str, String)>;

/// Translates a request into etherscan-style `module`/`action` query parameters.
pub(crate) fn query_params(request: &ChainRequest) -> Result<QueryParams, SourceError> {
    let params = match request {
        ChainRequest::GetBlockNumber => proxy("eth_blockNumber"),
        ChainRequest::GetBlock { block } => {
            let mut params = proxy("eth_getBlockByNumber");
            params.push(("tag", block_tag(block)));
            params.push(("boolean", "false".to_string()));
            params
        }
        ChainRequest::GetBalance { address, block } => vec![
            ("module", "account".to_string()),
            ("action", "balance".to_string()),
            ("address", address_param(address)),
            ("tag", block_tag(block)),
        ],
        ChainRequest::GetCode { address, block } => {
            let mut params = proxy("eth_getCode");
            params.push(("address", address_param(address)));
            params.push(("tag", block_tag(block)));
            params
        }
        ChainRequest::GetStorageAt {
            address,
            slot,
            block,
        } => {
            let mut params = proxy("eth_getStorageAt");
            params.push(("address", address_param(address)));
            params.push(("position", format!("{slot:#x}")));
            params.push(("tag", block_tag(block)));
            params
        }
        ChainRequest::GetTransaction { hash } => {
            let mut params = proxy("eth_getTransactionByHash");
            params.push(("txhash", hash.to_string()));
            params
        }
        ChainRequest::GetTransactionCount { address, block } => {
            let mut params = proxy("eth_getTransactionCount");
            params.push(("address", address_param(address)));
            params.push(("tag", block_tag(block)));
            params
        }
        ChainRequest::GetTransactionReceipt { hash } => {
            let mut params = proxy("eth_getTransactionReceipt");
            params.push(("txhash", hash.to_string()));
            params
        }
        ChainRequest::GetGasPrice => proxy("eth_gasPrice"),
        ChainRequest::GetLogs(filter) => logs_params(filter)?,
        ChainRequest::Call { .. }
        | ChainRequest::EstimateGas { .. }
        | ChainRequest::SendTransaction { .. } => {
            return Err(SourceError::UnsupportedMethod {
                method: request.method(),
            });
        }
    };
    Ok(params)
}

fn proxy(action: &str) -> QueryParams {
    vec![
        ("module", "proxy".to_string()),
        ("action", action.to_string()),
    ]
}

const TOPIC_KEYS: [&str; 4] = ["topic0", "topic1", "topic2", "topic3"];
const TOPIC_OPERATOR_KEYS: [((usize, usize), &str); 6] = [
    ((0, 1), "topic0_1_opr"),
    ((0, 2), "topic0_2_opr"),
    ((0, 3), "topic0_3_opr"),
    ((1, 2), "topic1_2_opr"),
    ((1, 3), "topic1_3_opr"),
    ((2, 3), "topic2_3_opr"),
];

fn logs_params(filter: &LogFilter) -> Result<QueryParams, SourceError> {
    // Explorer log endpoints are scoped to a contract.
    let address = filter.address.ok_or_else(|| {
        SourceError::InvalidRequest("explorer getLogs requires a contract address".to_string())
    })?;

    let mut params = vec![
        ("module", "logs".to_string()),
        ("action", "getLogs".to_string()),
        ("address", address_param(&address)),
        (
            "fromBlock",
            bound_param(filter.from_block.unwrap_or(BlockBound::Earliest)),
        ),
        (
            "toBlock",
            bound_param(filter.to_block.unwrap_or(BlockBound::Latest)),
        ),
    ];

    for (key, topic) in TOPIC_KEYS.into_iter().zip(filter.topics) {
        if let Some(topic) = topic {
            params.push((key, topic.to_string()));
        }
    }
    for ((a, b), key) in TOPIC_OPERATOR_KEYS {
        if filter.topics[a].is_some() && filter.topics[b].is_some() {
            params.push((key, "and".to_string()));
        }
    }

    Ok(params)
}

fn address_param(address: &Address) -> String {
    format!("{address:#x}")
}

fn bound_param(bound: BlockBound) -> String {
    match bound {
        BlockBound::Number(number) => number.to_string(),
        BlockBound::Earliest => "0".to_string(),
        BlockBound::Latest => "latest".to_string(),
    }
}

fn block_tag(block: &BlockNumberOrTag) -> String {
    match block {
        BlockNumberOrTag::Number(number) => format!("{number:#x}"),
        BlockNumberOrTag::Latest => "latest".to_string(),
        BlockNumberOrTag::Earliest => "earliest".to_string(),
        BlockNumberOrTag::Pending => "pending".to_string(),
        BlockNumberOrTag::Safe => "safe".to_string(),
        BlockNumberOrTag::Finalized => "finalized".to_string(),
    }
}
