use alloy::{
    primitives::{Address, B256, Bytes, LogData, U256},
    rpc::types::Log,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{ChainRequest, ChainResponse, SourceError};

const NO_RECORDS: &str = "no records found";

/// Etherscan-compatible response body.
///
/// `module=proxy` answers use the JSON-RPC shape (`result`/`error`); every other module
/// answers with `status`/`message`/`result`.
#[derive(Debug, Deserialize)]
pub(crate) struct ExplorerEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ExplorerRpcError>,
}

#[derive(Debug, Deserialize)]
struct ExplorerRpcError {
    #[serde(default)]
    message: String,
}

impl ExplorerEnvelope {
    /// Unwraps the `result` payload, turning explorer-level failures into errors.
    pub(crate) fn into_result(self) -> Result<Value, SourceError> {
        if let Some(error) = self.error {
            return Err(SourceError::explorer(error.message));
        }

        if self.status.as_deref() == Some("0") {
            let message = self.message.unwrap_or_default();
            let detail = match &self.result {
                Some(Value::String(text)) => text.clone(),
                _ => String::new(),
            };
            if message.to_ascii_lowercase().contains(NO_RECORDS)
                || detail.to_ascii_lowercase().contains(NO_RECORDS)
            {
                return Ok(Value::Array(Vec::new()));
            }
            let reason = if detail.is_empty() {
                message
            } else {
                format!("{message}: {detail}")
            };
            return Err(SourceError::explorer(reason));
        }

        match self.result {
            None | Some(Value::Null) => Err(SourceError::EmptyResult),
            Some(Value::String(text)) if text.is_empty() => Err(SourceError::EmptyResult),
            Some(result) => Ok(result),
        }
    }
}

/// Converts an unwrapped explorer `result` into the typed response for `request`.
pub(crate) fn parse_result(
    request: &ChainRequest,
    result: Value,
) -> Result<ChainResponse, SourceError> {
    let response = match request {
        ChainRequest::GetBlockNumber => ChainResponse::BlockNumber(parse_quantity(&result)?),
        ChainRequest::GetBlock { .. } => ChainResponse::Block(serde_json::from_value(result)?),
        ChainRequest::GetBalance { .. } => ChainResponse::Balance(parse_u256(&result)?),
        ChainRequest::GetCode { .. } => {
            ChainResponse::Code(serde_json::from_value::<Bytes>(result)?)
        }
        ChainRequest::GetStorageAt { .. } => ChainResponse::Storage(parse_u256(&result)?),
        ChainRequest::GetTransaction { .. } => {
            ChainResponse::Transaction(serde_json::from_value(result)?)
        }
        ChainRequest::GetTransactionCount { .. } => {
            ChainResponse::TransactionCount(parse_quantity(&result)?)
        }
        ChainRequest::GetTransactionReceipt { .. } => {
            ChainResponse::Receipt(serde_json::from_value(result)?)
        }
        ChainRequest::GetGasPrice => ChainResponse::GasPrice(u128::from(parse_quantity(&result)?)),
        ChainRequest::GetLogs(_) => {
            let logs: Vec<ExplorerLog> = serde_json::from_value(result)?;
            ChainResponse::Logs(
                logs.into_iter()
                    .map(ExplorerLog::into_rpc_log)
                    .collect::<Result<_, _>>()?,
            )
        }
        ChainRequest::Call { .. }
        | ChainRequest::EstimateGas { .. }
        | ChainRequest::SendTransaction { .. } => {
            return Err(SourceError::UnsupportedMethod {
                method: request.method(),
            });
        }
    };
    Ok(response)
}

/// Log entry as returned by `module=logs&action=getLogs`. Numeric fields are hex strings on
/// etherscan and may be empty (`"0x"`) for the first index in a block.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerLog {
    address: Address,
    topics: Vec<Option<B256>>,
    data: Bytes,
    block_number: String,
    #[serde(default)]
    block_hash: Option<B256>,
    #[serde(default)]
    time_stamp: Option<String>,
    transaction_hash: B256,
    #[serde(default)]
    transaction_index: Option<String>,
    #[serde(default)]
    log_index: Option<String>,
}

impl ExplorerLog {
    fn into_rpc_log(self) -> Result<Log, SourceError> {
        let topics = self.topics.into_iter().flatten().collect();
        Ok(Log {
            inner: alloy::primitives::Log {
                address: self.address,
                data: LogData::new_unchecked(topics, self.data),
            },
            block_hash: self.block_hash,
            block_number: Some(parse_numeric(&self.block_number)?),
            block_timestamp: self.time_stamp.as_deref().map(parse_numeric).transpose()?,
            transaction_hash: Some(self.transaction_hash),
            transaction_index: self
                .transaction_index
                .as_deref()
                .map(parse_numeric)
                .transpose()?,
            log_index: self.log_index.as_deref().map(parse_numeric).transpose()?,
            removed: false,
        })
    }
}

fn parse_quantity(value: &Value) -> Result<u64, SourceError> {
    match value {
        Value::String(text) => parse_numeric(text),
        Value::Number(number) => number
            .as_u64()
            .ok_or_else(|| SourceError::explorer(format!("invalid quantity {number}"))),
        other => Err(SourceError::explorer(format!("invalid quantity {other}"))),
    }
}

fn parse_u256(value: &Value) -> Result<U256, SourceError> {
    let Value::String(text) = value else {
        return Err(SourceError::explorer(format!("invalid integer {value}")));
    };
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(text, 10),
    };
    parsed.map_err(|e| SourceError::explorer(format!("invalid integer '{text}': {e}")))
}

/// Parses `0x`-prefixed hex or plain decimal. A bare `0x` is zero.
fn parse_numeric(text: &str) -> Result<u64, SourceError> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x") {
        Some("") => Ok(0),
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse::<u64>(),
    };
    parsed.map_err(|e| SourceError::explorer(format!("invalid number '{text}': {e}")))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::LogFilter;

    fn envelope(value: Value) -> ExplorerEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn proxy_result_is_unwrapped() {
        let result = envelope(json!({"jsonrpc": "2.0", "id": 1, "result": "0x3e8"}))
            .into_result()
            .unwrap();
        let response = parse_result(&ChainRequest::GetBlockNumber, result).unwrap();
        assert!(matches!(response, ChainResponse::BlockNumber(1000)));
    }

    #[test]
    fn null_receipt_is_empty_result() {
        let err = envelope(json!({"jsonrpc": "2.0", "id": 1, "result": null}))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, SourceError::EmptyResult));
    }

    #[test]
    fn no_records_is_empty_log_list() {
        let result = envelope(json!({"status": "0", "message": "No records found", "result": []}))
            .into_result()
            .unwrap();
        let response =
            parse_result(&ChainRequest::GetLogs(LogFilter::new()), result).unwrap();
        assert!(matches!(response, ChainResponse::Logs(logs) if logs.is_empty()));
    }

    #[test]
    fn rate_limit_status_is_error() {
        let err = envelope(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Max rate limit reached"
        }))
        .into_result()
        .unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("Max rate limit reached"));
    }

    #[test]
    fn rpc_error_is_surfaced() {
        let err = envelope(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "boom"}
        }))
        .into_result()
        .unwrap_err();
        assert!(matches!(err, SourceError::Explorer { ref message } if message == "boom"));
    }

    #[test]
    fn etherscan_logs_are_converted() {
        let topic = B256::repeat_byte(7);
        let tx_hash = B256::repeat_byte(8);
        let result = json!([{
            "address": "0x0000000000000000000000000000000000000009",
            "topics": [topic.to_string(), null],
            "data": "0x1234",
            "blockNumber": "0x64",
            "timeStamp": "0x5f5e100",
            "transactionHash": tx_hash.to_string(),
            "transactionIndex": "0x",
            "logIndex": "0x2"
        }]);
        let response = parse_result(&ChainRequest::GetLogs(LogFilter::new()), result).unwrap();
        let ChainResponse::Logs(logs) = response else {
            panic!("expected logs");
        };
        let log = &logs[0];
        assert_eq!(log.address(), Address::with_last_byte(9));
        assert_eq!(log.topics(), &[topic]);
        assert_eq!(log.block_number, Some(100));
        assert_eq!(log.block_timestamp, Some(100_000_000));
        assert_eq!(log.transaction_index, Some(0));
        assert_eq!(log.log_index, Some(2));
        assert_eq!(log.transaction_hash, Some(tx_hash));
    }

    #[test]
    fn balance_accepts_decimal() {
        let request = ChainRequest::GetBalance {
            address: Address::ZERO,
            block: Default::default(),
        };
        let response = parse_result(&request, json!("1000000000000000000")).unwrap();
        let one_ether = U256::from(10u64).pow(U256::from(18u64));
        assert!(matches!(response, ChainResponse::Balance(v) if v == one_ether));
    }
}
