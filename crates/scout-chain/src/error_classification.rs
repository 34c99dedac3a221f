use alloy::transports::{RpcError, TransportErrorKind};

const TRANSIENT_PATTERNS: [&str; 4] = [
    "rate limit",
    "too many requests",
    "request limit",
    "timeout",
];

pub(crate) fn is_transient_rpc_error(err: &RpcError<TransportErrorKind>) -> bool {
    match err {
        RpcError::Transport(kind) => match kind {
            TransportErrorKind::MissingBatchResponse(_) => true,
            TransportErrorKind::BackendGone => true,
            TransportErrorKind::HttpError(http) => {
                http.is_rate_limit_err() || http.is_temporarily_unavailable()
            }
            TransportErrorKind::Custom(custom) => matches_transient(&custom.to_string()),
            _ => false,
        },
        RpcError::ErrorResp(payload) => payload.is_retry_err(),
        RpcError::NullResp => true,
        RpcError::DeserError { text, .. } => matches_transient(text),
        _ => false,
    }
}

fn matches_transient(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    TRANSIENT_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}
