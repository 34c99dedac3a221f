/// Reasons a log or message payload cannot be turned into a [`crate::DispatchRecord`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("message is {len} bytes, expected at least {min}")]
    MessageTooShort { len: usize, min: usize },

    #[error("log was not emitted by mailbox {expected}")]
    WrongEmitter { expected: String },

    #[error("log is not a {event} event")]
    UnexpectedEvent { event: &'static str },

    #[error("malformed {event} event: {reason}")]
    MalformedEvent { event: &'static str, reason: String },

    #[error("log is missing {field}")]
    MissingField { field: &'static str },
}
