use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("checksum mismatch: expected {expected:#010x}, computed {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("state cookie failed validation")]
    CookieValidationFailed,

    #[error("state cookie has expired")]
    CookieExpired,

    #[error("chunk exceeded its maximum retransmit count")]
    MaxRetransmitsExceeded,

    #[error("association failed: {0}")]
    AssociationFailed(String),

    #[error("operation timed out")]
    Timeout,
}
