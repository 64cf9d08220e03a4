use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("insufficient data: expected at least {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid magic cookie: {0:#010x}")]
    InvalidMagicCookie(u32),
}
