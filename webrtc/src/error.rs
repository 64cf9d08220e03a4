use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("DTLS handshake failed: {0}")]
    DtlsHandshakeFailed(String),

    #[error("SCTP error: {0}")]
    SctpFailed(#[from] sctp::Error),

    #[error("ICE error: {0}")]
    IceFailed(String),

    #[error("operation invalid in the current connection state")]
    InvalidState,

    #[error("operation timed out")]
    Timeout,

    #[error("connection is closed")]
    Closed,
}
