use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid DCEP message format: {0}")]
    InvalidFormat(String),

    #[error("data channel is closed")]
    ChannelClosed,

    #[error("data channel is not ready")]
    NotReady,
}
