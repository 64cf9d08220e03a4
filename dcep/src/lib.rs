//! The Data Channel Establishment Protocol (RFC 8831/8832): the
//! DATA_CHANNEL_OPEN / DATA_CHANNEL_ACK codec, channel id allocation, and
//! the per-channel state machine. DCEP messages ride inside SCTP DATA
//! chunks tagged with [`message::PPID_DCEP`].

pub mod channel;
pub mod error;
pub mod manager;
pub mod message;

pub use channel::{ChannelState, DataChannel};
pub use error::Error;
pub use manager::{ChannelManager, DcepOutcome};
pub use message::{
    ChannelAck, ChannelOpen, DcepMessage, PPID_BINARY, PPID_BINARY_EMPTY, PPID_DCEP, PPID_STRING,
    PPID_STRING_EMPTY,
};
