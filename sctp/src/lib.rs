//! SCTP over DTLS: packet/chunk codecs with the CRC-32C checksum, the
//! cookie-based four-way handshake, TSN tracking, fragment reassembly, and
//! a retransmission queue with RTT-driven timeouts and congestion control.

pub mod association;
pub mod checksum;
pub mod chunk;
pub mod cookie;
pub mod error;
pub mod header;
pub mod packet;
pub mod reassembly;
pub mod retransmission;
pub mod state;
pub mod tsn_tracker;

pub use association::{Association, ProcessOutcome};
pub use error::Error;
pub use packet::Packet;
pub use reassembly::AssembledMessage;
pub use state::{AssociationState, Role};
