//! Supporting utilities shared by the protocol-plane crates: serial-number
//! arithmetic for wraparound-safe TSN/sequence comparisons, a CSPRNG
//! wrapper for every random draw the stack makes, a scoped single-record
//! mutex, and the lazy producer/consumer sequence used for incoming
//! connections and channels.

pub mod lock;
pub mod rng;
pub mod sequence;
pub mod serial;

pub use lock::StateLock;
pub use rng::SecureRng;
pub use sequence::{sequence, Consumer, Producer};
