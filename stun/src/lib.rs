//! STUN (RFC 5389) message codec, extended with the RFC 8445 ICE
//! attributes this stack needs (PRIORITY, USE-CANDIDATE, ICE-CONTROLLED,
//! ICE-CONTROLLING) plus MESSAGE-INTEGRITY and FINGERPRINT.

pub mod attribute;
pub mod error;
pub mod header;
pub mod message;

pub use attribute::{Attribute, Tlv};
pub use error::Error;
pub use header::{looks_like_stun, Class, Header, Method, MAGIC_COOKIE};
pub use message::Message;
