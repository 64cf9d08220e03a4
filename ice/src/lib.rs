//! An always-controlled (ICE-Lite) agent: it advertises a single local
//! candidate, never probes the remote side, and only answers binding
//! requests that pass STUN credential and integrity checks.

pub mod agent;
pub mod credentials;
pub mod error;
pub mod state;

pub use agent::Agent;
pub use credentials::Credentials;
pub use error::ValidationError;
pub use state::IceState;
