//! The DTLS record and handshake layer is an external collaborator: a
//! separate module (or crate) implements it with its own internal
//! synchronization. This trait is the seam the orchestrator drives it
//! through.

use std::net::SocketAddr;

/// Everything one inbound DTLS datagram produced.
#[derive(Debug, Default, Clone)]
pub struct DtlsIngress {
    pub datagrams_to_send: Vec<Vec<u8>>,
    pub handshake_complete: bool,
    pub application_data: Vec<u8>,
}

pub trait DtlsTransport: Send {
    /// Produces the initial handshake flight. The client sends immediately;
    /// the server waits for the peer's ClientHello instead.
    fn start_handshake(&mut self, is_client: bool) -> Vec<Vec<u8>>;

    /// Feeds one inbound datagram already classified as DTLS.
    fn process_received_datagram(
        &mut self,
        bytes: &[u8],
        remote_address: Option<SocketAddr>,
    ) -> DtlsIngress;

    /// Encrypts one SCTP packet for transmission over the DTLS record layer.
    fn write_application_data(&mut self, plaintext: &[u8]) -> Vec<u8>;

    /// The peer's certificate fingerprint, available once the handshake
    /// completes.
    fn remote_fingerprint(&self) -> Option<String>;
}
