//! The connection orchestrator: demultiplexes ingress, drives the DTLS
//! handshake, bridges DTLS application data to and from the SCTP
//! association, and dispatches delivered messages to DCEP or the user's
//! data handler.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use util::{sequence, Consumer, Producer, StateLock};

use dcep::{ChannelManager, DataChannel};
use ice::Agent as IceAgent;
use sctp::{AssembledMessage, Association, Role as SctpRole};

use crate::certificate::Certificate;
use crate::demux::{classify, Classification};
use crate::dtls::DtlsTransport;
use crate::error::Error;
use crate::state::{ConnectionState, Role};

/// Caller-supplied UDP send callback; the socket itself is an external
/// collaborator.
pub type SendFn = Box<dyn Fn(Vec<u8>) + Send + Sync>;
pub type DataHandler = Arc<dyn Fn(u16, Vec<u8>) + Send + Sync>;

const SCTP_PORT: u16 = 5000;

struct Inner {
    role: Role,
    state: ConnectionState,
    dtls: Box<dyn DtlsTransport>,
    expected_remote_fingerprint: Option<String>,
    remote_fingerprint: Option<String>,
    data_handler: Option<DataHandler>,
    incoming_channels: Producer<DataChannel>,
}

pub struct Connection {
    inner: StateLock<Inner>,
    send: SendFn,
    local_fingerprint: String,
    ice: IceAgent,
    association: Association,
    channels: ChannelManager,
    incoming_channels_consumer: Consumer<DataChannel>,
}

impl Connection {
    pub(crate) fn new(role: Role, certificate: &Certificate, dtls: Box<dyn DtlsTransport>, send: SendFn) -> Self {
        let sctp_role = match role {
            Role::Client => SctpRole::Client,
            Role::Server => SctpRole::Server,
        };
        let (producer, consumer) = sequence();

        Self {
            inner: StateLock::new(Inner {
                role,
                state: ConnectionState::New,
                dtls,
                expected_remote_fingerprint: None,
                remote_fingerprint: None,
                data_handler: None,
                incoming_channels: producer,
            }),
            send,
            local_fingerprint: certificate.fingerprint().to_string(),
            ice: IceAgent::new(),
            association: Association::new(sctp_role, SCTP_PORT, SCTP_PORT),
            channels: ChannelManager::new(role == Role::Client),
            incoming_channels_consumer: consumer,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.with(|s| s.state.clone())
    }

    pub fn local_fingerprint(&self) -> &str {
        &self.local_fingerprint
    }

    pub fn remote_fingerprint(&self) -> Option<String> {
        self.inner.with(|s| s.remote_fingerprint.clone())
    }

    pub fn ice_credentials(&self) -> (String, String) {
        (self.ice.local_ufrag(), self.ice.local_password())
    }

    pub fn incoming_channels(&self) -> &Consumer<DataChannel> {
        &self.incoming_channels_consumer
    }

    /// Clients only: the fingerprint the DTLS handshake must present once
    /// complete.
    pub(crate) fn set_expected_remote_fingerprint(&self, fingerprint: String) {
        self.inner
            .with(|s| s.expected_remote_fingerprint = Some(fingerprint));
    }

    pub fn set_remote_ice_credentials(&self, ufrag: String, password: String) {
        self.ice.set_remote_credentials(ufrag, password);
    }

    pub fn set_data_handler(&self, handler: impl Fn(u16, Vec<u8>) + Send + Sync + 'static) {
        self.inner.with(|s| s.data_handler = Some(Arc::new(handler)));
    }

    /// Kicks off the DTLS handshake: the client sends the first flight
    /// immediately, the server waits for the peer.
    pub fn start(&self) -> Result<(), Error> {
        if self.state() != ConnectionState::New {
            return Err(Error::InvalidState);
        }
        let is_client = self.inner.with(|s| s.role == Role::Client);
        let flight = self.inner.with(|s| {
            s.state = ConnectionState::Connecting;
            let flight = s.dtls.start_handshake(is_client);
            s.state = ConnectionState::DtlsHandshaking;
            flight
        });
        for datagram in flight {
            (self.send)(datagram);
        }
        Ok(())
    }

    /// Feeds one inbound datagram, classifying it by first byte before
    /// routing it to STUN/ICE or DTLS.
    pub fn receive(&self, bytes: &[u8], remote_address: Option<SocketAddr>) -> Result<(), Error> {
        if self.state().is_terminal() {
            return Err(Error::Closed);
        }
        match classify(bytes) {
            Classification::Dtls => self.receive_dtls(bytes),
            Classification::Stun => self.receive_stun(bytes, remote_address),
            Classification::Unknown => {
                debug!("dropping {} bytes of unrecognized protocol", bytes.len());
                Ok(())
            }
        }
    }

    fn receive_stun(&self, bytes: &[u8], remote_address: Option<SocketAddr>) -> Result<(), Error> {
        let Some(addr) = remote_address else {
            debug!("dropping STUN datagram with no source address");
            return Ok(());
        };
        if let Some(response) = self.ice.process_stun(bytes, addr) {
            (self.send)(response);
        }
        Ok(())
    }

    fn receive_dtls(&self, bytes: &[u8]) -> Result<(), Error> {
        let (ingress, start_sctp) = self.inner.with(|s| {
            let ingress = s.dtls.process_received_datagram(bytes, None);

            let mut start_sctp = false;
            if ingress.handshake_complete && s.state == ConnectionState::DtlsHandshaking {
                let remote = s.dtls.remote_fingerprint();
                if let (Some(remote), Some(expected)) = (&remote, &s.expected_remote_fingerprint) {
                    if remote != expected {
                        s.state = ConnectionState::Failed("remote DTLS fingerprint mismatch".into());
                        return (ingress, false);
                    }
                }
                s.remote_fingerprint = remote;
                s.state = ConnectionState::SctpConnecting;
                start_sctp = s.role == Role::Client;
            }
            (ingress, start_sctp)
        });

        for datagram in ingress.datagrams_to_send {
            (self.send)(datagram);
        }

        if let ConnectionState::Failed(reason) = self.state() {
            return Err(Error::DtlsHandshakeFailed(reason));
        }

        if start_sctp {
            let init = self.association.initiate();
            self.send_encrypted(&init);
        }

        if !ingress.application_data.is_empty() {
            self.process_sctp(&ingress.application_data)?;
        }

        Ok(())
    }

    fn process_sctp(&self, bytes: &[u8]) -> Result<(), Error> {
        let outcome = self.association.process(bytes, Instant::now())?;

        if self.association.state() == sctp::AssociationState::Established
            && self.state() == ConnectionState::SctpConnecting
        {
            self.inner.with(|s| s.state = ConnectionState::Connected);
        }

        for packet in outcome.response_packets {
            self.send_encrypted(&packet);
        }

        for message in outcome.delivered {
            self.dispatch_message(message)?;
        }

        Ok(())
    }

    fn dispatch_message(&self, message: AssembledMessage) -> Result<(), Error> {
        if message.ppid == dcep::PPID_DCEP {
            let outcome = self
                .channels
                .process(message.stream_id, &message.data)
                .map_err(|err| Error::ConnectionFailed(err.to_string()))?;

            if let Some(response) = outcome.response {
                let packet =
                    self.association
                        .send(message.stream_id, dcep::PPID_DCEP, &response, true, Instant::now());
                self.send_encrypted(&packet);
            }
            if let Some(channel) = outcome.opened {
                self.inner.with(|s| s.incoming_channels.publish(channel));
            }
            return Ok(());
        }

        let handler = self.inner.with(|s| s.data_handler.clone());
        match handler {
            Some(handler) => handler(message.stream_id, message.data),
            None => debug!(
                "no data handler set; dropping {} bytes on stream {}",
                message.data.len(),
                message.stream_id
            ),
        }
        Ok(())
    }

    /// Opens a new outbound data channel, sending DATA_CHANNEL_OPEN on a
    /// freshly allocated stream id.
    pub fn open_data_channel(&self, label: &str, ordered: bool) -> Result<DataChannel, Error> {
        if self.state() != ConnectionState::Connected {
            return Err(Error::InvalidState);
        }
        let (id, open_bytes) = self.channels.open_channel(label, "", ordered);
        let packet = self.association.send(id, dcep::PPID_DCEP, &open_bytes, true, Instant::now());
        self.send_encrypted(&packet);
        Ok(self.channels.channel(id).expect("just inserted"))
    }

    pub fn send(&self, payload: &[u8], stream_id: u16, binary: bool) -> Result<(), Error> {
        if self.state() != ConnectionState::Connected {
            return Err(Error::InvalidState);
        }
        let ppid = match (binary, payload.is_empty()) {
            (true, true) => dcep::PPID_BINARY_EMPTY,
            (true, false) => dcep::PPID_BINARY,
            (false, true) => dcep::PPID_STRING_EMPTY,
            (false, false) => dcep::PPID_STRING,
        };
        let ordered = self
            .channels
            .channel(stream_id)
            .map(|c| c.ordered)
            .unwrap_or(true);

        let packet = self.association.send(stream_id, ppid, payload, ordered, Instant::now());
        self.send_encrypted(&packet);
        Ok(())
    }

    /// Drives RTO-based retransmission; callers invoke this periodically.
    pub fn pending_retransmissions(&self) -> Result<(), Error> {
        let due = self.association.pending_retransmissions(Instant::now())?;
        for packet in due {
            self.send_encrypted(&packet);
        }
        Ok(())
    }

    fn send_encrypted(&self, plaintext: &[u8]) {
        let ciphertext = self.inner.with(|s| s.dtls.write_application_data(plaintext));
        (self.send)(ciphertext);
    }

    pub fn close(&self) {
        self.inner.with(|s| {
            s.state = ConnectionState::Closed;
            s.data_handler = None;
            s.incoming_channels.close();
        });
        self.ice.close();
    }
}
