//! Entry point: owns the certificate and the set of listeners and
//! connections a caller creates against it.

use std::sync::Arc;

use util::StateLock;

use crate::certificate::Certificate;
use crate::connection::{Connection, SendFn};
use crate::dtls::DtlsTransport;
use crate::listener::Listener;
use crate::state::Role;

#[derive(Default)]
struct Inner {
    connections: Vec<Arc<Connection>>,
    listeners: Vec<Arc<Listener>>,
}

pub struct Endpoint {
    certificate: Certificate,
    inner: StateLock<Inner>,
}

impl Endpoint {
    /// Generates a placeholder certificate if none is supplied.
    pub fn create(certificate: Option<Certificate>) -> Self {
        Self {
            certificate: certificate.unwrap_or_else(Certificate::generate),
            inner: StateLock::new(Inner::default()),
        }
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// A client connection verifying `remote_fingerprint` once the DTLS
    /// handshake completes.
    pub fn connect(
        &self,
        remote_fingerprint: String,
        dtls: Box<dyn DtlsTransport>,
        send: SendFn,
    ) -> Arc<Connection> {
        let connection = Arc::new(Connection::new(Role::Client, &self.certificate, dtls, send));
        connection.set_expected_remote_fingerprint(remote_fingerprint);
        self.inner.with(|s| s.connections.push(connection.clone()));
        connection
    }

    pub fn listen(&self) -> Arc<Listener> {
        let listener = Arc::new(Listener::new(self.certificate.clone()));
        self.inner.with(|s| s.listeners.push(listener.clone()));
        listener
    }

    pub fn close(&self) {
        self.inner.with(|s| {
            for connection in &s.connections {
                connection.close();
            }
            for listener in &s.listeners {
                listener.close();
            }
        });
    }
}
