//! Owns the `peerId -> Connection` registry for server-side connections and
//! publishes freshly accepted ones on an incoming-connections sequence.

use std::collections::HashMap;
use std::sync::Arc;

use util::{sequence, Consumer, Producer, StateLock};

use crate::certificate::Certificate;
use crate::connection::{Connection, SendFn};
use crate::dtls::DtlsTransport;
use crate::state::Role;

struct Inner {
    connections: HashMap<String, Arc<Connection>>,
    incoming: Producer<Arc<Connection>>,
    closed: bool,
}

pub struct Listener {
    certificate: Certificate,
    inner: StateLock<Inner>,
    incoming_consumer: Consumer<Arc<Connection>>,
}

impl Listener {
    pub(crate) fn new(certificate: Certificate) -> Self {
        let (producer, consumer) = sequence();
        Self {
            certificate,
            inner: StateLock::new(Inner {
                connections: HashMap::new(),
                incoming: producer,
                closed: false,
            }),
            incoming_consumer: consumer,
        }
    }

    pub fn local_fingerprint(&self) -> &str {
        self.certificate.fingerprint()
    }

    pub fn connections(&self) -> &Consumer<Arc<Connection>> {
        &self.incoming_consumer
    }

    /// Returns the existing connection for `peer_id` if present; otherwise
    /// constructs a server connection, registers it, and publishes it.
    pub fn accept_connection(
        &self,
        peer_id: String,
        dtls: Box<dyn DtlsTransport>,
        send: SendFn,
    ) -> Option<Arc<Connection>> {
        self.inner.with(|s| {
            if s.closed {
                return None;
            }
            if let Some(existing) = s.connections.get(&peer_id) {
                return Some(existing.clone());
            }
            let connection = Arc::new(Connection::new(Role::Server, &self.certificate, dtls, send));
            s.connections.insert(peer_id, connection.clone());
            s.incoming.publish(connection.clone());
            Some(connection)
        })
    }

    pub fn connection(&self, peer_id: &str) -> Option<Arc<Connection>> {
        self.inner.with(|s| s.connections.get(peer_id).cloned())
    }

    pub fn remove_connection(&self, peer_id: &str) {
        self.inner.with(|s| {
            if let Some(connection) = s.connections.remove(peer_id) {
                connection.close();
            }
        });
    }

    pub fn close(&self) {
        self.inner.with(|s| {
            s.closed = true;
            for connection in s.connections.values() {
                connection.close();
            }
            s.connections.clear();
            s.incoming.close();
        });
    }
}
