use std::collections::HashSet;
use std::net::SocketAddr;

use log::{debug, warn};
use stun::attribute::message_integrity::IntegrityResult;
use stun::attribute::{Attribute, TYPE_ICE_CONTROLLED};
use stun::header::{Class, Method};
use stun::Message;
use util::{SecureRng, StateLock};

use crate::credentials::Credentials;
use crate::error::ValidationError;
use crate::state::IceState;

struct Inner {
    state: IceState,
    credentials: Credentials,
    validated_peers: HashSet<SocketAddr>,
}

/// Always-controlled ICE agent: it never initiates connectivity checks,
/// only validates incoming binding requests and echoes back
/// XOR-MAPPED-ADDRESS.
pub struct Agent {
    inner: StateLock<Inner>,
    rng: SecureRng,
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}

impl Agent {
    pub fn new() -> Self {
        let rng = SecureRng::new();
        let credentials = Credentials::generate(&rng);
        Self {
            inner: StateLock::new(Inner {
                state: IceState::New,
                credentials,
                validated_peers: HashSet::new(),
            }),
            rng,
        }
    }

    pub fn local_ufrag(&self) -> String {
        self.inner.with(|s| s.credentials.local_ufrag.clone())
    }

    pub fn local_password(&self) -> String {
        self.inner.with(|s| s.credentials.local_password.clone())
    }

    pub fn state(&self) -> IceState {
        self.inner.with(|s| s.state)
    }

    pub fn is_validated(&self, peer: SocketAddr) -> bool {
        self.inner.with(|s| s.validated_peers.contains(&peer))
    }

    /// Set once via out-of-band signaling; re-arms checking from `new`.
    pub fn set_remote_credentials(&self, ufrag: String, password: String) {
        self.inner.with(|s| {
            s.credentials.set_remote(ufrag, password);
            if s.state == IceState::New {
                s.state = IceState::Checking;
            }
        });
    }

    pub fn complete(&self) {
        self.inner.with(|s| {
            if s.state.can_transition_to(IceState::Completed) {
                s.state = IceState::Completed;
            }
        });
    }

    pub fn fail(&self) {
        self.inner.with(|s| {
            if s.state.can_transition_to(IceState::Failed) {
                s.state = IceState::Failed;
            }
        });
    }

    pub fn close(&self) {
        self.inner.with(|s| {
            if s.state.can_transition_to(IceState::Closed) {
                s.state = IceState::Closed;
            }
            s.validated_peers.clear();
        });
    }

    /// Process one inbound datagram already known to be STUN; returns the
    /// response bytes to send back, if any.
    pub fn process_stun(
        &self,
        bytes: &[u8],
        src_addr: SocketAddr,
    ) -> Option<Vec<u8>> {
        if !stun::looks_like_stun(bytes) {
            return None;
        }

        let request = match Message::decode(bytes) {
            Ok(m) => m,
            Err(err) => {
                debug!("dropping undecodable STUN message from {}: {}", src_addr, err);
                return None;
            }
        };

        if request.header.class != Class::Request || request.header.method != Method::Binding {
            return None;
        }

        match self.validate(&request) {
            Ok(()) => Some(self.build_success_response(&request, src_addr)),
            Err(err) => Some(self.build_error_response(&request, err)),
        }
    }

    fn validate(&self, request: &Message) -> Result<(), ValidationError> {
        let (local_ufrag, local_password, remote_ufrag) = self.inner.with(|s| {
            (
                s.credentials.local_ufrag.clone(),
                s.credentials.local_password.clone(),
                s.credentials.remote_ufrag.clone(),
            )
        });

        let username = match request.get_attribute(stun::attribute::TYPE_USERNAME) {
            Some(Attribute::Username(u)) => u.as_str().to_owned(),
            _ => return Err(ValidationError::MissingUsername),
        };

        let mut parts = username.splitn(2, ':');
        let (req_remote_ufrag, req_local_ufrag) = match (parts.next(), parts.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => return Err(ValidationError::InvalidUsernameFormat),
        };

        if req_local_ufrag != local_ufrag {
            return Err(ValidationError::LocalUfragMismatch);
        }
        if let Some(expected_remote) = &remote_ufrag {
            if req_remote_ufrag != expected_remote {
                return Err(ValidationError::LocalUfragMismatch);
            }
        }

        if request.get_attribute(stun::attribute::TYPE_FINGERPRINT).is_some() {
            match request.verify_fingerprint() {
                Some(true) => {}
                _ => return Err(ValidationError::FingerprintVerificationFailed),
            }
        }

        match request.verify_integrity(local_password.as_bytes()) {
            IntegrityResult::Valid => {}
            IntegrityResult::Invalid => return Err(ValidationError::InvalidMessageIntegrity),
            IntegrityResult::Missing => return Err(ValidationError::MissingMessageIntegrity),
        }

        if request.get_attribute(TYPE_ICE_CONTROLLED).is_some() {
            return Err(ValidationError::RoleConflict);
        }

        Ok(())
    }

    fn build_success_response(&self, request: &Message, src_addr: SocketAddr) -> Vec<u8> {
        let local_password = self.inner.with(|s| {
            s.validated_peers.insert(src_addr);
            if s.state.can_transition_to(IceState::Connected) {
                s.state = IceState::Connected;
            }
            s.credentials.local_password.clone()
        });

        let xor_mapped = stun::attribute::XorMappedAddress::new(src_addr.ip(), src_addr.port());

        Message::new(Class::Success, Method::Binding, *request.transaction_id())
            .and_attribute(Attribute::XorMappedAddress(xor_mapped))
            .with_message_integrity(local_password.as_bytes())
            .with_fingerprint()
            .to_bytes()
    }

    fn build_error_response(&self, request: &Message, err: ValidationError) -> Vec<u8> {
        warn!("rejecting STUN binding request: {}", err);
        let local_password = self.inner.with(|s| s.credentials.local_password.clone());
        stun::Message::error_response(request, err.stun_code(), err.reason(), local_password.as_bytes())
            .to_bytes()
    }
}

impl Agent {
    /// A fresh transaction id for a message this agent originates (error
    /// responses reuse the request's id instead).
    pub fn new_transaction_id(&self) -> [u8; 12] {
        self.rng.random_array::<12>()
    }
}
