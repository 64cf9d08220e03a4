//! Certificate ownership. Generation and signing live in the DTLS layer
//! (an external collaborator); this crate only carries the fingerprint the
//! orchestrator exchanges over signaling and verifies after the handshake.

use util::SecureRng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    fingerprint: String,
}

impl Certificate {
    /// Wraps a fingerprint produced elsewhere, e.g. `"sha-256 AB:CD:..."`.
    pub fn new(fingerprint: String) -> Self {
        Self { fingerprint }
    }

    /// A placeholder fingerprint for endpoints that don't supply their own
    /// certificate; real certificate issuance belongs to the DTLS layer.
    pub fn generate() -> Self {
        let rng = SecureRng::new();
        let digest = rng.random_bytes(32);
        let hex: Vec<String> = digest.iter().map(|b| format!("{:02X}", b)).collect();
        Self {
            fingerprint: format!("sha-256 {}", hex.join(":")),
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_fingerprints_differ() {
        let a = Certificate::generate();
        let b = Certificate::generate();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert!(a.fingerprint().starts_with("sha-256 "));
    }
}
