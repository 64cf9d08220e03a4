//! Process-wide CSPRNG wrapper. Every random draw the stack makes —
//! verification tags, initial TSNs, transaction IDs, cookie secrets,
//! ICE ufrag/password characters — goes through here.

use rand::rngs::OsRng;
use rand::RngCore;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Thin wrapper around the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureRng;

impl SecureRng {
    pub fn new() -> Self {
        Self
    }

    pub fn fill_bytes(&self, buf: &mut [u8]) {
        OsRng.fill_bytes(buf);
    }

    pub fn random_bytes(&self, len: usize) -> Vec<u8> {
        let mut buf = vec![0_u8; len];
        self.fill_bytes(&mut buf);
        buf
    }

    pub fn random_u32(&self) -> u32 {
        OsRng.next_u32()
    }

    pub fn random_array<const N: usize>(&self) -> [u8; N] {
        let mut buf = [0_u8; N];
        self.fill_bytes(&mut buf);
        buf
    }

    /// 62-symbol alphanumeric string, drawn by rejection sampling so every
    /// symbol keeps an equal probability: a random byte `>= 248` (the
    /// largest multiple of 62 below 256) is rejected and redrawn instead of
    /// reduced modulo 62, which would bias the first 62 - (256 mod 62)
    /// symbols.
    pub fn random_alphanumeric(&self, len: usize) -> String {
        debug_assert_eq!(ALPHANUMERIC.len(), 62);
        const REJECT_AT_OR_ABOVE: u8 = 248;

        let mut out = String::with_capacity(len);
        let mut byte = [0_u8; 1];
        while out.len() < len {
            self.fill_bytes(&mut byte);
            if byte[0] >= REJECT_AT_OR_ABOVE {
                continue;
            }
            let idx = (byte[0] % 62) as usize;
            out.push(ALPHANUMERIC[idx] as char);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alphabet_membership() {
        let rng = SecureRng::new();
        let s = rng.random_alphanumeric(256);
        assert_eq!(s.len(), 256);
        assert!(s.bytes().all(|b| ALPHANUMERIC.contains(&b)));
    }

    #[test]
    fn distinct_draws_differ() {
        let rng = SecureRng::new();
        let a = rng.random_alphanumeric(24);
        let b = rng.random_alphanumeric(24);
        assert_ne!(a, b);
    }
}
