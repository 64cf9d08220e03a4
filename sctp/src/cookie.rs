//! The State-Cookie exchanged in INIT-ACK and echoed back in COOKIE-ECHO.
//! Binds the association parameters with an HMAC so a replayed cookie
//! cannot be used to complete a handshake with a different peer.

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SECRET_LEN: usize = 32;
pub const ENCODED_LEN: usize = 60;
const PREFIX_LEN: usize = 28;
const MAX_AGE_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cookie {
    pub timestamp_ms: u64,
    pub peer_tag: u32,
    pub local_tag: u32,
    pub peer_initial_tsn: u32,
    pub peer_a_rwnd: u32,
    pub outbound_streams: u16,
    pub inbound_streams: u16,
}

impl Cookie {
    fn prefix(&self) -> [u8; PREFIX_LEN] {
        let mut out = Vec::with_capacity(PREFIX_LEN);
        out.write_u64::<BigEndian>(self.timestamp_ms).unwrap();
        out.write_u32::<BigEndian>(self.peer_tag).unwrap();
        out.write_u32::<BigEndian>(self.local_tag).unwrap();
        out.write_u32::<BigEndian>(self.peer_initial_tsn).unwrap();
        out.write_u32::<BigEndian>(self.peer_a_rwnd).unwrap();
        out.write_u16::<BigEndian>(self.outbound_streams).unwrap();
        out.write_u16::<BigEndian>(self.inbound_streams).unwrap();
        out.try_into().expect("exactly PREFIX_LEN bytes written")
    }

    pub fn encode(&self, secret: &[u8; SECRET_LEN]) -> [u8; ENCODED_LEN] {
        let prefix = self.prefix();

        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(&prefix);
        let tag = mac.finalize().into_bytes();

        let mut out = [0_u8; ENCODED_LEN];
        out[..PREFIX_LEN].copy_from_slice(&prefix);
        out[PREFIX_LEN..].copy_from_slice(&tag);
        out
    }

    /// Validates the HMAC and the 60-second replay window relative to
    /// `now_ms`, then reconstructs the cookie's fields.
    pub fn decode(bytes: &[u8], secret: &[u8; SECRET_LEN], now_ms: u64) -> Result<Self, Error> {
        if bytes.len() != ENCODED_LEN {
            return Err(Error::InvalidFormat(format!(
                "state cookie must be {} bytes, got {}",
                ENCODED_LEN,
                bytes.len()
            )));
        }

        let prefix = &bytes[..PREFIX_LEN];
        let tag = &bytes[PREFIX_LEN..];

        let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
        mac.update(prefix);
        let expected = mac.finalize().into_bytes();

        if expected.as_slice().ct_eq(tag).unwrap_u8() != 1 {
            return Err(Error::CookieValidationFailed);
        }

        let mut cursor = Cursor::new(prefix);
        let timestamp_ms = cursor.read_u64::<BigEndian>().expect("length checked above");
        let age_ms = now_ms as i64 - timestamp_ms as i64;
        if !(0..=MAX_AGE_MS).contains(&age_ms) {
            return Err(Error::CookieExpired);
        }

        Ok(Self {
            timestamp_ms,
            peer_tag: cursor.read_u32::<BigEndian>().expect("length checked above"),
            local_tag: cursor.read_u32::<BigEndian>().expect("length checked above"),
            peer_initial_tsn: cursor.read_u32::<BigEndian>().expect("length checked above"),
            peer_a_rwnd: cursor.read_u32::<BigEndian>().expect("length checked above"),
            outbound_streams: cursor.read_u16::<BigEndian>().expect("length checked above"),
            inbound_streams: cursor.read_u16::<BigEndian>().expect("length checked above"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Cookie {
        Cookie {
            timestamp_ms: 1_000_000,
            peer_tag: 11,
            local_tag: 22,
            peer_initial_tsn: 500,
            peer_a_rwnd: 131_072,
            outbound_streams: 4,
            inbound_streams: 4,
        }
    }

    #[test]
    fn round_trip_within_window() {
        let secret = [7_u8; SECRET_LEN];
        let cookie = sample();
        let encoded = cookie.encode(&secret);
        assert_eq!(encoded.len(), ENCODED_LEN);

        let decoded = Cookie::decode(&encoded, &secret, 1_010_000).unwrap();
        assert_eq!(decoded, cookie);
    }

    #[test]
    fn rejects_wrong_secret() {
        let cookie = sample();
        let encoded = cookie.encode(&[1_u8; SECRET_LEN]);
        let err = Cookie::decode(&encoded, &[2_u8; SECRET_LEN], 1_000_000).unwrap_err();
        assert_eq!(err, Error::CookieValidationFailed);
    }

    #[test]
    fn rejects_expired_cookie() {
        let secret = [7_u8; SECRET_LEN];
        let cookie = sample();
        let encoded = cookie.encode(&secret);
        let err = Cookie::decode(&encoded, &secret, cookie.timestamp_ms + 61_000).unwrap_err();
        assert_eq!(err, Error::CookieExpired);
    }
}
