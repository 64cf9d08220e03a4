use hmac::{Hmac, Mac};
use nom::bytes::complete::take;
use nom::combinator::all_consuming;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::attribute::{Tlv, TYPE_MESSAGE_INTEGRITY};
use crate::error::Error;

type HmacSha1 = Hmac<Sha1>;

pub const LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIntegrity(pub [u8; LEN]);

impl MessageIntegrity {
    pub fn new(value: [u8; LEN]) -> Self {
        Self(value)
    }

    pub(crate) fn decode(value: &[u8]) -> Result<Self, Error> {
        let (_, raw) = all_consuming(take(LEN))(value).map_err(|_| Error::InsufficientData {
            expected: LEN,
            actual: value.len(),
        })?;
        let mut buf = [0_u8; LEN];
        buf.copy_from_slice(raw);
        Ok(Self(buf))
    }

    pub fn compute(signed_region: &[u8], key: &[u8]) -> Self {
        let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length");
        mac.update(signed_region);
        let code = mac.finalize().into_bytes();
        let mut buf = [0_u8; LEN];
        buf.copy_from_slice(&code);
        Self(buf)
    }

    pub fn verify(&self, signed_region: &[u8], key: &[u8]) -> bool {
        let expected = Self::compute(signed_region, key);
        expected.0.ct_eq(&self.0).into()
    }
}

impl Tlv for MessageIntegrity {
    fn typ(&self) -> u16 {
        TYPE_MESSAGE_INTEGRITY
    }

    fn value(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

/// Tri-valued verification result: the caller needs to distinguish "the
/// attribute was absent" from "the attribute was present but wrong".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityResult {
    Valid,
    Invalid,
    Missing,
}
