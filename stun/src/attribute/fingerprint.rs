use crc::{Crc, CRC_32_ISO_HDLC};
use nom::combinator::{all_consuming, map};
use nom::number::complete::be_u32;

use crate::attribute::{Tlv, TYPE_FINGERPRINT};
use crate::error::Error;

const XOR_CONSTANT: u32 = 0x_5354_554E;
const CRC32_IEEE: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint(pub u32);

impl Fingerprint {
    pub(crate) fn decode(value: &[u8]) -> Result<Self, Error> {
        let (_, fingerprint) = all_consuming(map(be_u32, Self))(value).map_err(|_| {
            Error::InsufficientData {
                expected: 4,
                actual: value.len(),
            }
        })?;
        Ok(fingerprint)
    }

    /// CRC-32 (IEEE 802.3 polynomial) of `signed_region`, XORed with the
    /// STUN FINGERPRINT constant.
    pub fn compute(signed_region: &[u8]) -> Self {
        let checksum = CRC32_IEEE.checksum(signed_region);
        Self(checksum ^ XOR_CONSTANT)
    }

    pub fn verify(&self, signed_region: &[u8]) -> bool {
        *self == Self::compute(signed_region)
    }
}

impl Tlv for Fingerprint {
    fn typ(&self) -> u16 {
        TYPE_FINGERPRINT
    }

    fn value(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }
}
