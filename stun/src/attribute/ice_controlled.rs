use nom::combinator::{all_consuming, map};
use nom::number::complete::be_u64;

use crate::attribute::{Tlv, TYPE_ICE_CONTROLLED};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IceControlled(pub u64);

impl IceControlled {
    pub(crate) fn decode(value: &[u8]) -> Result<Self, Error> {
        let (_, attr) = all_consuming(map(be_u64, Self))(value).map_err(|_| {
            Error::InsufficientData {
                expected: 8,
                actual: value.len(),
            }
        })?;
        Ok(attr)
    }
}

impl Tlv for IceControlled {
    fn typ(&self) -> u16 {
        TYPE_ICE_CONTROLLED
    }

    fn value(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }
}
