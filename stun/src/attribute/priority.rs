use nom::combinator::{all_consuming, map};
use nom::number::complete::be_u32;

use crate::attribute::{Tlv, TYPE_PRIORITY};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Priority(pub u32);

impl Priority {
    pub(crate) fn decode(value: &[u8]) -> Result<Self, Error> {
        let (_, attr) = all_consuming(map(be_u32, Self))(value).map_err(|_| {
            Error::InsufficientData {
                expected: 4,
                actual: value.len(),
            }
        })?;
        Ok(attr)
    }
}

impl Tlv for Priority {
    fn typ(&self) -> u16 {
        TYPE_PRIORITY
    }

    fn value(&self) -> Vec<u8> {
        self.0.to_be_bytes().to_vec()
    }
}
