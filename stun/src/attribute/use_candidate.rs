use nom::combinator::eof;

use crate::attribute::{Tlv, TYPE_USE_CANDIDATE};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UseCandidate;

impl UseCandidate {
    pub(crate) fn decode(value: &[u8]) -> Result<Self, Error> {
        eof(value)
            .map(|_| Self)
            .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| {
                Error::InvalidFormat("USE-CANDIDATE carries no value".into())
            })
    }
}

impl Tlv for UseCandidate {
    fn typ(&self) -> u16 {
        TYPE_USE_CANDIDATE
    }

    fn value(&self) -> Vec<u8> {
        vec![]
    }
}
