use nom::combinator::{all_consuming, map_res, rest};

use crate::attribute::{Tlv, TYPE_USERNAME};
use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub fn new(value: &str) -> Self {
        Self(value.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn decode(value: &[u8]) -> Result<Self, Error> {
        let (_, s) = all_consuming(map_res(rest, |b: &[u8]| String::from_utf8(b.to_vec())))(value)
            .map_err(|_| Error::InvalidFormat("USERNAME is not valid UTF-8".into()))?;
        Ok(Self(s))
    }
}

impl Tlv for Username {
    fn typ(&self) -> u16 {
        TYPE_USERNAME
    }

    fn value(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}
