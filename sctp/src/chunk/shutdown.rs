use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::chunk::{ChunkBody, TYPE_SHUTDOWN};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shutdown {
    pub cumulative_tsn_ack: u32,
}

impl Shutdown {
    pub fn decode(value: &[u8]) -> Result<Self, Error> {
        if value.len() < 4 {
            return Err(Error::InsufficientData {
                expected: 4,
                actual: value.len(),
            });
        }
        let mut cursor = Cursor::new(value);
        Ok(Self {
            cumulative_tsn_ack: cursor.read_u32::<BigEndian>().expect("length checked above"),
        })
    }
}

impl ChunkBody for Shutdown {
    fn typ(&self) -> u8 {
        TYPE_SHUTDOWN
    }
    fn flags(&self) -> u8 {
        0
    }
    fn value(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4);
        out.write_u32::<BigEndian>(self.cumulative_tsn_ack).unwrap();
        out
    }
}
