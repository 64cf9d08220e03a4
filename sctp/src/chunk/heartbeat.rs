use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::chunk::{ChunkBody, TYPE_HEARTBEAT};
use crate::error::Error;

const PARAM_HEARTBEAT_INFO: u16 = 1;

/// Shared body for HEARTBEAT and HEARTBEAT-ACK: an opaque info parameter
/// the peer is expected to echo back verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    pub info: Vec<u8>,
}

impl Heartbeat {
    pub fn new(info: Vec<u8>) -> Self {
        Self { info }
    }

    pub fn decode(value: &[u8]) -> Result<Self, Error> {
        if value.len() < 4 {
            return Err(Error::InsufficientData {
                expected: 4,
                actual: value.len(),
            });
        }
        let mut cursor = Cursor::new(&value[2..4]);
        let length = cursor.read_u16::<BigEndian>().expect("length checked above") as usize;
        if length < 4 || value.len() < length {
            return Err(Error::InvalidFormat(
                "HEARTBEAT info parameter length out of range".into(),
            ));
        }
        Ok(Self {
            info: value[4..length].to_vec(),
        })
    }
}

impl ChunkBody for Heartbeat {
    fn typ(&self) -> u8 {
        TYPE_HEARTBEAT
    }
    fn flags(&self) -> u8 {
        0
    }
    fn value(&self) -> Vec<u8> {
        let length = 4 + self.info.len();
        let mut out = Vec::with_capacity(length + 3);
        out.write_u16::<BigEndian>(PARAM_HEARTBEAT_INFO).unwrap();
        out.write_u16::<BigEndian>(length as u16).unwrap();
        out.extend_from_slice(&self.info);
        let pad = (4 - (out.len() % 4)) % 4;
        out.resize(out.len() + pad, 0);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echoes_verbatim() {
        let chunk = Heartbeat::new(b"ping-nonce".to_vec());
        let bytes = chunk.to_bytes();
        let (decoded, _) = crate::chunk::decode_one(&bytes).unwrap();
        assert_eq!(decoded, crate::chunk::Chunk::Heartbeat(chunk));
    }
}
