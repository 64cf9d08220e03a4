use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::chunk::{ChunkBody, TYPE_INIT, TYPE_INIT_ACK};
use crate::error::Error;

pub const PARAM_STATE_COOKIE: u16 = 7;
const FIXED_LEN: usize = 16;

fn encode_parameter(typ: u16, value: &[u8]) -> Vec<u8> {
    let length = 4 + value.len();
    let mut bytes = Vec::with_capacity(length + 3);
    bytes.write_u16::<BigEndian>(typ).unwrap();
    bytes.write_u16::<BigEndian>(length as u16).unwrap();
    bytes.extend_from_slice(value);
    let pad = (4 - (bytes.len() % 4)) % 4;
    bytes.resize(bytes.len() + pad, 0);
    bytes
}

fn find_parameter(input: &[u8], wanted: u16) -> Option<Vec<u8>> {
    let mut offset = 0;
    while offset + 4 <= input.len() {
        let mut cursor = Cursor::new(&input[offset..offset + 4]);
        let typ = cursor.read_u16::<BigEndian>().expect("4 bytes available");
        let length = cursor.read_u16::<BigEndian>().expect("4 bytes available") as usize;
        if length < 4 || offset + length > input.len() {
            return None;
        }
        let value = &input[offset + 4..offset + length];
        if typ == wanted {
            return Some(value.to_vec());
        }
        let padded = length + ((4 - (length % 4)) % 4);
        offset += padded;
    }
    None
}

fn decode_fixed(value: &[u8]) -> Result<(u32, u32, u16, u16, u32), Error> {
    if value.len() < FIXED_LEN {
        return Err(Error::InsufficientData {
            expected: FIXED_LEN,
            actual: value.len(),
        });
    }
    let mut cursor = Cursor::new(value);
    let initiate_tag = cursor.read_u32::<BigEndian>().expect("length checked above");
    let a_rwnd = cursor.read_u32::<BigEndian>().expect("length checked above");
    let outbound_streams = cursor.read_u16::<BigEndian>().expect("length checked above");
    let inbound_streams = cursor.read_u16::<BigEndian>().expect("length checked above");
    let initial_tsn = cursor.read_u32::<BigEndian>().expect("length checked above");
    Ok((initiate_tag, a_rwnd, outbound_streams, inbound_streams, initial_tsn))
}

fn encode_fixed(
    initiate_tag: u32,
    a_rwnd: u32,
    outbound_streams: u16,
    inbound_streams: u16,
    initial_tsn: u32,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(FIXED_LEN);
    out.write_u32::<BigEndian>(initiate_tag).unwrap();
    out.write_u32::<BigEndian>(a_rwnd).unwrap();
    out.write_u16::<BigEndian>(outbound_streams).unwrap();
    out.write_u16::<BigEndian>(inbound_streams).unwrap();
    out.write_u32::<BigEndian>(initial_tsn).unwrap();
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct Init {
    pub initiate_tag: u32,
    pub a_rwnd: u32,
    pub outbound_streams: u16,
    pub inbound_streams: u16,
    pub initial_tsn: u32,
}

impl Init {
    pub fn decode(value: &[u8]) -> Result<Self, Error> {
        let (initiate_tag, a_rwnd, outbound_streams, inbound_streams, initial_tsn) =
            decode_fixed(value)?;
        Ok(Self {
            initiate_tag,
            a_rwnd,
            outbound_streams,
            inbound_streams,
            initial_tsn,
        })
    }
}

impl ChunkBody for Init {
    fn typ(&self) -> u8 {
        TYPE_INIT
    }
    fn flags(&self) -> u8 {
        0
    }
    fn value(&self) -> Vec<u8> {
        encode_fixed(
            self.initiate_tag,
            self.a_rwnd,
            self.outbound_streams,
            self.inbound_streams,
            self.initial_tsn,
        )
    }
}

/// INIT-ACK always carries exactly one mandatory optional parameter in this
/// stack: the opaque State-Cookie (type 7).
#[derive(Debug, Clone, PartialEq)]
pub struct InitAck {
    pub initiate_tag: u32,
    pub a_rwnd: u32,
    pub outbound_streams: u16,
    pub inbound_streams: u16,
    pub initial_tsn: u32,
    pub cookie: Vec<u8>,
}

impl InitAck {
    pub fn decode(value: &[u8]) -> Result<Self, Error> {
        let (initiate_tag, a_rwnd, outbound_streams, inbound_streams, initial_tsn) =
            decode_fixed(value)?;
        let cookie = find_parameter(&value[FIXED_LEN..], PARAM_STATE_COOKIE)
            .ok_or_else(|| Error::InvalidFormat("INIT-ACK missing State-Cookie parameter".into()))?;
        Ok(Self {
            initiate_tag,
            a_rwnd,
            outbound_streams,
            inbound_streams,
            initial_tsn,
            cookie,
        })
    }
}

impl ChunkBody for InitAck {
    fn typ(&self) -> u8 {
        TYPE_INIT_ACK
    }
    fn flags(&self) -> u8 {
        0
    }
    fn value(&self) -> Vec<u8> {
        let mut out = encode_fixed(
            self.initiate_tag,
            self.a_rwnd,
            self.outbound_streams,
            self.inbound_streams,
            self.initial_tsn,
        );
        out.extend(encode_parameter(PARAM_STATE_COOKIE, &self.cookie));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_round_trip() {
        let chunk = Init {
            initiate_tag: 42,
            a_rwnd: 131_072,
            outbound_streams: 10,
            inbound_streams: 10,
            initial_tsn: 9000,
        };
        let bytes = chunk.to_bytes();
        let (decoded, _) = crate::chunk::decode_one(&bytes).unwrap();
        assert_eq!(decoded, crate::chunk::Chunk::Init(chunk));
    }

    #[test]
    fn init_ack_round_trip() {
        let chunk = InitAck {
            initiate_tag: 7,
            a_rwnd: 131_072,
            outbound_streams: 4,
            inbound_streams: 4,
            initial_tsn: 1,
            cookie: vec![9; 60],
        };
        let bytes = chunk.to_bytes();
        let (decoded, _) = crate::chunk::decode_one(&bytes).unwrap();
        assert_eq!(decoded, crate::chunk::Chunk::InitAck(chunk));
    }
}
