use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::chunk::{ChunkBody, TYPE_DATA};
use crate::error::Error;

const FLAG_UNORDERED: u8 = 0b100;
const FLAG_BEGINNING: u8 = 0b010;
const FLAG_ENDING: u8 = 0b001;
const FIXED_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq)]
pub struct Data {
    pub unordered: bool,
    pub beginning: bool,
    pub ending: bool,
    pub tsn: u32,
    pub stream_id: u16,
    pub stream_seq: u16,
    pub ppid: u32,
    pub user_data: Vec<u8>,
}

impl Data {
    pub fn decode(flags: u8, value: &[u8]) -> Result<Self, Error> {
        if value.len() < FIXED_LEN {
            return Err(Error::InsufficientData {
                expected: FIXED_LEN,
                actual: value.len(),
            });
        }

        let mut cursor = Cursor::new(value);
        let tsn = cursor.read_u32::<BigEndian>().expect("length checked above");
        let stream_id = cursor.read_u16::<BigEndian>().expect("length checked above");
        let stream_seq = cursor.read_u16::<BigEndian>().expect("length checked above");
        let ppid = cursor.read_u32::<BigEndian>().expect("length checked above");

        Ok(Self {
            unordered: flags & FLAG_UNORDERED != 0,
            beginning: flags & FLAG_BEGINNING != 0,
            ending: flags & FLAG_ENDING != 0,
            tsn,
            stream_id,
            stream_seq,
            ppid,
            user_data: value[FIXED_LEN..].to_vec(),
        })
    }
}

impl ChunkBody for Data {
    fn typ(&self) -> u8 {
        TYPE_DATA
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.unordered {
            flags |= FLAG_UNORDERED;
        }
        if self.beginning {
            flags |= FLAG_BEGINNING;
        }
        if self.ending {
            flags |= FLAG_ENDING;
        }
        flags
    }

    fn value(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_LEN + self.user_data.len());
        out.write_u32::<BigEndian>(self.tsn).unwrap();
        out.write_u16::<BigEndian>(self.stream_id).unwrap();
        out.write_u16::<BigEndian>(self.stream_seq).unwrap();
        out.write_u32::<BigEndian>(self.ppid).unwrap();
        out.extend_from_slice(&self.user_data);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let chunk = Data {
            unordered: false,
            beginning: true,
            ending: true,
            tsn: 1000,
            stream_id: 0,
            stream_seq: 0,
            ppid: 51,
            user_data: b"hello".to_vec(),
        };
        let bytes = chunk.to_bytes();
        let (decoded, consumed) = crate::chunk::decode_one(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, crate::chunk::Chunk::Data(chunk));
    }
}
