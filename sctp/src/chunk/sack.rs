use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::chunk::{ChunkBody, TYPE_SACK};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapBlock {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sack {
    pub cumulative_tsn_ack: u32,
    pub a_rwnd: u32,
    pub gap_blocks: Vec<GapBlock>,
    pub duplicate_tsns: Vec<u32>,
}

impl Sack {
    pub fn decode(value: &[u8]) -> Result<Self, Error> {
        if value.len() < 12 {
            return Err(Error::InsufficientData {
                expected: 12,
                actual: value.len(),
            });
        }
        let mut cursor = Cursor::new(value);
        let cumulative_tsn_ack = cursor.read_u32::<BigEndian>().expect("length checked above");
        let a_rwnd = cursor.read_u32::<BigEndian>().expect("length checked above");
        let num_gap_blocks = cursor.read_u16::<BigEndian>().expect("length checked above") as usize;
        let num_dups = cursor.read_u16::<BigEndian>().expect("length checked above") as usize;

        let mut gap_blocks = Vec::with_capacity(num_gap_blocks);
        for _ in 0..num_gap_blocks {
            let start = cursor.read_u16::<BigEndian>().map_err(|_| Error::InsufficientData {
                expected: cursor.position() as usize + 4,
                actual: value.len(),
            })?;
            let end = cursor.read_u16::<BigEndian>().map_err(|_| Error::InsufficientData {
                expected: cursor.position() as usize + 2,
                actual: value.len(),
            })?;
            gap_blocks.push(GapBlock { start, end });
        }

        let mut duplicate_tsns = Vec::with_capacity(num_dups);
        for _ in 0..num_dups {
            let tsn = cursor.read_u32::<BigEndian>().map_err(|_| Error::InsufficientData {
                expected: cursor.position() as usize + 4,
                actual: value.len(),
            })?;
            duplicate_tsns.push(tsn);
        }

        Ok(Self {
            cumulative_tsn_ack,
            a_rwnd,
            gap_blocks,
            duplicate_tsns,
        })
    }
}

impl ChunkBody for Sack {
    fn typ(&self) -> u8 {
        TYPE_SACK
    }
    fn flags(&self) -> u8 {
        0
    }
    fn value(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.gap_blocks.len() * 4 + self.duplicate_tsns.len() * 4);
        out.write_u32::<BigEndian>(self.cumulative_tsn_ack).unwrap();
        out.write_u32::<BigEndian>(self.a_rwnd).unwrap();
        out.write_u16::<BigEndian>(self.gap_blocks.len() as u16).unwrap();
        out.write_u16::<BigEndian>(self.duplicate_tsns.len() as u16).unwrap();
        for block in &self.gap_blocks {
            out.write_u16::<BigEndian>(block.start).unwrap();
            out.write_u16::<BigEndian>(block.end).unwrap();
        }
        for tsn in &self.duplicate_tsns {
            out.write_u32::<BigEndian>(*tsn).unwrap();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_with_gaps() {
        let chunk = Sack {
            cumulative_tsn_ack: 1000,
            a_rwnd: 131_072,
            gap_blocks: vec![GapBlock { start: 2, end: 2 }],
            duplicate_tsns: vec![1001],
        };
        let bytes = chunk.to_bytes();
        let (decoded, _) = crate::chunk::decode_one(&bytes).unwrap();
        assert_eq!(decoded, crate::chunk::Chunk::Sack(chunk));
    }

    #[test]
    fn round_trip_no_gaps() {
        let chunk = Sack {
            cumulative_tsn_ack: 1000,
            a_rwnd: 131_072,
            gap_blocks: vec![],
            duplicate_tsns: vec![],
        };
        let bytes = chunk.to_bytes();
        let (decoded, _) = crate::chunk::decode_one(&bytes).unwrap();
        assert_eq!(decoded, crate::chunk::Chunk::Sack(chunk));
    }
}
