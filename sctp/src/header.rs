use std::io::Cursor;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;

pub const HEADER_LEN: usize = 12;

/// The 12-byte common header prefixing every SCTP packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub src_port: u16,
    pub dst_port: u16,
    pub verification_tag: u32,
}

impl Header {
    pub fn new(src_port: u16, dst_port: u16, verification_tag: u32) -> Self {
        Self {
            src_port,
            dst_port,
            verification_tag,
        }
    }

    /// Encodes with the checksum field zeroed; the packet codec fills it in
    /// once the full datagram is assembled.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = Vec::with_capacity(HEADER_LEN);
        out.write_u16::<BigEndian>(self.src_port).unwrap();
        out.write_u16::<BigEndian>(self.dst_port).unwrap();
        out.write_u32::<BigEndian>(self.verification_tag).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.try_into().expect("exactly HEADER_LEN bytes written")
    }

    pub fn decode(input: &[u8]) -> Result<(Self, u32), Error> {
        if input.len() < HEADER_LEN {
            return Err(Error::InsufficientData {
                expected: HEADER_LEN,
                actual: input.len(),
            });
        }

        let mut cursor = Cursor::new(input);
        let src_port = cursor.read_u16::<BigEndian>().expect("length checked above");
        let dst_port = cursor.read_u16::<BigEndian>().expect("length checked above");
        let verification_tag = cursor.read_u32::<BigEndian>().expect("length checked above");
        let checksum = cursor
            .read_u32::<LittleEndian>()
            .expect("length checked above");

        Ok((
            Self {
                src_port,
                dst_port,
                verification_tag,
            },
            checksum,
        ))
    }
}
