use std::io::{Cursor, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::checksum::crc32c;
use crate::chunk::{self, Chunk};
use crate::error::Error;
use crate::header::{Header, HEADER_LEN};

#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub header: Header,
    pub chunks: Vec<Chunk>,
}

impl Packet {
    pub fn new(header: Header, chunks: Vec<Chunk>) -> Self {
        Self { header, chunks }
    }

    /// Encodes the packet with the checksum field computed over the whole
    /// datagram as though it were four zero bytes, then stored little-endian
    /// (RFC 4960 §6.8 / Appendix B).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.header.encode().to_vec();
        for chunk in &self.chunks {
            bytes.extend(chunk.to_bytes());
        }

        let checksum = crc32c(&bytes);
        let mut checksum_field = Cursor::new(&mut bytes[8..12]);
        checksum_field.write_u32::<LittleEndian>(checksum).unwrap();
        bytes
    }

    pub fn decode(input: &[u8], validate_checksum: bool) -> Result<Self, Error> {
        let (header, checksum) = Header::decode(input)?;

        if validate_checksum {
            let mut zeroed = input.to_vec();
            zeroed[8..12].fill(0);
            let computed = crc32c(&zeroed);
            if computed != checksum {
                return Err(Error::ChecksumMismatch {
                    expected: checksum,
                    actual: computed,
                });
            }
        }

        let chunks = chunk::decode_all(&input[HEADER_LEN..])?;
        Ok(Self { header, chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, Data};

    #[test]
    fn round_trip_with_checksum() {
        let packet = Packet::new(
            Header::new(5000, 5001, 0xdead_beef),
            vec![Chunk::Data(Data {
                unordered: false,
                beginning: true,
                ending: true,
                tsn: 1000,
                stream_id: 0,
                stream_seq: 0,
                ppid: 51,
                user_data: b"hello".to_vec(),
            })],
        );

        let bytes = packet.to_bytes();
        let decoded = Packet::decode(&bytes, true).unwrap();
        assert_eq!(decoded.header.src_port, 5000);
        assert_eq!(decoded.header.dst_port, 5001);
        assert_eq!(decoded.header.verification_tag, 0xdead_beef);
        assert_eq!(decoded.chunks, packet.chunks);
    }

    #[test]
    fn bit_flip_breaks_checksum() {
        let packet = Packet::new(Header::new(1, 2, 3), vec![Chunk::CookieAck]);
        let mut bytes = packet.to_bytes();
        bytes[13] ^= 0xFF;
        assert!(matches!(
            Packet::decode(&bytes, true),
            Err(Error::ChecksumMismatch { .. })
        ));
    }
}
