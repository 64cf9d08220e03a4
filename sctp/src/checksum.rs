//! CRC-32C (Castagnoli, polynomial 0x1EDC6F41 reflected to 0x82F63B78), the
//! checksum SCTP uses in place of the classic CRC-32 IEEE. Implemented as
//! slicing-by-8 since the packet codec runs on every ingress and egress
//! datagram.

use std::sync::OnceLock;

const POLY: u32 = 0x_82F6_3B78;

fn tables() -> &'static [[u32; 256]; 8] {
    static TABLES: OnceLock<[[u32; 256]; 8]> = OnceLock::new();
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> [[u32; 256]; 8] {
    let mut tables = [[0_u32; 256]; 8];

    for (i, slot) in tables[0].iter_mut().enumerate() {
        let mut crc = i as u32;
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
        *slot = crc;
    }

    for i in 0..256 {
        let mut crc = tables[0][i];
        for slice in 1..8 {
            crc = tables[0][(crc & 0xFF) as usize] ^ (crc >> 8);
            tables[slice][i] = crc;
        }
    }

    tables
}

/// CRC-32C over `data`, starting from the all-ones initial value and
/// complemented on the way out, per the standard CRC-32C definition.
pub fn crc32c(data: &[u8]) -> u32 {
    let tables = tables();
    let mut crc = u32::MAX;

    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        let word = crc
            ^ u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let hi = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);

        crc = tables[7][(word & 0xFF) as usize]
            ^ tables[6][((word >> 8) & 0xFF) as usize]
            ^ tables[5][((word >> 16) & 0xFF) as usize]
            ^ tables[4][((word >> 24) & 0xFF) as usize]
            ^ tables[3][(hi & 0xFF) as usize]
            ^ tables[2][((hi >> 8) & 0xFF) as usize]
            ^ tables[1][((hi >> 16) & 0xFF) as usize]
            ^ tables[0][((hi >> 24) & 0xFF) as usize];
    }

    for &byte in chunks.remainder() {
        let idx = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = tables[0][idx] ^ (crc >> 8);
    }

    !crc
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 3720 §12.1 test vectors.
    #[test]
    fn rfc3720_vectors() {
        assert_eq!(crc32c(&[0u8; 32]), 0x_8a91_36aa);
        assert_eq!(crc32c(&[0xffu8; 32]), 0x_62a8_ab43);

        let ramp: Vec<u8> = (0..32u8).collect();
        assert_eq!(crc32c(&ramp), 0x_46dd_794e);

        let mut down: Vec<u8> = (0..32u8).collect();
        down.reverse();
        assert_eq!(crc32c(&down), 0x_113f_db5c);
    }

    #[test]
    fn empty_input() {
        assert_eq!(crc32c(&[]), 0);
    }
}
