use log::debug;
use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u32};
use nom::sequence::tuple;
use nom::IResult;

use crate::error::Error;

pub const MAGIC_COOKIE: u32 = 0x_2112_A442;
pub const HEADER_LEN: usize = 20;
pub const TRANSACTION_ID_LEN: usize = 12;

pub type TransactionId = [u8; TRANSACTION_ID_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Request,
    Indication,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Binding,
}

//         0                 1
//         2  3  4 5 6 7 8 9 0 1 2 3 4 5
//
//        +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
//        |M |M |M|M|M|C|M|M|M|C|M|M|M|M|
//        |11|10|9|8|7|1|6|5|4|0|3|2|1|0|
//        +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
//
// Figure 3: Format of STUN Message Type Field
//
// https://tools.ietf.org/html/rfc5389#section-6
fn decode_message_type(raw: u16) -> Result<(Class, Method), Error> {
    if raw & 0b_1100_0000_0000_0000 != 0 {
        return Err(Error::InvalidFormat(
            "message type high two bits must be zero".into(),
        ));
    }

    let c0 = (raw >> 4) & 0b1;
    let c1 = (raw >> 8) & 0b1;
    let m_3_0 = raw & 0b_1111;
    let m_6_4 = (raw >> 5) & 0b111;
    let m_11_7 = (raw >> 9) & 0b_1_1111;

    let class_bits = (c1 << 1) | c0;
    let class = match class_bits {
        0b00 => Class::Request,
        0b01 => Class::Indication,
        0b10 => Class::Success,
        0b11 => Class::Error,
        _ => unreachable!(),
    };

    let method_bits = (m_11_7 << 6) | (m_6_4 << 3) | m_3_0;
    let method = match method_bits {
        0b_0000_0000_0001 => Method::Binding,
        other => return Err(Error::InvalidFormat(format!("unknown method {:#x}", other))),
    };

    Ok((class, method))
}

fn encode_message_type(class: Class, method: Method) -> u16 {
    let c = match class {
        Class::Request => 0b00_u16,
        Class::Indication => 0b01,
        Class::Success => 0b10,
        Class::Error => 0b11,
    };
    let m = match method {
        Method::Binding => 0b_0000_0000_0001_u16,
    };

    let c0 = c & 0b01;
    let c1 = (c & 0b10) >> 1;
    let m_3_0 = m & 0b_1111;
    let m_6_4 = (m & 0b_0111_0000) >> 4;
    let m_11_7 = (m & 0b_1111_1000_0000) >> 7;

    (m_11_7 << 9) | (c1 << 8) | (m_6_4 << 5) | (c0 << 4) | m_3_0
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub class: Class,
    pub method: Method,
    /// Length of the body in bytes, excluding this 20-byte header.
    pub length: u16,
    pub transaction_id: TransactionId,
}

impl Header {
    pub fn new(class: Class, method: Method, transaction_id: TransactionId) -> Self {
        Self {
            class,
            method,
            length: 0,
            transaction_id,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0_u8; HEADER_LEN];
        out[0..2].copy_from_slice(&encode_message_type(self.class, self.method).to_be_bytes());
        out[2..4].copy_from_slice(&self.length.to_be_bytes());
        out[4..8].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        out[8..20].copy_from_slice(&self.transaction_id);
        out
    }

    pub fn decode(input: &[u8]) -> Result<Self, Error> {
        let (_, (raw_type, length, cookie, raw_transaction_id)) = parse(input).map_err(|err| {
            debug!("failed to parse STUN header: {:?}", err);
            Error::InsufficientData {
                expected: HEADER_LEN,
                actual: input.len(),
            }
        })?;

        let (class, method) = decode_message_type(raw_type)?;

        if cookie != MAGIC_COOKIE {
            debug!("STUN header carried wrong magic cookie {:#010x}", cookie);
            return Err(Error::InvalidMagicCookie(cookie));
        }

        let mut transaction_id = [0_u8; TRANSACTION_ID_LEN];
        transaction_id.copy_from_slice(raw_transaction_id);

        Ok(Self {
            class,
            method,
            length,
            transaction_id,
        })
    }
}

fn parse(input: &[u8]) -> IResult<&[u8], (u16, u16, u32, &[u8])> {
    tuple((be_u16, be_u16, be_u32, take(TRANSACTION_ID_LEN)))(input)
}

/// `len >= 20 && (first_byte & 0xC0) == 0`. Demultiplexing at higher layers
/// refines this against the DTLS range before treating a match as STUN.
pub fn looks_like_stun(bytes: &[u8]) -> bool {
    bytes.len() >= HEADER_LEN && (bytes[0] & 0xC0) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = Header {
            class: Class::Success,
            method: Method::Binding,
            length: 0,
            transaction_id: [0; 12],
        };
        let encoded = header.encode();
        let decoded = Header::decode(&encoded).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn rejects_bad_magic_cookie() {
        let mut bytes = Header {
            class: Class::Request,
            method: Method::Binding,
            length: 0,
            transaction_id: [0; 12],
        }
        .encode();
        bytes[4] ^= 0xFF;
        assert!(matches!(
            Header::decode(&bytes),
            Err(Error::InvalidMagicCookie(_))
        ));
    }
}
