use std::convert::TryInto;

use nom::bytes::complete::take;
use nom::combinator::rest;
use nom::number::complete::be_u8;
use nom::sequence::tuple;
use nom::IResult;
use num_enum::TryFromPrimitive;

use crate::attribute::{Tlv, TYPE_ERROR_CODE};
use crate::error::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, TryFromPrimitive)]
#[repr(u16)]
pub enum NumericCode {
    // 0-299: (Reserved)
    TryAlternate = 300,
    // 301-399: (Unassigned)
    BadRequest = 400,
    Unauthenticated = 401,
    // 402: (Unassigned)
    Forbidden = 403,
    // 404: (Unassigned)
    MobilityForbidden = 405,
    // 406-419: (Unassigned)
    UnknownAttribute = 420,
    // 421-436: (Unassigned)
    AllocationMismatch = 437,
    StaleNonce = 438,
    // 439: (Unassigned)
    AddressFamilyNotSupported = 440,
    WrongCredentials = 441,
    UnsupportedTransportProtocol = 442,
    PeerAddressFamilyMismatch = 443,
    // 444-445: (Unassigned)
    ConnectionAlreadyExists = 446,
    ConnectionTimeoutOrFailure = 447,
    // 448-485: (Unassigned)
    AllocationQuotaReached = 486,
    RoleConflict = 487,
    // 488-499: (Unassigned)
    ServerError = 500,
    // 501-507: (Unassigned)
    InsufficientCapacity = 508,
    // 509-699: (Unassigned)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode {
    pub numeric_code: NumericCode,
    pub reason_phrase: String,
}

impl ErrorCode {
    pub fn new(numeric_code: NumericCode, reason_phrase: &str) -> Self {
        Self {
            numeric_code,
            reason_phrase: reason_phrase.to_owned(),
        }
    }

    pub(crate) fn decode(value: &[u8]) -> Result<Self, Error> {
        let (_, (class_byte, number, reason_bytes)) = parse(value).map_err(|_| {
            Error::InsufficientData {
                expected: 4,
                actual: value.len(),
            }
        })?;

        let class = (class_byte & 0b0000_0111) as u16;
        let number = number as u16;
        let numeric_code = (class * 100 + number)
            .try_into()
            .map_err(|_| Error::InvalidFormat(format!("unknown error code {}{:02}", class, number)))?;

        let reason_phrase = String::from_utf8(reason_bytes.to_vec())
            .map_err(|_| Error::InvalidFormat("error reason phrase is not valid UTF-8".into()))?
            .trim_end_matches('\0')
            .to_owned();

        Ok(Self {
            numeric_code,
            reason_phrase,
        })
    }
}

impl Tlv for ErrorCode {
    fn typ(&self) -> u16 {
        TYPE_ERROR_CODE
    }

    fn value(&self) -> Vec<u8> {
        let code = self.numeric_code as u16;
        let class = (code / 100) as u8;
        let number = (code % 100) as u8;

        let mut value = vec![0, 0, class, number];
        value.extend_from_slice(self.reason_phrase.as_bytes());
        value
    }
}

/// Two reserved bytes, then a byte whose low 3 bits hold the error class,
/// then the error number, then the (possibly zero-padded) reason phrase.
fn parse(input: &[u8]) -> IResult<&[u8], (u8, u8, &[u8])> {
    let (input, (_reserved, class_byte, number, reason)) =
        tuple((take(2_usize), be_u8, be_u8, rest))(input)?;
    Ok((input, (class_byte, number, reason)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let original = ErrorCode::new(NumericCode::RoleConflict, "Role Conflict");
        let value = original.value();
        let decoded = ErrorCode::decode(&value).unwrap();
        assert_eq!(decoded, original);
    }
}
