pub mod error_code;
pub mod fingerprint;
pub mod ice_controlled;
pub mod ice_controlling;
pub mod message_integrity;
pub mod priority;
pub mod use_candidate;
pub mod username;
pub mod xor_mapped_address;

use log::debug;
use nom::multi::length_data;
use nom::number::complete::be_u16;
use nom::sequence::tuple;
use nom::IResult;

use crate::error::Error;

pub use error_code::ErrorCode;
pub use fingerprint::Fingerprint;
pub use ice_controlled::IceControlled;
pub use ice_controlling::IceControlling;
pub use message_integrity::MessageIntegrity;
pub use priority::Priority;
pub use use_candidate::UseCandidate;
pub use username::Username;
pub use xor_mapped_address::XorMappedAddress;

// Attribute Registry
// https://www.iana.org/assignments/stun-parameters/stun-parameters.xhtml
pub const TYPE_USERNAME: u16 = 0x_0006;
pub const TYPE_MESSAGE_INTEGRITY: u16 = 0x_0008;
pub const TYPE_ERROR_CODE: u16 = 0x_0009;
pub const TYPE_XOR_MAPPED_ADDRESS: u16 = 0x_0020;
pub const TYPE_PRIORITY: u16 = 0x_0024;
pub const TYPE_USE_CANDIDATE: u16 = 0x_0025;
pub const TYPE_FINGERPRINT: u16 = 0x_8028;
pub const TYPE_ICE_CONTROLLED: u16 = 0x_8029;
pub const TYPE_ICE_CONTROLLING: u16 = 0x_802A;

/// Shared shape of a STUN attribute: type-length-value, padded to a 4-byte
/// boundary on the wire but not in the `length` field itself.
pub trait Tlv {
    fn typ(&self) -> u16;
    fn value(&self) -> Vec<u8>;

    fn to_bytes(&self) -> Vec<u8> {
        let value = self.value();
        let mut bytes = Vec::with_capacity(4 + value.len() + 3);
        bytes.extend_from_slice(&self.typ().to_be_bytes());
        bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
        bytes.extend_from_slice(&value);
        let pad = (4 - (bytes.len() % 4)) % 4;
        bytes.resize(bytes.len() + pad, 0);
        bytes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    Username(Username),
    MessageIntegrity(MessageIntegrity),
    ErrorCode(ErrorCode),
    XorMappedAddress(XorMappedAddress),
    Priority(Priority),
    UseCandidate(UseCandidate),
    Fingerprint(Fingerprint),
    IceControlled(IceControlled),
    IceControlling(IceControlling),
    Unknown { typ: u16, value: Vec<u8> },
}

impl Attribute {
    pub fn typ(&self) -> u16 {
        match self {
            Self::Username(a) => a.typ(),
            Self::MessageIntegrity(a) => a.typ(),
            Self::ErrorCode(a) => a.typ(),
            Self::XorMappedAddress(a) => a.typ(),
            Self::Priority(a) => a.typ(),
            Self::UseCandidate(a) => a.typ(),
            Self::Fingerprint(a) => a.typ(),
            Self::IceControlled(a) => a.typ(),
            Self::IceControlling(a) => a.typ(),
            Self::Unknown { typ, .. } => *typ,
        }
    }

    pub fn value(&self) -> Vec<u8> {
        match self {
            Self::Username(a) => a.value(),
            Self::MessageIntegrity(a) => a.value(),
            Self::ErrorCode(a) => a.value(),
            Self::XorMappedAddress(a) => a.value(),
            Self::Priority(a) => a.value(),
            Self::UseCandidate(a) => a.value(),
            Self::Fingerprint(a) => a.value(),
            Self::IceControlled(a) => a.value(),
            Self::IceControlling(a) => a.value(),
            Self::Unknown { value, .. } => value.clone(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Username(a) => a.to_bytes(),
            Self::MessageIntegrity(a) => a.to_bytes(),
            Self::ErrorCode(a) => a.to_bytes(),
            Self::XorMappedAddress(a) => a.to_bytes(),
            Self::Priority(a) => a.to_bytes(),
            Self::UseCandidate(a) => a.to_bytes(),
            Self::Fingerprint(a) => a.to_bytes(),
            Self::IceControlled(a) => a.to_bytes(),
            Self::IceControlling(a) => a.to_bytes(),
            Self::Unknown { typ, value } => {
                let stub = UnknownTlv {
                    typ: *typ,
                    value: value.clone(),
                };
                stub.to_bytes()
            }
        }
    }
}

struct UnknownTlv {
    typ: u16,
    value: Vec<u8>,
}

impl Tlv for UnknownTlv {
    fn typ(&self) -> u16 {
        self.typ
    }

    fn value(&self) -> Vec<u8> {
        self.value.clone()
    }
}

/// Parse the TLV header (type, length-prefixed value) shared by every
/// attribute, leaving padding untouched for the caller to account for.
fn tlv_header(input: &[u8]) -> IResult<&[u8], (u16, &[u8])> {
    tuple((be_u16, length_data(be_u16)))(input)
}

/// Decode one attribute TLV from `input`, returning it and the number of
/// bytes consumed (header + padded value). XOR-MAPPED-ADDRESS values come
/// back un-XORed against an all-zero transaction id; callers that need the
/// real address should go through [`decode_all`] instead.
pub fn decode_one(input: &[u8]) -> Result<(Attribute, usize), Error> {
    let (_, (typ, value)) = tlv_header(input).map_err(|err| {
        debug!("failed to parse STUN attribute TLV header: {:?}", err);
        Error::InsufficientData {
            expected: 4,
            actual: input.len(),
        }
    })?;

    let len = value.len();
    let padded_len = len + ((4 - (len % 4)) % 4);
    let consumed = 4 + padded_len;

    if input.len() < consumed {
        return Err(Error::InsufficientData {
            expected: consumed,
            actual: input.len(),
        });
    }

    let attribute: Result<Attribute, Error> = match typ {
        TYPE_USERNAME => Username::decode(value).map(Attribute::Username),
        TYPE_MESSAGE_INTEGRITY => MessageIntegrity::decode(value).map(Attribute::MessageIntegrity),
        TYPE_ERROR_CODE => ErrorCode::decode(value).map(Attribute::ErrorCode),
        TYPE_XOR_MAPPED_ADDRESS => {
            XorMappedAddress::decode(value, &[0; 12]).map(Attribute::XorMappedAddress)
        }
        TYPE_PRIORITY => Priority::decode(value).map(Attribute::Priority),
        TYPE_USE_CANDIDATE => UseCandidate::decode(value).map(Attribute::UseCandidate),
        TYPE_FINGERPRINT => Fingerprint::decode(value).map(Attribute::Fingerprint),
        TYPE_ICE_CONTROLLED => IceControlled::decode(value).map(Attribute::IceControlled),
        TYPE_ICE_CONTROLLING => IceControlling::decode(value).map(Attribute::IceControlling),
        other => Ok(Attribute::Unknown {
            typ: other,
            value: value.to_vec(),
        }),
    };
    let attribute = attribute.map_err(|err| {
        debug!("failed to decode STUN attribute {:#06x}: {}", typ, err);
        err
    })?;

    Ok((attribute, consumed))
}

/// Decode every attribute TLV in `input`, re-deriving XOR-MAPPED-ADDRESS
/// against the message's transaction id.
pub fn decode_all(input: &[u8], transaction_id: &[u8; 12]) -> Result<Vec<Attribute>, Error> {
    let mut attributes = Vec::new();
    let mut offset = 0;
    while offset < input.len() {
        let (attribute, consumed) = decode_one(&input[offset..])?;
        let attribute = if let Attribute::XorMappedAddress(_) = &attribute {
            let (_, (_, value)) =
                tlv_header(&input[offset..]).expect("decode_one already validated this TLV");
            Attribute::XorMappedAddress(XorMappedAddress::decode(value, transaction_id)?)
        } else {
            attribute
        };
        attributes.push(attribute);
        offset += consumed;
    }
    Ok(attributes)
}
