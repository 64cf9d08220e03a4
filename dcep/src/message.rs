//! DATA_CHANNEL_OPEN / DATA_CHANNEL_ACK codecs (RFC 8832) carried inside
//! SCTP DATA chunks with PPID [`PPID_DCEP`].

use crate::error::Error;

pub const PPID_DCEP: u32 = 50;
pub const PPID_STRING: u32 = 51;
pub const PPID_BINARY: u32 = 53;
pub const PPID_STRING_EMPTY: u32 = 56;
pub const PPID_BINARY_EMPTY: u32 = 57;

const MESSAGE_TYPE_ACK: u8 = 0x02;
const MESSAGE_TYPE_OPEN: u8 = 0x03;

pub const CHANNEL_TYPE_RELIABLE: u8 = 0x00;
pub const CHANNEL_TYPE_RELIABLE_UNORDERED: u8 = 0x80;
pub const CHANNEL_TYPE_PARTIAL_RELIABLE_REXMIT: u8 = 0x01;
pub const CHANNEL_TYPE_PARTIAL_RELIABLE_REXMIT_UNORDERED: u8 = 0x81;
pub const CHANNEL_TYPE_PARTIAL_RELIABLE_TIMED: u8 = 0x02;
pub const CHANNEL_TYPE_PARTIAL_RELIABLE_TIMED_UNORDERED: u8 = 0x82;

const FIXED_LEN: usize = 12;

/// A DATA_CHANNEL_OPEN message. `ordered` is derived from the low bit of
/// `channel_type` (RFC 8832 §5.1: the unordered variants all set `0x80`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOpen {
    pub channel_type: u8,
    pub priority: u16,
    pub reliability_parameter: u32,
    pub label: String,
    pub protocol: String,
}

impl ChannelOpen {
    pub fn ordered(&self) -> bool {
        self.channel_type & CHANNEL_TYPE_RELIABLE_UNORDERED == 0
    }

    pub fn encode(&self) -> Vec<u8> {
        let label = self.label.as_bytes();
        let protocol = self.protocol.as_bytes();

        let mut out = Vec::with_capacity(FIXED_LEN + label.len() + protocol.len());
        out.push(MESSAGE_TYPE_OPEN);
        out.push(self.channel_type);
        out.extend_from_slice(&self.priority.to_be_bytes());
        out.extend_from_slice(&self.reliability_parameter.to_be_bytes());
        out.extend_from_slice(&(label.len() as u16).to_be_bytes());
        out.extend_from_slice(&(protocol.len() as u16).to_be_bytes());
        out.extend_from_slice(label);
        out.extend_from_slice(protocol);
        out
    }

    pub fn decode(input: &[u8]) -> Result<Self, Error> {
        if input.len() < FIXED_LEN {
            return Err(Error::InvalidFormat(format!(
                "DATA_CHANNEL_OPEN must be at least {} bytes, got {}",
                FIXED_LEN,
                input.len()
            )));
        }
        if input[0] != MESSAGE_TYPE_OPEN {
            return Err(Error::InvalidFormat(format!(
                "expected DATA_CHANNEL_OPEN type {:#04x}, got {:#04x}",
                MESSAGE_TYPE_OPEN, input[0]
            )));
        }

        let channel_type = input[1];
        let priority = u16::from_be_bytes([input[2], input[3]]);
        let reliability_parameter =
            u32::from_be_bytes([input[4], input[5], input[6], input[7]]);
        let label_len = u16::from_be_bytes([input[8], input[9]]) as usize;
        let protocol_len = u16::from_be_bytes([input[10], input[11]]) as usize;

        let label_start = FIXED_LEN;
        let protocol_start = label_start + label_len;
        let end = protocol_start + protocol_len;
        if input.len() < end {
            return Err(Error::InvalidFormat(format!(
                "DATA_CHANNEL_OPEN declares {} label + {} protocol bytes but only {} remain",
                label_len,
                protocol_len,
                input.len() - label_start
            )));
        }

        let label = String::from_utf8_lossy(&input[label_start..protocol_start]).into_owned();
        let protocol = String::from_utf8_lossy(&input[protocol_start..end]).into_owned();

        Ok(Self {
            channel_type,
            priority,
            reliability_parameter,
            label,
            protocol,
        })
    }
}

/// DATA_CHANNEL_ACK is a single type byte with no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAck;

impl ChannelAck {
    pub fn encode(&self) -> Vec<u8> {
        vec![MESSAGE_TYPE_ACK]
    }

    pub fn decode(input: &[u8]) -> Result<Self, Error> {
        match input.first() {
            Some(&MESSAGE_TYPE_ACK) => Ok(Self),
            Some(other) => Err(Error::InvalidFormat(format!(
                "expected DATA_CHANNEL_ACK type {:#04x}, got {:#04x}",
                MESSAGE_TYPE_ACK, other
            ))),
            None => Err(Error::InvalidFormat("empty DCEP message".into())),
        }
    }
}

/// A decoded DCEP control message (PPID 50).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DcepMessage {
    Open(ChannelOpen),
    Ack,
}

impl DcepMessage {
    pub fn decode(input: &[u8]) -> Result<Self, Error> {
        match input.first() {
            Some(&0x03) => Ok(Self::Open(ChannelOpen::decode(input)?)),
            Some(&0x02) => {
                ChannelAck::decode(input)?;
                Ok(Self::Ack)
            }
            Some(other) => Err(Error::InvalidFormat(format!(
                "unrecognized DCEP message type {:#04x}",
                other
            ))),
            None => Err(Error::InvalidFormat("empty DCEP message".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let open = ChannelOpen {
            channel_type: CHANNEL_TYPE_RELIABLE,
            priority: 0,
            reliability_parameter: 0,
            label: "chat".into(),
            protocol: String::new(),
        };
        let bytes = open.encode();
        let decoded = ChannelOpen::decode(&bytes).unwrap();
        assert_eq!(decoded, open);
        assert!(decoded.ordered());
    }

    #[test]
    fn unordered_channel_type_is_detected() {
        let open = ChannelOpen {
            channel_type: CHANNEL_TYPE_RELIABLE_UNORDERED,
            priority: 0,
            reliability_parameter: 0,
            label: "voice".into(),
            protocol: "binary".into(),
        };
        assert!(!open.ordered());
        let bytes = open.encode();
        assert_eq!(ChannelOpen::decode(&bytes).unwrap(), open);
    }

    #[test]
    fn ack_round_trip() {
        let bytes = ChannelAck.encode();
        assert_eq!(bytes, vec![0x02]);
        assert_eq!(ChannelAck::decode(&bytes).unwrap(), ChannelAck);
    }

    #[test]
    fn dcep_message_dispatches_by_type() {
        let ack = DcepMessage::decode(&[0x02]).unwrap();
        assert_eq!(ack, DcepMessage::Ack);

        let open = ChannelOpen {
            channel_type: CHANNEL_TYPE_RELIABLE,
            priority: 0,
            reliability_parameter: 0,
            label: "d".into(),
            protocol: "".into(),
        };
        let decoded = DcepMessage::decode(&open.encode()).unwrap();
        assert_eq!(decoded, DcepMessage::Open(open));
    }

    #[test]
    fn truncated_open_is_rejected() {
        let err = ChannelOpen::decode(&[0x03, 0x00]).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
