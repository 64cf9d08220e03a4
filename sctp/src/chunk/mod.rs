pub mod cookie_echo;
pub mod data;
pub mod heartbeat;
pub mod init;
pub mod sack;
pub mod shutdown;

use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;

pub use cookie_echo::CookieEcho;
pub use data::Data;
pub use heartbeat::Heartbeat;
pub use init::{Init, InitAck};
pub use sack::Sack;
pub use shutdown::Shutdown;

pub const TYPE_DATA: u8 = 0;
pub const TYPE_INIT: u8 = 1;
pub const TYPE_INIT_ACK: u8 = 2;
pub const TYPE_SACK: u8 = 3;
pub const TYPE_HEARTBEAT: u8 = 4;
pub const TYPE_HEARTBEAT_ACK: u8 = 5;
pub const TYPE_SHUTDOWN: u8 = 7;
pub const TYPE_SHUTDOWN_ACK: u8 = 8;
pub const TYPE_COOKIE_ECHO: u8 = 10;
pub const TYPE_COOKIE_ACK: u8 = 11;

/// Shared shape of a chunk body: type, flags, and a TLV-style value padded
/// to a 4-byte boundary on the wire (the `length` field itself is not
/// padded, matching the chunk header convention in RFC 4960 §3.2).
pub trait ChunkBody {
    fn typ(&self) -> u8;
    fn flags(&self) -> u8;
    fn value(&self) -> Vec<u8>;

    fn to_bytes(&self) -> Vec<u8> {
        let value = self.value();
        let length = 4 + value.len();
        let mut bytes = Vec::with_capacity(length + 3);
        bytes.push(self.typ());
        bytes.push(self.flags());
        bytes.write_u16::<BigEndian>(length as u16).unwrap();
        bytes.extend_from_slice(&value);
        let pad = (4 - (bytes.len() % 4)) % 4;
        bytes.resize(bytes.len() + pad, 0);
        bytes
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Data(Data),
    Init(Init),
    InitAck(InitAck),
    Sack(Sack),
    CookieEcho(CookieEcho),
    CookieAck,
    Heartbeat(Heartbeat),
    HeartbeatAck(Heartbeat),
    Shutdown(Shutdown),
    ShutdownAck,
    Unknown { typ: u8, flags: u8, value: Vec<u8> },
}

impl Chunk {
    pub fn typ(&self) -> u8 {
        match self {
            Self::Data(_) => TYPE_DATA,
            Self::Init(_) => TYPE_INIT,
            Self::InitAck(_) => TYPE_INIT_ACK,
            Self::Sack(_) => TYPE_SACK,
            Self::CookieEcho(_) => TYPE_COOKIE_ECHO,
            Self::CookieAck => TYPE_COOKIE_ACK,
            Self::Heartbeat(_) => TYPE_HEARTBEAT,
            Self::HeartbeatAck(_) => TYPE_HEARTBEAT_ACK,
            Self::Shutdown(_) => TYPE_SHUTDOWN,
            Self::ShutdownAck => TYPE_SHUTDOWN_ACK,
            Self::Unknown { typ, .. } => *typ,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Data(c) => c.to_bytes(),
            Self::Init(c) => c.to_bytes(),
            Self::InitAck(c) => c.to_bytes(),
            Self::Sack(c) => c.to_bytes(),
            Self::CookieEcho(c) => c.to_bytes(),
            Self::CookieAck => EmptyChunk(TYPE_COOKIE_ACK).to_bytes(),
            Self::Heartbeat(c) => c.to_bytes(),
            Self::HeartbeatAck(c) => HeartbeatAckBody(c.clone()).to_bytes(),
            Self::Shutdown(c) => c.to_bytes(),
            Self::ShutdownAck => EmptyChunk(TYPE_SHUTDOWN_ACK).to_bytes(),
            Self::Unknown { typ, flags, value } => UnknownChunk {
                typ: *typ,
                flags: *flags,
                value: value.clone(),
            }
            .to_bytes(),
        }
    }
}

struct EmptyChunk(u8);

impl ChunkBody for EmptyChunk {
    fn typ(&self) -> u8 {
        self.0
    }
    fn flags(&self) -> u8 {
        0
    }
    fn value(&self) -> Vec<u8> {
        Vec::new()
    }
}

struct HeartbeatAckBody(Heartbeat);

impl ChunkBody for HeartbeatAckBody {
    fn typ(&self) -> u8 {
        TYPE_HEARTBEAT_ACK
    }
    fn flags(&self) -> u8 {
        0
    }
    fn value(&self) -> Vec<u8> {
        self.0.value()
    }
}

struct UnknownChunk {
    typ: u8,
    flags: u8,
    value: Vec<u8>,
}

impl ChunkBody for UnknownChunk {
    fn typ(&self) -> u8 {
        self.typ
    }
    fn flags(&self) -> u8 {
        self.flags
    }
    fn value(&self) -> Vec<u8> {
        self.value.clone()
    }
}

/// Decode one chunk TLV, returning it and the number of bytes consumed
/// (header + padded value).
pub fn decode_one(input: &[u8]) -> Result<(Chunk, usize), Error> {
    if input.len() < 4 {
        return Err(Error::InsufficientData {
            expected: 4,
            actual: input.len(),
        });
    }

    let mut cursor = Cursor::new(input);
    let typ = cursor.read_u8().expect("length checked above");
    let flags = cursor.read_u8().expect("length checked above");
    let length = cursor.read_u16::<BigEndian>().expect("length checked above") as usize;
    if length < 4 {
        return Err(Error::InvalidFormat(format!(
            "chunk length {} shorter than chunk header",
            length
        )));
    }
    let padded_len = length + ((4 - (length % 4)) % 4);
    if input.len() < padded_len {
        return Err(Error::InsufficientData {
            expected: padded_len,
            actual: input.len(),
        });
    }

    let value = &input[4..length];
    let chunk = match typ {
        TYPE_DATA => Chunk::Data(Data::decode(flags, value)?),
        TYPE_INIT => Chunk::Init(Init::decode(value)?),
        TYPE_INIT_ACK => Chunk::InitAck(InitAck::decode(value)?),
        TYPE_SACK => Chunk::Sack(Sack::decode(value)?),
        TYPE_COOKIE_ECHO => Chunk::CookieEcho(CookieEcho::decode(value)),
        TYPE_COOKIE_ACK => Chunk::CookieAck,
        TYPE_HEARTBEAT => Chunk::Heartbeat(Heartbeat::decode(value)?),
        TYPE_HEARTBEAT_ACK => Chunk::HeartbeatAck(Heartbeat::decode(value)?),
        TYPE_SHUTDOWN => Chunk::Shutdown(Shutdown::decode(value)?),
        TYPE_SHUTDOWN_ACK => Chunk::ShutdownAck,
        other => Chunk::Unknown {
            typ: other,
            flags,
            value: value.to_vec(),
        },
    };

    Ok((chunk, padded_len))
}

pub fn decode_all(input: &[u8]) -> Result<Vec<Chunk>, Error> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < input.len() {
        let (chunk, consumed) = decode_one(&input[offset..])?;
        chunks.push(chunk);
        offset += consumed;
    }
    Ok(chunks)
}
