mod stream;
mod reader;
mod writer;

pub use stream::*;
pub use reader::*;
pub use writer::*;

use crate::protocol::MAX_ONE_BYTE_CSID;
use crate::{Error, Result};

/// The 2-bit `fmt` selector of a chunk basic header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFormat {
    /// fmt 0: timestamp, length, type id, message stream id
    Full,
    /// fmt 1: timestamp, length, type id
    NoStreamId,
    /// fmt 2: timestamp only
    TimestampOnly,
    /// fmt 3: nothing, everything is inherited
    Continuation,
}

impl ChunkFormat {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ChunkFormat::Full,
            1 => ChunkFormat::NoStreamId,
            2 => ChunkFormat::TimestampOnly,
            _ => ChunkFormat::Continuation,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            ChunkFormat::Full => 0,
            ChunkFormat::NoStreamId => 1,
            ChunkFormat::TimestampOnly => 2,
            ChunkFormat::Continuation => 3,
        }
    }

    /// Size of the message header that follows the basic header
    pub fn message_header_len(self) -> usize {
        match self {
            ChunkFormat::Full => 11,
            ChunkFormat::NoStreamId => 7,
            ChunkFormat::TimestampOnly => 3,
            ChunkFormat::Continuation => 0,
        }
    }
}

/// Header fields actually present on the wire for one chunk.
/// Absent fields are inherited from the owning chunk stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub fmt: ChunkFormat,
    pub csid: u32,
    pub timestamp: Option<u32>,
    pub message_length: Option<u32>,
    pub message_type_id: Option<u8>,
    pub message_stream_id: Option<u32>,
}

impl ChunkHeader {
    /// Bytes occupied on the wire: basic header plus message header
    pub fn wire_len(&self) -> usize {
        1 + self.fmt.message_header_len()
    }
}

/// Split a one-byte basic header into `fmt` and `csid`.
///
/// csid values 0 and 1 announce the 2- and 3-byte forms, which are not
/// supported; they are returned as-is.
pub fn parse_basic_header(byte: u8) -> (ChunkFormat, u32) {
    (ChunkFormat::from_bits(byte >> 6), (byte & 0x3F) as u32)
}

/// Build a one-byte basic header
pub fn encode_basic_header(fmt: ChunkFormat, csid: u32) -> Result<u8> {
    if !(2..=MAX_ONE_BYTE_CSID).contains(&csid) {
        return Err(Error::unsupported_feature(format!(
            "chunk stream id {} needs an extended basic header",
            csid
        )));
    }
    Ok((fmt.bits() << 6) | (csid as u8 & 0x3F))
}
