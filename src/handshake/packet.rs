use crate::utils::generate_random_bytes;
use crate::{ByteBuffer, Error, Result};

/// RTMP version carried by C0/S0
pub const RTMP_VERSION: u8 = 3;

/// Handshake packet size (C1/S1/C2/S2)
pub const HANDSHAKE_SIZE: usize = 1536;

/// Bytes after the two time fields
pub const HANDSHAKE_PAYLOAD_SIZE: usize = HANDSHAKE_SIZE - 8;

/// One of C1/S1/C2/S2: `time`, `time2`, then 1528 bytes of payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakePacket {
    pub time: u32,
    pub time2: u32,
    pub payload: Vec<u8>,
}

impl HandshakePacket {
    /// C1: both time fields zero, random fill
    pub fn client_hello() -> Self {
        HandshakePacket {
            time: 0,
            time2: 0,
            payload: generate_random_bytes(HANDSHAKE_PAYLOAD_SIZE),
        }
    }

    /// Echo of `other`: its time first, then `time2`, then its payload
    pub fn echo(other: &HandshakePacket, time2: u32) -> Self {
        HandshakePacket {
            time: other.time,
            time2,
            payload: other.payload.clone(),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() != HANDSHAKE_SIZE {
            return Err(Error::protocol_violation(format!(
                "handshake packet is {} bytes, expected {}",
                data.len(),
                HANDSHAKE_SIZE
            )));
        }

        let mut buffer = ByteBuffer::new(data.to_vec());
        let time = buffer.read_u32_be()?;
        let time2 = buffer.read_u32_be()?;
        let payload = buffer.read_bytes(HANDSHAKE_PAYLOAD_SIZE)?;

        Ok(HandshakePacket { time, time2, payload })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.payload.len() != HANDSHAKE_PAYLOAD_SIZE {
            return Err(Error::protocol_violation(format!(
                "handshake payload is {} bytes, expected {}",
                self.payload.len(),
                HANDSHAKE_PAYLOAD_SIZE
            )));
        }

        let mut buffer = ByteBuffer::with_capacity(HANDSHAKE_SIZE);
        buffer.write_u32_be(self.time)?;
        buffer.write_u32_be(self.time2)?;
        buffer.write_bytes(&self.payload)?;
        Ok(buffer.into_vec())
    }
}
