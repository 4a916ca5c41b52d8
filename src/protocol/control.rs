use crate::protocol::constants::*;
use crate::{ByteBuffer, Error, Result};

/// Protocol control messages carried on chunk stream 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// New maximum chunk size for the sender's subsequent chunks
    SetChunkSize(u32),

    /// Window acknowledgement size
    WindowAckSize(u32),

    /// Peer bandwidth with optional limit type (0 hard, 1 soft, 2 dynamic)
    SetPeerBandwidth { window: u32, limit_type: Option<u8> },
}

impl ControlMessage {
    /// Parse a control payload by message type id
    pub fn parse(message_type_id: u8, payload: &[u8]) -> Result<Self> {
        let mut buffer = ByteBuffer::new(payload.to_vec());
        let mut value = || {
            buffer.read_u32_be().map_err(|_| {
                Error::protocol_violation(format!(
                    "Control message type {} needs 4 bytes, got {}",
                    message_type_id,
                    payload.len()
                ))
            })
        };

        match message_type_id {
            MSG_TYPE_SET_CHUNK_SIZE => {
                let size = value()? & MAX_CHUNK_SIZE;
                if size == 0 {
                    return Err(Error::protocol_violation("Set Chunk Size of 0"));
                }
                Ok(ControlMessage::SetChunkSize(size))
            }
            MSG_TYPE_WINDOW_ACK => Ok(ControlMessage::WindowAckSize(value()?)),
            MSG_TYPE_SET_PEER_BW => {
                let window = value()?;
                let limit_type = payload.get(4).copied();
                Ok(ControlMessage::SetPeerBandwidth { window, limit_type })
            }
            other => Err(Error::UnsupportedMessageType(other)),
        }
    }

    pub fn message_type_id(&self) -> u8 {
        match self {
            ControlMessage::SetChunkSize(_) => MSG_TYPE_SET_CHUNK_SIZE,
            ControlMessage::WindowAckSize(_) => MSG_TYPE_WINDOW_ACK,
            ControlMessage::SetPeerBandwidth { .. } => MSG_TYPE_SET_PEER_BW,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(5);
        match *self {
            ControlMessage::SetChunkSize(size) => {
                bytes.extend_from_slice(&(size & 0x7FFF_FFFF).to_be_bytes())
            }
            ControlMessage::WindowAckSize(size) => bytes.extend_from_slice(&size.to_be_bytes()),
            ControlMessage::SetPeerBandwidth { window, limit_type } => {
                bytes.extend_from_slice(&window.to_be_bytes());
                bytes.push(limit_type.unwrap_or(2));
            }
        }
        bytes
    }
}
