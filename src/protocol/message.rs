use crate::protocol::constants::*;

/// One complete RTMP message, as handed to the chunker or produced by the
/// dechunker once every chunk of it has arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtmpMessage {
    pub message_type_id: u8,
    pub message_stream_id: u32,
    pub timestamp: u32,
    pub payload: Vec<u8>,
}

impl RtmpMessage {
    pub fn new(message_type_id: u8, message_stream_id: u32, timestamp: u32, payload: Vec<u8>) -> Self {
        RtmpMessage {
            message_type_id,
            message_stream_id,
            timestamp,
            payload,
        }
    }

    /// Declared message length, which is always the payload length
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    pub fn is_audio(&self) -> bool {
        self.message_type_id == MSG_TYPE_AUDIO
    }

    pub fn is_video(&self) -> bool {
        self.message_type_id == MSG_TYPE_VIDEO
    }

    pub fn is_command(&self) -> bool {
        self.message_type_id == MSG_TYPE_COMMAND_AMF0
    }

    pub fn is_control(&self) -> bool {
        matches!(
            self.message_type_id,
            MSG_TYPE_SET_CHUNK_SIZE | MSG_TYPE_WINDOW_ACK | MSG_TYPE_SET_PEER_BW
        )
    }
}
