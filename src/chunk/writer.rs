use log::trace;
use crate::chunk::{encode_basic_header, ChunkFormat, ChunkStream};
use crate::protocol::{RtmpMessage, DEFAULT_CHUNK_SIZE, EXTENDED_TIMESTAMP_MARKER};
use crate::{ByteBuffer, Error, Result};

const MAX_MESSAGE_LENGTH: usize = 0x00FF_FFFF;

pub struct ChunkWriter {
    /// Current chunk size for writing
    chunk_size_out: usize,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkWriter {
    pub fn new() -> Self {
        ChunkWriter {
            chunk_size_out: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set outgoing chunk size
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size_out = size;
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_out
    }

    /// Split `message` into chunks on `stream`.
    ///
    /// The first chunk always carries a full fmt 0 header, every following
    /// chunk is fmt 3. An empty payload still yields one header-only chunk.
    pub fn write_message(&self, stream: &mut ChunkStream, message: &RtmpMessage) -> Result<Vec<u8>> {
        let payload_len = message.payload.len();
        if payload_len > MAX_MESSAGE_LENGTH {
            return Err(Error::protocol_violation(format!(
                "message of {} bytes does not fit a 24-bit length",
                payload_len
            )));
        }
        if message.timestamp >= EXTENDED_TIMESTAMP_MARKER {
            return Err(Error::unsupported_feature(format!(
                "timestamp {} needs an extended timestamp field",
                message.timestamp
            )));
        }

        let first = encode_basic_header(ChunkFormat::Full, stream.csid)?;
        let continuation = encode_basic_header(ChunkFormat::Continuation, stream.csid)?;

        let chunk_size = self.chunk_size_out.max(1);
        let num_chunks = payload_len.div_ceil(chunk_size).max(1);
        let mut buffer = ByteBuffer::with_capacity(12 + payload_len + num_chunks);

        buffer.write_u8(first)?;
        buffer.write_u24_be(message.timestamp)?;
        buffer.write_u24_be(payload_len as u32)?;
        buffer.write_u8(message.message_type_id)?;
        buffer.write_u32_be(message.message_stream_id)?;

        for (i, piece) in message.payload.chunks(chunk_size).enumerate() {
            if i > 0 {
                buffer.write_u8(continuation)?;
            }
            buffer.write_bytes(piece)?;
        }

        stream.last_fmt = if num_chunks > 1 { ChunkFormat::Continuation } else { ChunkFormat::Full };
        stream.last_timestamp = message.timestamp;
        stream.last_message_length = payload_len as u32;
        stream.last_message_type_id = message.message_type_id;
        stream.last_msg_stream_id = message.message_stream_id;

        trace!(
            "csid {}: type {} length {} in {} chunk(s)",
            stream.csid, message.message_type_id, payload_len, num_chunks
        );
        Ok(buffer.into_vec())
    }
}
