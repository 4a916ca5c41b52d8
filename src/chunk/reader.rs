use log::{debug, warn};
use crate::chunk::{parse_basic_header, ChunkFormat, ChunkHeader, ChunkStreamRegistry, Direction, Reassembly};
use crate::protocol::{RtmpMessage, DEFAULT_CHUNK_SIZE, EXTENDED_TIMESTAMP_MARKER};
use crate::{ByteBuffer, Error};

/// What a single decoded chunk produced
#[derive(Debug)]
pub enum ChunkOutcome {
    /// Payload was buffered; the message needs more chunks
    Partial,
    /// A full message is ready for dispatch
    Message(RtmpMessage),
    /// The message was thrown away but the byte stream is still in sync
    Dropped(Error),
}

/// One chunk taken off the front of the receive buffer
#[derive(Debug)]
pub struct DecodedChunk {
    pub header: ChunkHeader,
    /// Bytes of input covered by this chunk, headers included
    pub consumed: usize,
    pub outcome: ChunkOutcome,
}

/// Turns raw bytes into messages, one chunk at a time.
///
/// The reader holds no byte buffer of its own. Callers pass whatever they
/// have buffered and consume `DecodedChunk::consumed` bytes afterwards.
pub struct ChunkReader {
    chunk_size_in: usize,
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkReader {
    pub fn new() -> Self {
        ChunkReader {
            chunk_size_in: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the incoming chunk size; takes effect from the next chunk
    pub fn set_chunk_size(&mut self, size: usize) {
        debug!("Incoming chunk size {} -> {}", self.chunk_size_in, size);
        self.chunk_size_in = size;
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size_in
    }

    /// Decode the chunk at the front of `data`.
    ///
    /// Returns `None` when `data` does not yet hold the whole chunk. In that
    /// case no stream state is touched and the same bytes can be offered
    /// again once more have arrived.
    pub fn read_chunk(&self, streams: &mut ChunkStreamRegistry, data: &[u8]) -> Option<DecodedChunk> {
        let first = *data.first()?;
        let (fmt, csid) = parse_basic_header(first);

        let header_len = 1 + fmt.message_header_len();
        if data.len() < header_len {
            return None;
        }
        let header = parse_message_header(fmt, csid, &data[1..header_len]);

        let stream = streams.get_or_create(csid, Direction::Receive);

        let length = header.message_length.unwrap_or(stream.last_message_length) as usize;
        // A header carrying a length while a message is in flight starts over
        let restart = header.message_length.is_some() && stream.is_assembling();
        let buffered = if restart { 0 } else { stream.buffered() };

        let whole = length <= self.chunk_size_in && buffered == 0;
        let payload_len = if whole {
            length
        } else {
            self.chunk_size_in.min(length.saturating_sub(buffered))
        };

        let consumed = header_len + payload_len;
        if data.len() < consumed {
            return None;
        }

        if csid < 2 {
            warn!("{}", Error::unsupported_feature(format!(
                "extended basic header (csid {}), treating the id literally", csid
            )));
        }
        if header.timestamp == Some(EXTENDED_TIMESTAMP_MARKER) {
            warn!("{}", Error::unsupported_feature(format!(
                "extended timestamp on csid {}, the field is not read", csid
            )));
        }
        if restart {
            warn!(
                "csid {}: new message header with {} of {} bytes still pending, discarding them",
                csid,
                stream.buffered(),
                stream.last_message_length
            );
            stream.reset_reassembly();
        }

        stream.apply_header(&header);
        let payload = &data[header_len..consumed];

        let outcome = if whole {
            ChunkOutcome::Message(RtmpMessage::new(
                stream.last_message_type_id,
                stream.last_msg_stream_id,
                stream.last_timestamp,
                payload.to_vec(),
            ))
        } else {
            match stream.append(payload) {
                Reassembly::Pending => ChunkOutcome::Partial,
                Reassembly::Complete(payload) => ChunkOutcome::Message(RtmpMessage::new(
                    stream.last_message_type_id,
                    stream.last_msg_stream_id,
                    stream.last_timestamp,
                    payload,
                )),
                Reassembly::Dropped(err) => ChunkOutcome::Dropped(err),
            }
        };

        Some(DecodedChunk { header, consumed, outcome })
    }
}

/// Parse the message header. `bytes` is exactly `fmt.message_header_len()` long.
fn parse_message_header(fmt: ChunkFormat, csid: u32, bytes: &[u8]) -> ChunkHeader {
    let mut header = ChunkHeader {
        fmt,
        csid,
        timestamp: None,
        message_length: None,
        message_type_id: None,
        message_stream_id: None,
    };

    let mut buffer = ByteBuffer::new(bytes.to_vec());
    if fmt != ChunkFormat::Continuation {
        header.timestamp = buffer.read_u24_be().ok();
    }
    if matches!(fmt, ChunkFormat::Full | ChunkFormat::NoStreamId) {
        header.message_length = buffer.read_u24_be().ok();
        header.message_type_id = buffer.read_u8().ok();
    }
    if fmt == ChunkFormat::Full {
        header.message_stream_id = buffer.read_u32_be().ok();
    }
    header
}
