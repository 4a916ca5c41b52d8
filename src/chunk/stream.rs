use std::collections::HashMap;
use std::mem;
use log::warn;
use crate::chunk::{ChunkFormat, ChunkHeader};
use crate::protocol::DEFAULT_BUFFER_CAPACITY;
use crate::{Error, Result};

/// Which side of the connection a chunk stream belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Send,
    Receive,
}

/// Result of feeding one chunk's payload into a reassembly buffer
#[derive(Debug)]
pub enum Reassembly {
    /// More chunks are needed
    Pending,
    /// The last byte arrived; the full payload is returned and the buffer reset
    Complete(Vec<u8>),
    /// The message outgrew the buffer and was thrown away
    Dropped(Error),
}

/// Per-csid state: the "last" header values compressed formats inherit,
/// plus the receive-side reassembly buffer.
#[derive(Debug, Clone)]
pub struct ChunkStream {
    pub csid: u32,

    /// Message stream id this chunk stream was created for
    pub message_stream_id: u32,

    pub last_fmt: ChunkFormat,
    pub last_timestamp: u32,
    pub last_message_length: u32,
    pub last_message_type_id: u8,
    pub last_msg_stream_id: u32,

    reassembly: Vec<u8>,
    received: usize,
    overflowed: bool,
    capacity: usize,
}

impl ChunkStream {
    pub fn new(csid: u32, message_stream_id: u32) -> Self {
        ChunkStream::with_capacity(csid, message_stream_id, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(csid: u32, message_stream_id: u32, capacity: usize) -> Self {
        ChunkStream {
            csid,
            message_stream_id,
            last_fmt: ChunkFormat::Full,
            last_timestamp: 0,
            last_message_length: 0,
            last_message_type_id: 0,
            last_msg_stream_id: message_stream_id,
            reassembly: Vec::new(),
            received: 0,
            overflowed: false,
            capacity,
        }
    }

    /// Store the fields present in `header` as the new "last" values.
    ///
    /// Timestamps are stored exactly as parsed, including for fmt 1 and 2.
    /// They are not accumulated as deltas.
    pub fn apply_header(&mut self, header: &ChunkHeader) {
        self.last_fmt = header.fmt;
        if let Some(timestamp) = header.timestamp {
            self.last_timestamp = timestamp;
        }
        if let Some(length) = header.message_length {
            self.last_message_length = length;
        }
        if let Some(type_id) = header.message_type_id {
            self.last_message_type_id = type_id;
        }
        if let Some(stream_id) = header.message_stream_id {
            self.last_msg_stream_id = stream_id;
        }
    }

    /// Payload bytes of the in-flight message received so far
    pub fn buffered(&self) -> usize {
        self.received
    }

    pub fn is_assembling(&self) -> bool {
        self.received > 0
    }

    /// Discard any partially assembled message
    pub fn reset_reassembly(&mut self) {
        self.reassembly.clear();
        self.received = 0;
        self.overflowed = false;
    }

    /// Append one chunk's payload to the in-flight message.
    ///
    /// The caller never passes more than `last_message_length - buffered()`
    /// bytes.
    pub fn append(&mut self, data: &[u8]) -> Reassembly {
        let target = self.last_message_length as usize;

        if !self.overflowed && self.reassembly.len() + data.len() > self.capacity {
            warn!(
                "csid {}: message of {} bytes exceeds reassembly capacity {}, dropping it",
                self.csid, target, self.capacity
            );
            self.reassembly.clear();
            self.overflowed = true;
        }

        if !self.overflowed {
            if self.reassembly.is_empty() {
                self.reassembly.reserve(target.min(self.capacity));
            }
            self.reassembly.extend_from_slice(data);
        }
        self.received += data.len();

        if self.received < target {
            return Reassembly::Pending;
        }

        let overflowed = self.overflowed;
        let payload = mem::take(&mut self.reassembly);
        self.received = 0;
        self.overflowed = false;

        if overflowed {
            Reassembly::Dropped(Error::buffer_overflow(format!(
                "csid {}: reassembly buffer of {} bytes cannot hold a {} byte message",
                self.csid, self.capacity, target
            )))
        } else {
            Reassembly::Complete(payload)
        }
    }
}

/// Chunk streams keyed by csid, kept separately for each direction.
/// Streams are created on first reference; there is no upper bound.
#[derive(Debug)]
pub struct ChunkStreamRegistry {
    send: HashMap<u32, ChunkStream>,
    receive: HashMap<u32, ChunkStream>,
    reassembly_capacity: usize,
}

impl Default for ChunkStreamRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl ChunkStreamRegistry {
    pub fn new(reassembly_capacity: usize) -> Self {
        ChunkStreamRegistry {
            send: HashMap::new(),
            receive: HashMap::new(),
            reassembly_capacity,
        }
    }

    fn map(&self, direction: Direction) -> &HashMap<u32, ChunkStream> {
        match direction {
            Direction::Send => &self.send,
            Direction::Receive => &self.receive,
        }
    }

    fn map_mut(&mut self, direction: Direction) -> &mut HashMap<u32, ChunkStream> {
        match direction {
            Direction::Send => &mut self.send,
            Direction::Receive => &mut self.receive,
        }
    }

    /// Create (or replace) a stream bound to `message_stream_id`
    pub fn create(&mut self, csid: u32, direction: Direction, message_stream_id: u32) -> &mut ChunkStream {
        let capacity = self.reassembly_capacity;
        let slot = self
            .map_mut(direction)
            .entry(csid)
            .or_insert_with(|| ChunkStream::with_capacity(csid, message_stream_id, capacity));
        *slot = ChunkStream::with_capacity(csid, message_stream_id, capacity);
        slot
    }

    pub fn get_or_create(&mut self, csid: u32, direction: Direction) -> &mut ChunkStream {
        let capacity = self.reassembly_capacity;
        self.map_mut(direction)
            .entry(csid)
            .or_insert_with(|| ChunkStream::with_capacity(csid, 0, capacity))
    }

    pub fn get(&self, csid: u32, direction: Direction) -> Result<&ChunkStream> {
        self.map(direction)
            .get(&csid)
            .ok_or_else(|| Error::not_found(format!("{:?} chunk stream {}", direction, csid)))
    }

    pub fn get_mut(&mut self, csid: u32, direction: Direction) -> Result<&mut ChunkStream> {
        self.map_mut(direction)
            .get_mut(&csid)
            .ok_or_else(|| Error::not_found(format!("{:?} chunk stream {}", direction, csid)))
    }

    pub fn len(&self, direction: Direction) -> usize {
        self.map(direction).len()
    }

    pub fn is_empty(&self, direction: Direction) -> bool {
        self.map(direction).is_empty()
    }
}
