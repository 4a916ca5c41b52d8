use std::sync::Arc;
use log::{debug, error, info, trace, warn};
use crate::amf::Amf0Value;
use crate::chunk::{ChunkOutcome, ChunkReader, ChunkStreamRegistry, ChunkWriter, Direction};
use crate::connection::{ConnectionState, SocketBuffer, Transport};
use crate::handshake::HandshakeNegotiator;
use crate::message::{Dispatched, MessageDispatcher, MessageHandler, MessageType};
use crate::protocol::*;
use crate::utils::{elapsed_ms, Clock};
use crate::{Error, Result};

/// Resource limits of one connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionLimits {
    /// Transport calls allowed per blocking send or receive
    pub io_retries: usize,
    pub recv_buffer_capacity: usize,
    /// Per chunk stream
    pub reassembly_capacity: usize,
}

impl Default for ConnectionLimits {
    fn default() -> Self {
        ConnectionLimits {
            io_retries: DEFAULT_IO_RETRIES,
            recv_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            reassembly_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Summary of one pass over the receive buffer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollReport {
    /// Bytes pulled off the transport before processing
    pub bytes_read: usize,
    pub chunks: usize,
    /// Complete messages, control messages included
    pub messages: usize,
    /// Decoded values of every command message, in arrival order
    pub commands: Vec<Vec<Amf0Value>>,
    /// Messages dropped without tearing down the session
    pub discarded: usize,
}

/// Client side of one RTMP session.
///
/// Owns the transport, both chunk stream registries and the negotiated
/// chunk sizes. All access goes through `&mut self`.
pub struct Connection<T: Transport> {
    io: SocketBuffer<T>,
    clock: Arc<dyn Clock>,
    state: ConnectionState,

    streams: ChunkStreamRegistry,
    reader: ChunkReader,
    writer: ChunkWriter,
    dispatcher: MessageDispatcher,

    session_start_ms: u64,
    remote_epoch: u32,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(transport, clock, ConnectionLimits::default())
    }

    pub fn with_limits(transport: T, clock: Arc<dyn Clock>, limits: ConnectionLimits) -> Self {
        let mut streams = ChunkStreamRegistry::new(limits.reassembly_capacity);
        streams.create(CHUNK_STREAM_PROTOCOL, Direction::Send, MESSAGE_STREAM_CONTROL);
        streams.create(CHUNK_STREAM_COMMAND, Direction::Send, MESSAGE_STREAM_CONTROL);
        streams.create(CHUNK_STREAM_DATA, Direction::Send, MESSAGE_STREAM_NETSTREAM);

        Connection {
            io: SocketBuffer::with_limits(transport, limits.recv_buffer_capacity, limits.io_retries),
            clock,
            state: ConnectionState::Uninitialized,
            streams,
            reader: ChunkReader::new(),
            writer: ChunkWriter::new(),
            dispatcher: MessageDispatcher::new(),
            session_start_ms: 0,
            remote_epoch: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn send_chunk_size(&self) -> usize {
        self.writer.chunk_size()
    }

    pub fn recv_chunk_size(&self) -> usize {
        self.reader.chunk_size()
    }

    pub fn session_start_ms(&self) -> u64 {
        self.session_start_ms
    }

    /// Server epoch reported in S1
    pub fn remote_epoch(&self) -> u32 {
        self.remote_epoch
    }

    /// Milliseconds since the session start
    pub fn elapsed_ms(&self) -> u32 {
        elapsed_ms(self.session_start_ms, self.clock.now_ms())
    }

    pub fn streams(&self) -> &ChunkStreamRegistry {
        &self.streams
    }

    pub fn transport(&self) -> &T {
        self.io.transport()
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state.can_transition_to(next) {
            debug!("Connection state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.is_open() {
            Ok(())
        } else {
            Err(Error::invalid_state(format!("connection is {:?}", self.state)))
        }
    }

    /// Mark the session failed if `err` is fatal, then hand it back
    fn check(&mut self, err: Error) -> Error {
        if err.is_fatal() {
            error!("Session error: {}", err);
            self.set_state(ConnectionState::Failed);
        }
        err
    }

    /// Run the client handshake. Only valid on a fresh connection.
    pub async fn handshake(&mut self) -> Result<()> {
        if self.state != ConnectionState::Uninitialized {
            return Err(Error::invalid_state(format!(
                "handshake requested in state {:?}",
                self.state
            )));
        }
        self.set_state(ConnectionState::Handshaking);

        let mut negotiator = HandshakeNegotiator::new();
        match negotiator.run(&mut self.io, self.clock.as_ref()).await {
            Ok(outcome) => {
                self.session_start_ms = outcome.session_start_ms;
                self.remote_epoch = outcome.remote_epoch;
                self.set_state(ConnectionState::Established);
                Ok(())
            }
            Err(e) => Err(self.check(e)),
        }
    }

    /// Register an extra send chunk stream bound to `message_stream_id`
    pub fn open_send_stream(&mut self, csid: u32, message_stream_id: u32) -> Result<()> {
        if !(2..=MAX_ONE_BYTE_CSID).contains(&csid) {
            return Err(Error::unsupported_feature(format!(
                "chunk stream id {} needs an extended basic header",
                csid
            )));
        }
        self.streams.create(csid, Direction::Send, message_stream_id);
        Ok(())
    }

    /// Chunk and send one message on an existing send chunk stream.
    /// The message stream id comes from the chunk stream.
    pub async fn send_message(
        &mut self,
        csid: u32,
        message_type_id: u8,
        timestamp: u32,
        payload: Vec<u8>,
    ) -> Result<()> {
        self.ensure_open()?;

        let stream = self.streams.get_mut(csid, Direction::Send)?;
        let message = RtmpMessage::new(message_type_id, stream.message_stream_id, timestamp, payload);
        let bytes = self.writer.write_message(stream, &message)?;

        debug!(
            "Sending type {} ({} bytes) on csid {}",
            message_type_id,
            message.length(),
            csid
        );
        if let Err(e) = self.io.send_all(&bytes).await {
            return Err(self.check(e));
        }
        Ok(())
    }

    /// Send an AMF0 command on the NetConnection chunk stream
    pub async fn send_command(&mut self, command: &RtmpCommand) -> Result<()> {
        info!("Sending {} (transaction {})", command.name, command.transaction_id);
        let payload = command.encode()?;
        self.send_message(CHUNK_STREAM_COMMAND, MSG_TYPE_COMMAND_AMF0, 0, payload)
            .await
    }

    /// Send a protocol control message on the control chunk stream
    pub async fn send_control(&mut self, control: &ControlMessage) -> Result<()> {
        debug!("Sending control {:?}", control);
        self.send_message(
            CHUNK_STREAM_PROTOCOL,
            control.message_type_id(),
            0,
            control.encode(),
        )
        .await
    }

    /// Announce a new outgoing chunk size and use it from the next message on
    pub async fn set_send_chunk_size(&mut self, size: u32) -> Result<()> {
        if size == 0 || size > MAX_CHUNK_SIZE {
            return Err(Error::config(format!("invalid chunk size {}", size)));
        }

        self.send_control(&ControlMessage::SetChunkSize(size)).await?;
        self.writer.set_chunk_size(size as usize);
        info!("Outgoing chunk size set to {}", size);
        Ok(())
    }

    /// Drain the transport without waiting, then process everything buffered
    pub async fn poll(&mut self, handler: &mut dyn MessageHandler) -> Result<PollReport> {
        self.ensure_open()?;

        let bytes_read = match self.io.fill_nonblocking() {
            Ok(n) => n,
            Err(e) => return Err(self.check(e)),
        };

        let mut report = self.process_buffered(handler)?;
        report.bytes_read = bytes_read;
        Ok(report)
    }

    /// Decode as many complete chunks as the receive buffer holds.
    ///
    /// Per-message problems are logged and counted in `discarded`; only
    /// fatal errors are returned.
    pub fn process_buffered(&mut self, handler: &mut dyn MessageHandler) -> Result<PollReport> {
        let mut report = PollReport::default();

        while let Some(chunk) = self.reader.read_chunk(&mut self.streams, self.io.buffered()) {
            self.io.consume(chunk.consumed);
            report.chunks += 1;
            trace!(
                "chunk fmt {:?} csid {} ({} bytes)",
                chunk.header.fmt,
                chunk.header.csid,
                chunk.consumed
            );

            match chunk.outcome {
                ChunkOutcome::Partial => {}
                ChunkOutcome::Dropped(e) => {
                    warn!("Dropped message on csid {}: {}", chunk.header.csid, e);
                    report.discarded += 1;
                }
                ChunkOutcome::Message(message) => {
                    report.messages += 1;
                    let result = if chunk.header.csid == CHUNK_STREAM_PROTOCOL {
                        self.handle_control(&message)
                    } else {
                        self.dispatch(&message, handler, &mut report)
                    };

                    if let Err(e) = result {
                        if e.is_fatal() {
                            return Err(self.check(e));
                        }
                        warn!(
                            "Discarded type {} message on csid {}: {}",
                            message.message_type_id, chunk.header.csid, e
                        );
                        report.discarded += 1;
                    }
                }
            }
        }

        Ok(report)
    }

    fn handle_control(&mut self, message: &RtmpMessage) -> Result<()> {
        if !MessageType::from_id(message.message_type_id).is_control() {
            return Err(Error::UnsupportedMessageType(message.message_type_id));
        }

        match ControlMessage::parse(message.message_type_id, &message.payload)? {
            ControlMessage::SetChunkSize(size) => {
                info!("Peer set chunk size to {}", size);
                self.reader.set_chunk_size(size as usize);
            }
            ControlMessage::WindowAckSize(size) => {
                info!("Peer window acknowledgement size {}", size);
            }
            ControlMessage::SetPeerBandwidth { window, limit_type } => {
                info!("Peer bandwidth {} (limit type {:?})", window, limit_type);
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        message: &RtmpMessage,
        handler: &mut dyn MessageHandler,
        report: &mut PollReport,
    ) -> Result<()> {
        if let Dispatched::Command(values) = self.dispatcher.dispatch(message, handler)? {
            let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            debug!("Command: {}", rendered.join(", "));
            report.commands.push(values);
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if self.state.is_open() {
            info!("Closing connection");
        }
        self.set_state(ConnectionState::Closed);
    }
}
