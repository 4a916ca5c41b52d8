// Common test utilities and helper functions
//
// A scripted RTMP server that speaks just enough of the protocol to walk a
// client through connect, createStream and play, plus a handler that
// records what the client delivered.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;
use rtmp::{
    decode_command_values, encode_amf0_values, Amf0Value, ChunkOutcome, ChunkReader,
    ChunkStream, ChunkStreamRegistry, ChunkWriter, ClientConfig, ControlMessage,
    MessageHandler, PlayTarget, RtmpCommand, RtmpMessage, Transport,
};

pub const S1_EPOCH: u32 = 0x0001_E240;
pub const SERVER_WINDOW: u32 = 2_500_000;

/// What the fake server does beyond the happy path
#[derive(Debug, Clone)]
pub struct ServerScript {
    /// Outgoing chunk size, announced after `connect` when not 128
    pub chunk_size: u32,
    /// Flip this byte of S2 before sending it
    pub corrupt_s2: Option<usize>,
    pub video_frames: usize,
    pub video_size: usize,
}

impl Default for ServerScript {
    fn default() -> Self {
        ServerScript {
            chunk_size: 128,
            corrupt_s2: None,
            video_frames: 3,
            video_size: 300,
        }
    }
}

/// Everything the fake server saw
#[derive(Debug, Default)]
pub struct ServerLog {
    pub c0: Option<u8>,
    pub c1: Vec<u8>,
    pub c2: Vec<u8>,
    pub handshake_done: bool,
    /// Complete messages with the csid they arrived on
    pub messages: Vec<(u32, RtmpMessage)>,
}

impl ServerLog {
    /// Decoded command values of every AMF0 command received
    pub fn commands(&self) -> Vec<(u32, Vec<Amf0Value>)> {
        self.messages
            .iter()
            .filter(|(_, m)| m.message_type_id == 20)
            .map(|(csid, m)| (*csid, decode_command_values(&m.payload).unwrap()))
            .collect()
    }

    pub fn command_names(&self) -> Vec<String> {
        self.commands()
            .iter()
            .filter_map(|(_, values)| values.first().and_then(|v| v.as_string()).map(String::from))
            .collect()
    }
}

pub fn s1_packet() -> Vec<u8> {
    let mut s1 = vec![0u8; 1536];
    s1[0..4].copy_from_slice(&S1_EPOCH.to_be_bytes());
    for (i, byte) in s1.iter_mut().enumerate().skip(8) {
        *byte = (i % 251) as u8;
    }
    s1
}

/// Chunk a message with a fresh chunk stream, so the first chunk is fmt 0
pub fn chunk_message(
    writer: &ChunkWriter,
    csid: u32,
    message_stream_id: u32,
    message_type_id: u8,
    timestamp: u32,
    payload: Vec<u8>,
) -> Vec<u8> {
    let mut stream = ChunkStream::new(csid, message_stream_id);
    let message = RtmpMessage::new(message_type_id, message_stream_id, timestamp, payload);
    writer.write_message(&mut stream, &message).unwrap()
}

fn control(writer: &ChunkWriter, message: ControlMessage) -> Vec<u8> {
    chunk_message(writer, 2, 0, message.message_type_id(), 0, message.encode())
}

fn command(writer: &ChunkWriter, csid: u32, stream_id: u32, values: &[Amf0Value]) -> Vec<u8> {
    chunk_message(writer, csid, stream_id, 20, 0, encode_amf0_values(values).unwrap())
}

async fn read_exact<T: Transport>(transport: &mut T, len: usize) -> Option<Vec<u8>> {
    let mut out = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match transport.recv(&mut out[filled..]).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => filled += n,
        }
    }
    Some(out)
}

async fn write_all<T: Transport>(transport: &mut T, mut data: &[u8]) -> bool {
    while !data.is_empty() {
        match transport.send(data).await {
            Ok(0) | Err(_) => return false,
            Ok(n) => data = &data[n..],
        }
    }
    true
}

fn respond(script: &ServerScript, writer: &mut ChunkWriter, message: &RtmpMessage) -> Vec<u8> {
    if message.message_type_id != 20 {
        return Vec::new();
    }
    let values = decode_command_values(&message.payload).unwrap();
    let cmd = match RtmpCommand::from_values(&values) {
        Some(cmd) => cmd,
        None => return Vec::new(),
    };

    let mut out = Vec::new();
    match cmd.name.as_str() {
        "connect" => {
            out.extend(control(writer, ControlMessage::WindowAckSize(SERVER_WINDOW)));
            out.extend(control(
                writer,
                ControlMessage::SetPeerBandwidth {
                    window: SERVER_WINDOW,
                    limit_type: Some(2),
                },
            ));
            // StreamBegin 0
            out.extend(chunk_message(writer, 2, 0, 4, 0, vec![0, 0, 0, 0, 0, 0]));
            if script.chunk_size != 128 {
                out.extend(control(writer, ControlMessage::SetChunkSize(script.chunk_size)));
                writer.set_chunk_size(script.chunk_size as usize);
            }
            out.extend(command(
                writer,
                3,
                0,
                &[
                    Amf0Value::String("_result".into()),
                    Amf0Value::Number(cmd.transaction_id),
                    Amf0Value::object([
                        ("fmsVer", Amf0Value::String("FMS/3,0,1,123".into())),
                        ("capabilities", Amf0Value::Number(31.0)),
                    ]),
                    Amf0Value::object([
                        ("level", Amf0Value::String("status".into())),
                        ("code", Amf0Value::String("NetConnection.Connect.Success".into())),
                    ]),
                ],
            ));
        }
        "createStream" => {
            out.extend(command(
                writer,
                3,
                0,
                &[
                    Amf0Value::String("_result".into()),
                    Amf0Value::Number(cmd.transaction_id),
                    Amf0Value::Null,
                    Amf0Value::Number(1.0),
                ],
            ));
        }
        "play" => {
            out.extend(command(
                writer,
                5,
                1,
                &[
                    Amf0Value::String("onStatus".into()),
                    Amf0Value::Number(0.0),
                    Amf0Value::Null,
                    Amf0Value::object([
                        ("level", Amf0Value::String("status".into())),
                        ("code", Amf0Value::String("NetStream.Play.Start".into())),
                    ]),
                ],
            ));
            let metadata = encode_amf0_values(&[
                Amf0Value::String("onMetaData".into()),
                Amf0Value::EcmaArray(
                    [("width".to_string(), Amf0Value::Number(640.0))]
                        .into_iter()
                        .collect(),
                ),
            ])
            .unwrap();
            out.extend(chunk_message(writer, 5, 1, 18, 0, metadata));

            for frame in 0..script.video_frames {
                let timestamp = frame as u32 * 40;
                out.extend(chunk_message(writer, 6, 1, 9, timestamp, vec![0x17; script.video_size]));
                out.extend(chunk_message(writer, 4, 1, 8, timestamp, vec![0xAF; 10]));
            }
        }
        _ => {}
    }
    out
}

/// Serve one client session until the client goes away
pub async fn serve<T: Transport + 'static>(mut transport: T, script: ServerScript) -> ServerLog {
    let mut log = ServerLog::default();

    let c0c1 = match read_exact(&mut transport, 1 + 1536).await {
        Some(bytes) => bytes,
        None => return log,
    };
    log.c0 = Some(c0c1[0]);
    log.c1 = c0c1[1..].to_vec();

    let mut reply = vec![3u8];
    reply.extend(s1_packet());
    let mut s2 = log.c1.clone();
    if let Some(index) = script.corrupt_s2 {
        s2[index] ^= 0xFF;
    }
    reply.extend(s2);
    if !write_all(&mut transport, &reply).await {
        return log;
    }

    log.c2 = match read_exact(&mut transport, 1536).await {
        Some(bytes) => bytes,
        None => return log,
    };
    log.handshake_done = true;

    let mut reader = ChunkReader::new();
    let mut writer = ChunkWriter::new();
    let mut streams = ChunkStreamRegistry::default();
    let mut buffer = Vec::new();
    let mut scratch = vec![0u8; 64 * 1024];

    'session: loop {
        let n = match transport.recv(&mut scratch).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buffer.extend_from_slice(&scratch[..n]);

        while let Some(chunk) = reader.read_chunk(&mut streams, &buffer) {
            buffer.drain(..chunk.consumed);
            if let ChunkOutcome::Message(message) = chunk.outcome {
                if chunk.header.csid == 2 && message.message_type_id == 1 {
                    let size = u32::from_be_bytes([
                        message.payload[0],
                        message.payload[1],
                        message.payload[2],
                        message.payload[3],
                    ]);
                    reader.set_chunk_size((size & 0x7FFF_FFFF) as usize);
                }

                let replies = respond(&script, &mut writer, &message);
                log.messages.push((chunk.header.csid, message));
                if !replies.is_empty() && !write_all(&mut transport, &replies).await {
                    break 'session;
                }
            }
        }
    }

    log
}

/// What the client handed to its handler
#[derive(Debug, Default)]
pub struct Recorded {
    pub audio: Vec<usize>,
    pub video: Vec<usize>,
    pub video_timestamps: Vec<u32>,
    pub script_data: usize,
    pub commands: Vec<String>,
}

pub struct RecordingHandler(pub Arc<Mutex<Recorded>>);

impl RecordingHandler {
    pub fn new() -> (Self, Arc<Mutex<Recorded>>) {
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        (RecordingHandler(recorded.clone()), recorded)
    }
}

impl MessageHandler for RecordingHandler {
    fn on_audio(&mut self, message: &RtmpMessage) {
        self.0.lock().unwrap().audio.push(message.length());
    }

    fn on_video(&mut self, message: &RtmpMessage) {
        let mut recorded = self.0.lock().unwrap();
        recorded.video.push(message.length());
        recorded.video_timestamps.push(message.timestamp);
    }

    fn on_script_data(&mut self, _message: &RtmpMessage) {
        self.0.lock().unwrap().script_data += 1;
    }

    fn on_command(&mut self, _message: &RtmpMessage, values: &[Amf0Value]) {
        if let Some(name) = values.first().and_then(|v| v.as_string()) {
            self.0.lock().unwrap().commands.push(name.to_string());
        }
    }
}

/// Default config with a schedule short enough for tests
pub fn fast_config(send_chunk_size: u32) -> ClientConfig {
    ClientConfig::builder()
        .send_chunk_size(send_chunk_size)
        .schedule(
            Duration::from_millis(50),
            Duration::from_millis(20),
            Duration::from_millis(5),
            Duration::from_millis(0),
        )
        .play_poll_iterations(40)
        .build()
        .expect("Failed to build client config")
}

pub fn live_test(port: u16) -> PlayTarget {
    PlayTarget::from_parts("127.0.0.1", port, "live/test").unwrap()
}
