// Message types
pub const MSG_TYPE_SET_CHUNK_SIZE: u8 = 1;
pub const MSG_TYPE_ABORT: u8 = 2;
pub const MSG_TYPE_ACK: u8 = 3;
pub const MSG_TYPE_USER_CONTROL: u8 = 4;
pub const MSG_TYPE_WINDOW_ACK: u8 = 5;
pub const MSG_TYPE_SET_PEER_BW: u8 = 6;
pub const MSG_TYPE_AUDIO: u8 = 8;
pub const MSG_TYPE_VIDEO: u8 = 9;
pub const MSG_TYPE_DATA_AMF3: u8 = 15;
pub const MSG_TYPE_SHARED_OBJECT_AMF3: u8 = 16;
pub const MSG_TYPE_COMMAND_AMF3: u8 = 17;
pub const MSG_TYPE_DATA_AMF0: u8 = 18;
pub const MSG_TYPE_SHARED_OBJECT_AMF0: u8 = 19;
pub const MSG_TYPE_COMMAND_AMF0: u8 = 20;
pub const MSG_TYPE_AGGREGATE: u8 = 22;

// Chunk stream IDs used for sending
pub const CHUNK_STREAM_PROTOCOL: u32 = 2;
pub const CHUNK_STREAM_COMMAND: u32 = 3;     // NetConnection commands
pub const CHUNK_STREAM_DATA: u32 = 8;        // NetStream commands

// Message stream IDs the send chunk streams are created with
pub const MESSAGE_STREAM_CONTROL: u32 = 0;
pub const MESSAGE_STREAM_NETSTREAM: u32 = 1;

// Chunk header limits
pub const MAX_ONE_BYTE_CSID: u32 = 63;
pub const EXTENDED_TIMESTAMP_MARKER: u32 = 0x00FF_FFFF;
pub const MAX_CHUNK_SIZE: u32 = 0x7FFF_FFFF;

// Default values
pub const DEFAULT_CHUNK_SIZE: usize = 128;
pub const DEFAULT_WINDOW_ACK_SIZE: u32 = 6_000_000;
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024 * 1024;
pub const DEFAULT_IO_RETRIES: usize = 5;
pub const DEFAULT_RTMP_PORT: u16 = 1935;
