use crate::protocol::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Protocol control, only meaningful on the control chunk stream
    Control(ControlType),

    Audio,

    Video,

    /// AMF0 name + value pairs (`onMetaData` and friends)
    ScriptData,

    /// AMF0 command
    Command,

    /// Known to RTMP but not handled by this client
    Ignored(u8),

    Unknown(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlType {
    SetChunkSize,
    WindowAcknowledgement,
    SetPeerBandwidth,
}

impl MessageType {
    pub fn from_id(id: u8) -> Self {
        match id {
            MSG_TYPE_SET_CHUNK_SIZE => MessageType::Control(ControlType::SetChunkSize),
            MSG_TYPE_WINDOW_ACK => MessageType::Control(ControlType::WindowAcknowledgement),
            MSG_TYPE_SET_PEER_BW => MessageType::Control(ControlType::SetPeerBandwidth),
            MSG_TYPE_AUDIO => MessageType::Audio,
            MSG_TYPE_VIDEO => MessageType::Video,
            MSG_TYPE_DATA_AMF0 => MessageType::ScriptData,
            MSG_TYPE_COMMAND_AMF0 => MessageType::Command,
            MSG_TYPE_ABORT | MSG_TYPE_ACK | MSG_TYPE_USER_CONTROL | MSG_TYPE_DATA_AMF3
            | MSG_TYPE_SHARED_OBJECT_AMF3 | MSG_TYPE_COMMAND_AMF3 | MSG_TYPE_SHARED_OBJECT_AMF0
            | MSG_TYPE_AGGREGATE => MessageType::Ignored(id),
            _ => MessageType::Unknown(id),
        }
    }

    pub fn is_control(&self) -> bool {
        matches!(self, MessageType::Control(_))
    }

    pub fn is_media(&self) -> bool {
        matches!(self, MessageType::Audio | MessageType::Video)
    }

    pub fn is_command(&self) -> bool {
        matches!(self, MessageType::Command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MessageType::Control(ControlType::SetChunkSize) => "SetChunkSize",
            MessageType::Control(ControlType::WindowAcknowledgement) => "WindowAckSize",
            MessageType::Control(ControlType::SetPeerBandwidth) => "SetPeerBandwidth",
            MessageType::Audio => "Audio",
            MessageType::Video => "Video",
            MessageType::ScriptData => "ScriptData",
            MessageType::Command => "Command",
            MessageType::Ignored(_) => "Ignored",
            MessageType::Unknown(_) => "Unknown",
        }
    }
}
