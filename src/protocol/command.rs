use crate::amf::{Amf0Encoder, Amf0Value};
use crate::Result;

/// Transaction ids of the client play sequence
pub const TRANSACTION_CONNECT: f64 = 1.0;
pub const TRANSACTION_CREATE_STREAM: f64 = 2.0;
pub const TRANSACTION_PLAY: f64 = 3.0;

/// Start position asking the server for the live stream
pub const PLAY_START_LIVE: f64 = -2000.0;

/// An AMF0 command: name, transaction id, command object, extra arguments
#[derive(Debug, Clone, PartialEq)]
pub struct RtmpCommand {
    pub name: String,
    pub transaction_id: f64,
    pub command_object: Amf0Value,
    pub arguments: Vec<Amf0Value>,
}

impl RtmpCommand {
    /// Create new command
    pub fn new(name: impl Into<String>, transaction_id: f64) -> Self {
        RtmpCommand {
            name: name.into(),
            transaction_id,
            command_object: Amf0Value::Null,
            arguments: Vec::new(),
        }
    }

    /// NetConnection `connect`
    pub fn connect(app: &str, flash_ver: &str, tc_url: &str) -> Self {
        let mut cmd = RtmpCommand::new("connect", TRANSACTION_CONNECT);
        cmd.command_object = Amf0Value::object([
            ("app", Amf0Value::String(app.to_string())),
            ("flashVer", Amf0Value::String(flash_ver.to_string())),
            ("tcUrl", Amf0Value::String(tc_url.to_string())),
            ("fpad", Amf0Value::Boolean(false)),
            ("capabilities", Amf0Value::Number(15.0)),
            ("audioCodecs", Amf0Value::Number(0x0FFF as f64)),
            ("videoCodecs", Amf0Value::Number(0x00FF as f64)),
            ("videoFunction", Amf0Value::Number(1.0)),
        ]);
        cmd
    }

    /// NetConnection `createStream`
    pub fn create_stream() -> Self {
        RtmpCommand::new("createStream", TRANSACTION_CREATE_STREAM)
    }

    /// NetStream `play` of a live stream
    pub fn play(stream_name: &str) -> Self {
        let mut cmd = RtmpCommand::new("play", TRANSACTION_PLAY);
        cmd.arguments.push(Amf0Value::String(stream_name.to_string()));
        cmd.arguments.push(Amf0Value::Number(PLAY_START_LIVE));
        cmd
    }

    /// Encode command to bytes
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut encoder = Amf0Encoder::new();
        encoder.encode(&Amf0Value::String(self.name.clone()))?;
        encoder.encode(&Amf0Value::Number(self.transaction_id))?;
        encoder.encode(&self.command_object)?;
        for arg in &self.arguments {
            encoder.encode(arg)?;
        }
        Ok(encoder.into_bytes())
    }

    /// Interpret an already decoded value sequence as a command.
    /// Returns `None` when it does not start with a name and a transaction id.
    pub fn from_values(values: &[Amf0Value]) -> Option<Self> {
        let name = values.first()?.as_string()?.to_string();
        let transaction_id = values.get(1)?.as_number()?;
        let command_object = values.get(2).cloned().unwrap_or(Amf0Value::Null);
        let arguments = values.iter().skip(3).cloned().collect();
        Some(RtmpCommand {
            name,
            transaction_id,
            command_object,
            arguments,
        })
    }

    pub fn is_result(&self) -> bool {
        self.name == "_result"
    }

    pub fn is_error(&self) -> bool {
        self.name == "_error"
    }

    /// `code` of the info object carried by `onStatus` / `_result` / `_error`
    pub fn status_code(&self) -> Option<&str> {
        self.arguments
            .iter()
            .chain(std::iter::once(&self.command_object))
            .find_map(|v| v.get_property("code"))
            .and_then(|v| v.as_string())
    }
}
