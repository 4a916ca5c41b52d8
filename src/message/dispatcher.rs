use log::{debug, trace};
use crate::amf::{Amf0Decoder, Amf0Value};
use crate::message::MessageType;
use crate::protocol::RtmpMessage;
use crate::{ByteBuffer, Error, Result};

/// Consumer of complete messages.
///
/// Every method has a default so implementors only override what they
/// care about. Media and script payloads are handed over raw.
pub trait MessageHandler: Send {
    fn on_audio(&mut self, message: &RtmpMessage) {
        trace!("audio: {} bytes at {}", message.length(), message.timestamp);
    }

    fn on_video(&mut self, message: &RtmpMessage) {
        trace!("video: {} bytes at {}", message.length(), message.timestamp);
    }

    fn on_script_data(&mut self, message: &RtmpMessage) {
        debug!("script data: {} bytes", message.length());
    }

    fn on_command(&mut self, message: &RtmpMessage, values: &[Amf0Value]) {
        let _ = message;
        for value in values {
            debug!("  amf0 {}", value);
        }
    }
}

/// Handler that only logs what it is given
#[derive(Debug, Default)]
pub struct LoggingHandler;

impl MessageHandler for LoggingHandler {}

/// What the dispatcher did with a message
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Audio,
    Video,
    ScriptData,
    Command(Vec<Amf0Value>),
}

/// Routes complete non-control messages by type id
#[derive(Debug, Default)]
pub struct MessageDispatcher {
    dispatched: u64,
}

impl MessageDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages routed successfully so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn dispatch(&mut self, message: &RtmpMessage, handler: &mut dyn MessageHandler) -> Result<Dispatched> {
        let message_type = MessageType::from_id(message.message_type_id);
        debug!(
            "Dispatching {} (type {}), {} bytes on stream {}",
            message_type.name(),
            message.message_type_id,
            message.length(),
            message.message_stream_id
        );

        let outcome = match message_type {
            MessageType::Audio => {
                handler.on_audio(message);
                Dispatched::Audio
            }
            MessageType::Video => {
                handler.on_video(message);
                Dispatched::Video
            }
            MessageType::ScriptData => {
                handler.on_script_data(message);
                Dispatched::ScriptData
            }
            MessageType::Command => {
                let values = decode_command_values(&message.payload)?;
                handler.on_command(message, &values);
                Dispatched::Command(values)
            }
            _ => return Err(Error::UnsupportedMessageType(message.message_type_id)),
        };

        self.dispatched += 1;
        Ok(outcome)
    }
}

/// Decode AMF0 values back to back until `payload` is used up exactly
pub fn decode_command_values(payload: &[u8]) -> Result<Vec<Amf0Value>> {
    let mut buffer = ByteBuffer::new(payload.to_vec());
    let mut decoder = Amf0Decoder::new(&mut buffer);
    let mut values = Vec::new();

    while decoder.has_remaining() {
        let start = decoder.position();
        match decoder.decode() {
            Ok(value) => values.push(value),
            Err(e) => {
                return Err(Error::protocol_violation(format!(
                    "AMF0 command: {} of {} bytes decoded, then {}",
                    start,
                    payload.len(),
                    e
                )));
            }
        }
    }

    if decoder.position() != payload.len() {
        return Err(Error::protocol_violation(format!(
            "AMF0 command consumed {} of {} bytes",
            decoder.position(),
            payload.len()
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RtmpCommand;

    #[derive(Default)]
    struct Recorder {
        audio: usize,
        video: usize,
        script: usize,
        commands: Vec<Vec<Amf0Value>>,
    }

    impl MessageHandler for Recorder {
        fn on_audio(&mut self, _: &RtmpMessage) {
            self.audio += 1;
        }
        fn on_video(&mut self, _: &RtmpMessage) {
            self.video += 1;
        }
        fn on_script_data(&mut self, _: &RtmpMessage) {
            self.script += 1;
        }
        fn on_command(&mut self, _: &RtmpMessage, values: &[Amf0Value]) {
            self.commands.push(values.to_vec());
        }
    }

    #[test]
    fn test_routes_by_type() {
        let mut dispatcher = MessageDispatcher::new();
        let mut recorder = Recorder::default();

        for type_id in [8, 9, 9, 18] {
            let message = RtmpMessage::new(type_id, 1, 0, vec![0xAF]);
            dispatcher.dispatch(&message, &mut recorder).unwrap();
        }

        assert_eq!((recorder.audio, recorder.video, recorder.script), (1, 2, 1));
        assert_eq!(dispatcher.dispatched(), 4);
    }

    #[test]
    fn test_command_exact_length() {
        let mut dispatcher = MessageDispatcher::new();
        let mut recorder = Recorder::default();

        let payload = RtmpCommand::create_stream().encode().unwrap();
        let message = RtmpMessage::new(20, 0, 0, payload);

        let outcome = dispatcher.dispatch(&message, &mut recorder).unwrap();
        let expected = vec![
            Amf0Value::String("createStream".into()),
            Amf0Value::Number(2.0),
            Amf0Value::Null,
        ];
        assert_eq!(outcome, Dispatched::Command(expected.clone()));
        assert_eq!(recorder.commands, vec![expected]);
    }

    #[test]
    fn test_command_trailing_byte() {
        let mut dispatcher = MessageDispatcher::new();
        let mut recorder = Recorder::default();

        let mut payload = RtmpCommand::create_stream().encode().unwrap();
        payload.push(0x00);
        let message = RtmpMessage::new(20, 0, 0, payload);

        let err = dispatcher.dispatch(&message, &mut recorder).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
        assert!(!err.is_fatal());
        assert!(recorder.commands.is_empty());
        assert_eq!(dispatcher.dispatched(), 0);
    }

    #[test]
    fn test_unsupported_type() {
        let mut dispatcher = MessageDispatcher::new();
        let message = RtmpMessage::new(4, 0, 0, vec![0, 0, 0, 0, 0, 1]);

        let err = dispatcher.dispatch(&message, &mut LoggingHandler).unwrap_err();
        assert!(matches!(err, Error::UnsupportedMessageType(4)));
    }

    #[test]
    fn test_deeply_nested_command_is_discarded() {
        let mut payload = crate::amf::encode_amf0_values(&[Amf0Value::String("onStatus".into())]).unwrap();
        for _ in 0..200_000 {
            payload.extend_from_slice(&[0x03, 0x00, 0x01, b'a']);
        }
        payload.push(0x05);
        for _ in 0..200_000 {
            payload.extend_from_slice(&[0x00, 0x00, 0x09]);
        }

        let mut dispatcher = MessageDispatcher::new();
        let mut recorder = Recorder::default();
        let message = RtmpMessage::new(20, 0, 0, payload);

        let err = dispatcher.dispatch(&message, &mut recorder).unwrap_err();
        assert!(matches!(err, Error::ProtocolViolation(_)));
        assert!(!err.is_fatal());
        assert!(recorder.commands.is_empty());
    }

    #[test]
    fn test_empty_command_has_no_values() {
        assert_eq!(decode_command_values(&[]).unwrap(), Vec::<Amf0Value>::new());
    }
}
