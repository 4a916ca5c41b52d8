use std::io::Error as IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// Raw transport failure after the retry budget was spent
    #[error("Network error: {0}")]
    Network(String),

    #[error("Handshake mismatch: {0}")]
    HandshakeMismatch(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Buffer overflow: {0}")]
    BufferOverflow(String),

    #[error("Unsupported message type: {0}")]
    UnsupportedMessageType(u8),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("AMF decode error: {0}")]
    AmfDecode(String),

    #[error("AMF encode error: {0}")]
    AmfEncode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(msg.into())
    }

    /// Create a handshake mismatch error
    pub fn handshake_mismatch(msg: impl Into<String>) -> Self {
        Error::HandshakeMismatch(msg.into())
    }

    /// Create a protocol violation error
    pub fn protocol_violation(msg: impl Into<String>) -> Self {
        Error::ProtocolViolation(msg.into())
    }

    /// Create a buffer overflow error
    pub fn buffer_overflow(msg: impl Into<String>) -> Self {
        Error::BufferOverflow(msg.into())
    }

    /// Create an unsupported feature error
    pub fn unsupported_feature(msg: impl Into<String>) -> Self {
        Error::UnsupportedFeature(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Create an AMF decode error
    pub fn amf_decode(msg: impl Into<String>) -> Self {
        Error::AmfDecode(msg.into())
    }

    /// Create an AMF encode error
    pub fn amf_encode(msg: impl Into<String>) -> Self {
        Error::AmfEncode(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Whether this error ends the session.
    ///
    /// Handshake and raw I/O failures unwind the whole session; everything
    /// else is local to one message or chunk.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Network(_)
                | Error::HandshakeMismatch(_)
                | Error::BufferOverflow(_)
                | Error::InvalidState(_)
        )
    }
}

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
