#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport attached, nothing exchanged yet
    Uninitialized,

    /// Performing handshake
    Handshaking,

    /// Handshake done, chunked traffic may flow
    Established,

    /// Closed by the owner
    Closed,

    /// A fatal error ended the session
    Failed,
}

impl ConnectionState {
    pub fn is_established(&self) -> bool {
        *self == ConnectionState::Established
    }

    /// Whether the connection can still carry traffic
    pub fn is_open(&self) -> bool {
        !matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }

    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        match (*self, next) {
            (ConnectionState::Uninitialized, ConnectionState::Handshaking) => true,
            (ConnectionState::Handshaking, ConnectionState::Established) => true,
            (ConnectionState::Closed, _) => false,
            (_, ConnectionState::Failed) => true,
            (_, ConnectionState::Closed) => true,
            _ => false,
        }
    }
}
