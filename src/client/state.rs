/// Progress of a play session, driven by the server's replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,

    Handshaking,

    /// `connect` sent, waiting for its `_result`
    Connecting,

    /// `connect` acknowledged
    Connected,

    /// `createStream` acknowledged
    StreamCreated,

    /// `NetStream.Play.Start` received
    Playing,

    /// Fatal error
    Failed,
}

impl ClientState {
    fn rank(&self) -> u8 {
        match self {
            ClientState::Disconnected => 0,
            ClientState::Handshaking => 1,
            ClientState::Connecting => 2,
            ClientState::Connected => 3,
            ClientState::StreamCreated => 4,
            ClientState::Playing => 5,
            ClientState::Failed => 6,
        }
    }

    /// Whether moving to `next` is progress; late replies never move back
    pub fn can_advance_to(&self, next: ClientState) -> bool {
        next.rank() > self.rank()
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ClientState::Connected | ClientState::StreamCreated | ClientState::Playing
        )
    }

    pub fn is_playing(&self) -> bool {
        *self == ClientState::Playing
    }

    pub fn is_failed(&self) -> bool {
        *self == ClientState::Failed
    }
}
