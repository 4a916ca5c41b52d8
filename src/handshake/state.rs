use crate::{Error, Result};

/// Client handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    SendC0C1,
    AwaitS0,
    AwaitS1,
    SendC2,
    AwaitS2,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeEvent {
    SentC0C1,
    ReceivedS0,
    ReceivedS1,
    SentC2,
    ReceivedS2,
    Error,
}

impl Default for HandshakeState {
    fn default() -> Self {
        HandshakeState::SendC0C1
    }
}

impl HandshakeState {
    pub fn is_done(&self) -> bool {
        *self == HandshakeState::Complete
    }

    pub fn is_failed(&self) -> bool {
        *self == HandshakeState::Failed
    }

    /// Advance on `event`. Out-of-order events leave the state unchanged.
    pub fn transition(&mut self, event: HandshakeEvent) -> Result<()> {
        let next = match (*self, event) {
            (_, HandshakeEvent::Error) => HandshakeState::Failed,
            (HandshakeState::SendC0C1, HandshakeEvent::SentC0C1) => HandshakeState::AwaitS0,
            (HandshakeState::AwaitS0, HandshakeEvent::ReceivedS0) => HandshakeState::AwaitS1,
            (HandshakeState::AwaitS1, HandshakeEvent::ReceivedS1) => HandshakeState::SendC2,
            (HandshakeState::SendC2, HandshakeEvent::SentC2) => HandshakeState::AwaitS2,
            (HandshakeState::AwaitS2, HandshakeEvent::ReceivedS2) => HandshakeState::Complete,
            (state, event) => {
                return Err(Error::invalid_state(format!(
                    "handshake event {:?} in state {:?}",
                    event, state
                )));
            }
        };
        *self = next;
        Ok(())
    }
}
