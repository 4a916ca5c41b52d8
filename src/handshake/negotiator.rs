use log::{debug, info, warn};
use crate::connection::{SocketBuffer, Transport};
use crate::handshake::{HandshakeEvent, HandshakePacket, HandshakeState, HANDSHAKE_SIZE, RTMP_VERSION};
use crate::utils::{elapsed_ms, Clock};
use crate::{Error, Result};

/// Values the rest of the session keeps from the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeOutcome {
    /// Clock reading taken right after C0 went out
    pub session_start_ms: u64,
    /// First four bytes of S1
    pub remote_epoch: u32,
}

/// Runs the client side of the simple C0/C1/S0/S1/C2/S2 exchange
#[derive(Debug, Default)]
pub struct HandshakeNegotiator {
    state: HandshakeState,
}

impl HandshakeNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    pub async fn run<T: Transport>(
        &mut self,
        io: &mut SocketBuffer<T>,
        clock: &dyn Clock,
    ) -> Result<HandshakeOutcome> {
        let result = self.exchange(io, clock).await;
        if let Err(ref e) = result {
            warn!("Handshake failed in state {:?}: {}", self.state, e);
            self.state.transition(HandshakeEvent::Error)?;
        }
        result
    }

    async fn exchange<T: Transport>(
        &mut self,
        io: &mut SocketBuffer<T>,
        clock: &dyn Clock,
    ) -> Result<HandshakeOutcome> {
        let c1 = HandshakePacket::client_hello();

        io.send_all(&[RTMP_VERSION]).await?;
        let session_start_ms = clock.now_ms();
        io.send_all(&c1.encode()?).await?;
        self.state.transition(HandshakeEvent::SentC0C1)?;
        debug!("Sent C0+C1");

        let s0 = io.recv_exact(1).await?;
        if s0[0] != RTMP_VERSION {
            debug!("Server announced RTMP version {}", s0[0]);
        }
        self.state.transition(HandshakeEvent::ReceivedS0)?;

        let s1 = HandshakePacket::parse(&io.recv_exact(HANDSHAKE_SIZE).await?)?;
        let remote_epoch = s1.time;
        self.state.transition(HandshakeEvent::ReceivedS1)?;
        debug!("Received S1, remote epoch {}", remote_epoch);

        // C2 carries S1's time by construction
        let c2 = HandshakePacket::echo(&s1, elapsed_ms(session_start_ms, clock.now_ms()));
        io.send_all(&c2.encode()?).await?;
        self.state.transition(HandshakeEvent::SentC2)?;

        let s2 = HandshakePacket::parse(&io.recv_exact(HANDSHAKE_SIZE).await?)?;
        if s2.time != c1.time {
            warn!("S2 time {} does not echo C1 time {}", s2.time, c1.time);
        }
        if let Some(offset) = s2.payload.iter().zip(&c1.payload).position(|(a, b)| a != b) {
            return Err(Error::handshake_mismatch(format!(
                "S2 differs from C1 at byte {}",
                offset + 8
            )));
        }
        self.state.transition(HandshakeEvent::ReceivedS2)?;

        info!("Handshake complete");
        Ok(HandshakeOutcome {
            session_start_ms,
            remote_epoch,
        })
    }
}
