use std::sync::Arc;
use log::{error, info, warn};
use tokio::time::{sleep, timeout};
use crate::client::{ClientConfig, ClientState, PlayTarget};
use crate::connection::{Connection, PollReport, TcpTransport, Transport};
use crate::message::{LoggingHandler, MessageHandler};
use crate::protocol::*;
use crate::utils::{Clock, MonotonicClock};
use crate::{Error, Result};

const PLAY_START: &str = "NetStream.Play.Start";

/// Client play session: handshake, `connect`, `createStream`, `play`,
/// then a fixed number of polls.
pub struct RtmpClient<T: Transport> {
    config: ClientConfig,
    target: PlayTarget,
    connection: Connection<T>,
    handler: Box<dyn MessageHandler>,
    state: ClientState,
    stream_id: Option<u32>,
}

impl RtmpClient<TcpTransport> {
    /// Open a TCP connection to `target`; no bytes are exchanged yet
    pub async fn connect_tcp(target: PlayTarget, config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let address = target.address();
        info!("Connecting to {}", address);
        let transport = timeout(config.connect_timeout, TcpTransport::connect(address.as_str()))
            .await
            .map_err(|_| Error::network(format!("Timed out connecting to {}", address)))??;

        Ok(Self::new(transport, target, config, Arc::new(MonotonicClock::new())))
    }
}

impl<T: Transport> RtmpClient<T> {
    pub fn new(transport: T, target: PlayTarget, config: ClientConfig, clock: Arc<dyn Clock>) -> Self {
        let connection = Connection::with_limits(transport, clock, config.limits());
        RtmpClient {
            config,
            target,
            connection,
            handler: Box::new(LoggingHandler),
            state: ClientState::Disconnected,
            stream_id: None,
        }
    }

    /// Replace the consumer of audio, video, script data and commands
    pub fn with_handler(mut self, handler: Box<dyn MessageHandler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Stream id returned by `createStream`, once seen
    pub fn stream_id(&self) -> Option<u32> {
        self.stream_id
    }

    pub fn target(&self) -> &PlayTarget {
        &self.target
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection<T> {
        &self.connection
    }

    fn advance(&mut self, next: ClientState) {
        if self.state.can_advance_to(next) {
            info!("Client state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn fail(&mut self, err: Error) -> Error {
        if err.is_fatal() {
            error!("Session for {} failed: {}", self.target, err);
            self.advance(ClientState::Failed);
        }
        err
    }

    /// Handshake, then announce the outgoing chunk size if it differs
    /// from the protocol default
    pub async fn handshake(&mut self) -> Result<()> {
        self.advance(ClientState::Handshaking);
        if let Err(e) = self.connection.handshake().await {
            return Err(self.fail(e));
        }

        if self.config.send_chunk_size as usize != DEFAULT_CHUNK_SIZE {
            let size = self.config.send_chunk_size;
            if let Err(e) = self.connection.set_send_chunk_size(size).await {
                return Err(self.fail(e));
            }
        }
        Ok(())
    }

    async fn send(&mut self, command: RtmpCommand) -> Result<()> {
        match self.connection.send_command(&command).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn connect(&mut self) -> Result<()> {
        let command = RtmpCommand::connect(&self.target.app, &self.config.flash_ver, self.target.tc_url());
        self.send(command).await?;
        self.advance(ClientState::Connecting);
        Ok(())
    }

    pub async fn send_window_ack_size(&mut self) -> Result<()> {
        let control = ControlMessage::WindowAckSize(self.config.window_ack_size);
        match self.connection.send_control(&control).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e)),
        }
    }

    pub async fn create_stream(&mut self) -> Result<()> {
        self.send(RtmpCommand::create_stream()).await
    }

    pub async fn play(&mut self) -> Result<()> {
        let command = RtmpCommand::play(&self.target.stream);
        self.send(command).await
    }

    /// One drain-then-process pass; replies update the client state
    pub async fn poll(&mut self) -> Result<PollReport> {
        let report = match self.connection.poll(self.handler.as_mut()).await {
            Ok(report) => report,
            Err(e) => return Err(self.fail(e)),
        };

        for values in &report.commands {
            if let Some(command) = RtmpCommand::from_values(values) {
                self.track(&command);
            }
        }
        Ok(report)
    }

    fn track(&mut self, command: &RtmpCommand) {
        if command.is_result() {
            if command.transaction_id == TRANSACTION_CONNECT {
                self.advance(ClientState::Connected);
            } else if command.transaction_id == TRANSACTION_CREATE_STREAM {
                self.stream_id = command
                    .arguments
                    .first()
                    .and_then(|v| v.as_number())
                    .map(|id| id as u32);
                info!("Stream created with id {:?}", self.stream_id);
                self.advance(ClientState::StreamCreated);
            }
        } else if command.is_error() {
            warn!(
                "Server rejected transaction {}: {}",
                command.transaction_id,
                command.status_code().unwrap_or("no status code")
            );
        } else if command.name == "onStatus" {
            let code = command.status_code().unwrap_or_default();
            info!("onStatus {}", code);
            if code == PLAY_START {
                self.advance(ClientState::Playing);
            }
        }
    }

    /// Run the whole play schedule. Returns the state the session ended in.
    pub async fn run(&mut self) -> Result<ClientState> {
        info!("Playing {}", self.target);

        self.handshake().await?;
        self.connect().await?;
        sleep(self.config.connect_wait).await;
        self.poll().await?;

        self.send_window_ack_size().await?;
        self.create_stream().await?;
        sleep(self.config.create_stream_wait).await;
        self.poll().await?;

        self.play().await?;
        for _ in 0..self.config.play_poll_iterations {
            sleep(self.config.poll_interval).await;
            self.poll().await?;
        }

        sleep(self.config.linger).await;
        info!("Session finished in state {:?}", self.state);
        Ok(self.state)
    }

    pub fn close(&mut self) {
        self.connection.close();
        self.state = ClientState::Disconnected;
    }
}
