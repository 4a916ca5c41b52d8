use std::time::Duration;
use crate::connection::ConnectionLimits;
use crate::protocol::*;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Outgoing chunk size, announced after the handshake when not 128
    pub send_chunk_size: u32,

    /// Window acknowledgement size sent after `connect`
    pub window_ack_size: u32,

    /// Transport calls per blocking send or receive
    pub io_retries: usize,

    /// Receive buffer capacity in bytes
    pub recv_buffer_capacity: usize,

    /// Reassembly buffer capacity per chunk stream
    pub reassembly_capacity: usize,

    /// `flashVer` reported in `connect`
    pub flash_ver: String,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Wait between `connect` and the first poll
    pub connect_wait: Duration,

    /// Wait between `createStream` and the following poll
    pub create_stream_wait: Duration,

    /// Sleep before each poll while playing
    pub poll_interval: Duration,

    /// Number of polls after `play`
    pub play_poll_iterations: usize,

    /// Idle time before the session ends
    pub linger: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            send_chunk_size: DEFAULT_CHUNK_SIZE as u32,
            window_ack_size: DEFAULT_WINDOW_ACK_SIZE,
            io_retries: DEFAULT_IO_RETRIES,
            recv_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            reassembly_capacity: DEFAULT_BUFFER_CAPACITY,
            flash_ver: "FMSc/1.0".to_string(),
            connect_timeout: Duration::from_secs(10),
            connect_wait: Duration::from_millis(500),
            create_stream_wait: Duration::from_millis(100),
            poll_interval: Duration::from_millis(10),
            play_poll_iterations: 1000,
            linger: Duration::from_millis(1000),
        }
    }
}

impl ClientConfig {
    /// Create config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.send_chunk_size == 0 || self.send_chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::config(format!(
                "Chunk size must be between 1 and {}",
                MAX_CHUNK_SIZE
            )));
        }

        if self.io_retries == 0 {
            return Err(Error::config("At least one I/O attempt is required"));
        }

        if self.recv_buffer_capacity == 0 || self.reassembly_capacity == 0 {
            return Err(Error::config("Buffer capacities must be non-zero"));
        }

        Ok(())
    }

    pub fn limits(&self) -> ConnectionLimits {
        ConnectionLimits {
            io_retries: self.io_retries,
            recv_buffer_capacity: self.recv_buffer_capacity,
            reassembly_capacity: self.reassembly_capacity,
        }
    }
}

/// Builder for ClientConfig
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }

    pub fn send_chunk_size(mut self, size: u32) -> Self {
        self.config.send_chunk_size = size;
        self
    }

    pub fn window_ack_size(mut self, size: u32) -> Self {
        self.config.window_ack_size = size;
        self
    }

    pub fn io_retries(mut self, retries: usize) -> Self {
        self.config.io_retries = retries;
        self
    }

    pub fn recv_buffer_capacity(mut self, bytes: usize) -> Self {
        self.config.recv_buffer_capacity = bytes;
        self
    }

    pub fn reassembly_capacity(mut self, bytes: usize) -> Self {
        self.config.reassembly_capacity = bytes;
        self
    }

    pub fn flash_ver(mut self, flash_ver: impl Into<String>) -> Self {
        self.config.flash_ver = flash_ver.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set every wait of the polling schedule at once
    pub fn schedule(
        mut self,
        connect_wait: Duration,
        create_stream_wait: Duration,
        poll_interval: Duration,
        linger: Duration,
    ) -> Self {
        self.config.connect_wait = connect_wait;
        self.config.create_stream_wait = create_stream_wait;
        self.config.poll_interval = poll_interval;
        self.config.linger = linger;
        self
    }

    pub fn play_poll_iterations(mut self, iterations: usize) -> Self {
        self.config.play_poll_iterations = iterations;
        self
    }

    /// Build configuration
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
