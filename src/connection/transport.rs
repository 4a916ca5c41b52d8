use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use async_trait::async_trait;
use log::debug;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Notify;
use crate::{Error, Result};

/// Byte-oriented transport under a connection.
///
/// `send` and `recv` may complete partially. `try_recv` never waits and
/// reports "nothing available" as `ErrorKind::WouldBlock`.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Wait for data. `Ok(0)` means the peer closed the stream.
    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Transport over a tokio TCP stream
pub struct TcpTransport {
    stream: TcpStream,
    peer_addr: Option<SocketAddr>,
}

impl TcpTransport {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::network(format!("Failed to connect: {}", e)))?;
        Self::from_stream(stream)
    }

    pub fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let peer_addr = stream.peer_addr().ok();
        debug!("TCP transport ready, peer {:?}", peer_addr);

        Ok(TcpTransport { stream, peer_addr })
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        self.stream.write(data).await
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf).await
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.try_read(buf)
    }
}

#[derive(Default)]
struct PipeState {
    data: VecDeque<u8>,
    closed: bool,
}

/// One direction of an in-memory byte stream
#[derive(Default)]
struct Pipe {
    state: Mutex<PipeState>,
    notify: Notify,
}

impl Pipe {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_one();
    }
}

/// In-memory transport. `pair()` returns two ends wired back to back, so
/// a scripted peer can drive the other side through the same trait.
pub struct MemoryTransport {
    inbound: Arc<Pipe>,
    outbound: Arc<Pipe>,
    write_cap: Option<usize>,
}

impl MemoryTransport {
    pub fn pair() -> (MemoryTransport, MemoryTransport) {
        let a_to_b = Arc::new(Pipe::default());
        let b_to_a = Arc::new(Pipe::default());

        let a = MemoryTransport {
            inbound: b_to_a.clone(),
            outbound: a_to_b.clone(),
            write_cap: None,
        };
        let b = MemoryTransport {
            inbound: a_to_b,
            outbound: b_to_a,
            write_cap: None,
        };
        (a, b)
    }

    /// Accept at most `cap` bytes per `send` call
    pub fn with_write_cap(mut self, cap: usize) -> Self {
        self.write_cap = Some(cap.max(1));
        self
    }

    /// Bytes written by the other end that have not been received yet
    pub fn pending(&self) -> usize {
        self.inbound.lock().data.len()
    }

    /// Close the outgoing direction; the other end sees end of stream
    pub fn close(&self) {
        self.outbound.close();
    }

    fn drain_into(state: &mut PipeState, buf: &mut [u8]) -> usize {
        let n = buf.len().min(state.data.len());
        for (slot, byte) in buf.iter_mut().zip(state.data.drain(..n)) {
            *slot = byte;
        }
        n
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.outbound.close();
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.write_cap.map_or(data.len(), |cap| cap.min(data.len()));
        {
            let mut state = self.outbound.lock();
            if state.closed {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "memory transport closed"));
            }
            state.data.extend(&data[..n]);
        }
        self.outbound.notify.notify_one();
        Ok(n)
    }

    async fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            {
                let mut state = self.inbound.lock();
                if !state.data.is_empty() {
                    return Ok(Self::drain_into(&mut state, buf));
                }
                if state.closed {
                    return Ok(0);
                }
            }
            self.inbound.notify.notified().await;
        }
    }

    fn try_recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.inbound.lock();
        if !state.data.is_empty() {
            return Ok(Self::drain_into(&mut state, buf));
        }
        if state.closed {
            return Ok(0);
        }
        Err(io::ErrorKind::WouldBlock.into())
    }
}
