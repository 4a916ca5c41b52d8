use std::io::ErrorKind;
use log::{trace, warn};
use crate::connection::Transport;
use crate::protocol::{DEFAULT_BUFFER_CAPACITY, DEFAULT_IO_RETRIES};
use crate::{Error, Result};

/// Largest single non-blocking read
const READ_CHUNK: usize = 64 * 1024;

/// Owns the transport and the receive buffer.
///
/// Blocking operations make a bounded number of transport calls and
/// accumulate partial progress across them.
pub struct SocketBuffer<T: Transport> {
    transport: T,
    recv: Vec<u8>,
    capacity: usize,
    retries: usize,
}

impl<T: Transport> SocketBuffer<T> {
    pub fn new(transport: T) -> Self {
        Self::with_limits(transport, DEFAULT_BUFFER_CAPACITY, DEFAULT_IO_RETRIES)
    }

    pub fn with_limits(transport: T, capacity: usize, retries: usize) -> Self {
        SocketBuffer {
            transport,
            recv: Vec::new(),
            capacity,
            retries: retries.max(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Write all of `data` or fail with a network error
    pub async fn send_all(&mut self, data: &[u8]) -> Result<()> {
        let mut written = 0;
        let mut attempts = 0;

        while written < data.len() {
            if attempts == self.retries {
                return Err(Error::network(format!(
                    "sent {} of {} bytes after {} attempts",
                    written,
                    data.len(),
                    attempts
                )));
            }
            attempts += 1;

            match self.transport.send(&data[written..]).await {
                Ok(0) => return Err(Error::network("transport accepted no bytes")),
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::network(format!("send failed: {}", e))),
            }
        }

        trace!("sent {} bytes in {} call(s)", data.len(), attempts);
        Ok(())
    }

    /// Read exactly `len` bytes, taking already buffered bytes first
    pub async fn recv_exact(&mut self, len: usize) -> Result<Vec<u8>> {
        let buffered = self.recv.len().min(len);
        let mut out: Vec<u8> = self.recv.drain(..buffered).collect();
        out.resize(len, 0);

        let mut filled = buffered;
        let mut attempts = 0;
        while filled < len {
            if attempts == self.retries {
                return Err(Error::network(format!(
                    "received {} of {} bytes after {} attempts",
                    filled, len, attempts
                )));
            }
            attempts += 1;

            match self.transport.recv(&mut out[filled..]).await {
                Ok(0) => return Err(Error::network("connection closed by peer")),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::network(format!("receive failed: {}", e))),
            }
        }

        Ok(out)
    }

    /// Append whatever the transport has ready to the receive buffer.
    ///
    /// Makes a single non-blocking read and returns the number of bytes
    /// added; 0 means nothing was available.
    pub fn fill_nonblocking(&mut self) -> Result<usize> {
        let start = self.recv.len();
        if start >= self.capacity {
            return Err(Error::buffer_overflow(format!(
                "receive buffer full ({} bytes)",
                self.capacity
            )));
        }

        let room = (self.capacity - start).min(READ_CHUNK);
        self.recv.resize(start + room, 0);
        let result = self.transport.try_recv(&mut self.recv[start..]);

        match result {
            Ok(0) => {
                self.recv.truncate(start);
                Err(Error::network("connection closed by peer"))
            }
            Ok(n) => {
                self.recv.truncate(start + n);
                trace!("drained {} bytes, {} buffered", n, self.recv.len());
                Ok(n)
            }
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                self.recv.truncate(start);
                Ok(0)
            }
            Err(e) => {
                self.recv.truncate(start);
                warn!("non-blocking receive failed: {}", e);
                Err(Error::network(format!("receive failed: {}", e)))
            }
        }
    }

    /// Bytes received but not yet consumed
    pub fn buffered(&self) -> &[u8] {
        &self.recv
    }

    /// Drop the first `n` buffered bytes
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.recv.len());
        self.recv.drain(..n);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
