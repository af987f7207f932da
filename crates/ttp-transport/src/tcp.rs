use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Standard TTP port. Advisory only; deployments choose their own.
pub const DEFAULT_PORT: u16 = 4020;

/// Reference polling window for multiplexed reads.
///
/// A read that finds no data within this window returns a retryable
/// signal (`WouldBlock`/`TimedOut`) instead of blocking, so a worker
/// sharing the stream across channels can rotate. The value is an
/// implementation detail, not a protocol requirement.
pub const POLL_WINDOW: Duration = Duration::from_millis(1);

/// TCP listener transport.
pub struct TcpTransport {
    listener: TcpListener,
    addr: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on a TCP address.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|e| TransportError::Bind {
            addr,
            source: e,
        })?;
        let addr = listener.local_addr().map_err(TransportError::Io)?;
        info!(%addr, "listening");
        Ok(Self { listener, addr })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<PortalStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        PortalStream::from_std(stream)
    }

    /// The bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// A connected portal stream — implements `Read + Write`.
///
/// Wraps a TCP stream with `TCP_NODELAY` set so that the adjacent frames
/// of one logical send reach the peer promptly.
pub struct PortalStream {
    inner: TcpStream,
}

impl PortalStream {
    /// Connect to a listening transport (blocking).
    pub fn connect(addr: SocketAddr) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(|e| TransportError::Connect {
            addr,
            source: e,
        })?;
        debug!(%addr, "connected");
        Self::from_std(stream)
    }

    fn from_std(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        Ok(Self { inner: stream })
    }

    /// Configure the polling window for reads.
    ///
    /// `Some(window)` makes reads return `WouldBlock`/`TimedOut` when no
    /// byte arrives within the window; `None` restores fully blocking
    /// reads. End-of-stream stays a distinct, terminal signal either way.
    pub fn set_poll_window(&self, window: Option<Duration>) -> Result<()> {
        self.inner.set_read_timeout(window).map_err(Into::into)
    }

    /// Try to clone this stream (creates a new file descriptor sharing
    /// the connection).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self { inner: cloned })
    }

    /// Shut down both directions of the connection.
    ///
    /// Idempotent: an already-closed connection is not an error.
    pub fn shutdown(&self) -> Result<()> {
        match self.inner.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Address of the connected peer.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner.peer_addr().map_err(Into::into)
    }

    /// Local address of this end of the connection.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.inner.local_addr().map_err(Into::into)
    }
}

impl Read for PortalStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for PortalStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl std::fmt::Debug for PortalStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalStream")
            .field("peer", &self.inner.peer_addr().ok())
            .finish()
    }
}
