use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::decode_packet;
use crate::error::{Result, WireError};
use crate::packet::Packet;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete packets from any `Read` stream.
///
/// Handles partial reads internally — callers always get complete packets.
/// Two entry points serve the two consumption modes: [`read_packet`]
/// blocks until a packet arrives, [`poll_packet`] gives up as soon as the
/// stream's polling window elapses so a caller can rotate elsewhere.
///
/// [`read_packet`]: PacketReader::read_packet
/// [`poll_packet`]: PacketReader::poll_packet
pub struct PacketReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> PacketReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Read the next complete packet, blocking as long as it takes.
    ///
    /// A stream configured with a read timeout simply retries until data
    /// arrives. Returns `Err(WireError::EndOfStream)` on EOF at a frame
    /// boundary and `Err(WireError::Truncated)` on EOF mid-frame.
    pub fn read_packet(&mut self) -> Result<Packet> {
        loop {
            if let Some(p) = decode_packet(&mut self.buf)? {
                return Ok(p);
            }
            match self.fill()? {
                Filled::Data => continue,
                Filled::WindowElapsed => continue,
                Filled::Eof => return Err(self.eof_error()),
            }
        }
    }

    /// Read the next complete packet, or `None` if the stream's polling
    /// window elapses before one is fully buffered.
    ///
    /// Partial frame bytes stay buffered for the next call, so polling
    /// never loses framing.
    pub fn poll_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            if let Some(p) = decode_packet(&mut self.buf)? {
                return Ok(Some(p));
            }
            match self.fill()? {
                Filled::Data => continue,
                Filled::WindowElapsed => return Ok(None),
                Filled::Eof => return Err(self.eof_error()),
            }
        }
    }

    fn fill(&mut self) -> Result<Filled> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => return Ok(Filled::Eof),
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(Filled::Data);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock
                        || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(Filled::WindowElapsed)
                }
                Err(err) => return Err(WireError::Io(err)),
            }
        }
    }

    fn eof_error(&self) -> WireError {
        if self.buf.is_empty() {
            WireError::EndOfStream
        } else {
            WireError::Truncated
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

enum Filled {
    Data,
    WindowElapsed,
    Eof,
}
