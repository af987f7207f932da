use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::encode_packet;
use crate::error::{Result, WireError};
use crate::packet::Packet;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete packets to any `Write` stream.
///
/// [`write_packet`] leaves flushing to the caller so that several frames
/// can reach the peer as one unit; [`send`] is the write-and-flush
/// convenience for callers sending one packet at a time.
///
/// [`write_packet`]: PacketWriter::write_packet
/// [`send`]: PacketWriter::send
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> PacketWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode and write one packet without flushing.
    pub fn write_packet(&mut self, p: &Packet) -> Result<()> {
        self.buf.clear();
        encode_packet(p, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => {
                    return Err(WireError::Io(std::io::Error::new(
                        ErrorKind::WriteZero,
                        "stream rejected write",
                    )))
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
        }
        Ok(())
    }

    /// Encode, write, and flush one packet.
    pub fn send(&mut self, p: &Packet) -> Result<()> {
        self.write_packet(p)?;
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(WireError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
