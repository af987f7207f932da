use tracing::debug;
use ttp_transport::PortalStream;
use ttp_wire::{Packet, PacketReader, PacketWriter};

use crate::error::{PortalError, Result};

/// A singleplexed endpoint: the codec applied directly to a blocking
/// stream.
///
/// No selector, no channels — every [`send`] writes one frame and every
/// [`receive`] blocks for one. Strictly simpler than the multiplexed
/// portal; useful when one conversation owns the connection.
///
/// [`send`]: DirectPortal::send
/// [`receive`]: DirectPortal::receive
pub struct DirectPortal {
    name: String,
    reader: PacketReader<PortalStream>,
    writer: PacketWriter<PortalStream>,
    closed: bool,
}

impl DirectPortal {
    /// Open a direct portal over `stream` with fully blocking reads.
    pub fn open(stream: PortalStream, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        stream.set_poll_window(None)?;
        let reader = PacketReader::new(stream.try_clone()?);
        debug!(%name, "direct portal open");
        Ok(Self {
            name,
            reader,
            writer: PacketWriter::new(stream),
            closed: false,
        })
    }

    /// Write and flush one packet.
    pub fn send(&mut self, p: &Packet) -> Result<()> {
        if self.closed {
            return Err(PortalError::Closed);
        }
        self.writer.send(p)?;
        Ok(())
    }

    /// Block for the next packet.
    pub fn receive(&mut self) -> Result<Packet> {
        if self.closed {
            return Err(PortalError::Closed);
        }
        Ok(self.reader.read_packet()?)
    }

    /// Send `p` and block for the reply.
    pub fn transfer(&mut self, p: &Packet) -> Result<Packet> {
        self.send(p)?;
        self.receive()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the portal and shut the connection down. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.get_ref().shutdown()?;
        debug!(name = %self.name, "direct portal closed");
        Ok(())
    }
}

impl Drop for DirectPortal {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
