use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;
use ttp_transport::{PortalStream, POLL_WINDOW};
use ttp_wire::{Packet, PacketReader, PacketWriter};

use crate::channel::Channel;
use crate::error::{PortalError, Result};
use crate::selector::{Selector, SelectorState};

/// A multiplexed endpoint: one stream, one codec, `N` channels, one
/// selector.
///
/// Once the portal is open, all stream I/O happens on the selector's
/// worker thread; applications only touch channel queues. The `closed`
/// flag is monotonic — once set it never clears.
pub struct MultiplexedPortal {
    name: String,
    channels: Arc<[Channel]>,
    selector: Selector,
    stream: PortalStream,
    closed: AtomicBool,
}

impl MultiplexedPortal {
    /// Open a portal over `stream` with channels `0..channel_count`.
    ///
    /// Configures the stream's polling window so idle reads return
    /// promptly, then starts the selector.
    pub fn open(
        stream: PortalStream,
        name: impl Into<String>,
        channel_count: usize,
    ) -> Result<Self> {
        let name = name.into();
        stream.set_poll_window(Some(POLL_WINDOW))?;

        let reader = PacketReader::new(stream.try_clone()?);
        let writer = PacketWriter::new(stream.try_clone()?);

        let channels: Arc<[Channel]> = (0..channel_count).map(Channel::new).collect();
        let selector = Selector::new(Arc::clone(&channels));
        selector.start(reader, writer)?;
        debug!(%name, channel_count, "portal open");

        Ok(Self {
            name,
            channels,
            selector,
            stream,
            closed: AtomicBool::new(false),
        })
    }

    /// Channel `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= channel_count()`; asking for a channel the portal
    /// was not opened with is a programming error.
    pub fn channel(&self, i: usize) -> &Channel {
        &self.channels[i]
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Selector cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.selector.cycles()
    }

    /// Current lifecycle state of the selector worker.
    pub fn selector_state(&self) -> SelectorState {
        self.selector.state()
    }

    /// Enqueue `packet` on channel `channel`.
    ///
    /// Fails with [`PortalError::Closed`] once the portal has closed.
    pub fn send(&self, channel: usize, packet: Packet) -> Result<()> {
        if self.is_closed() {
            return Err(PortalError::Closed);
        }
        self.channel(channel).send(packet);
        Ok(())
    }

    /// Dequeue the next packet received on channel `channel`.
    pub fn receive(&self, channel: usize) -> Result<Option<Packet>> {
        if self.is_closed() {
            return Err(PortalError::Closed);
        }
        Ok(self.channel(channel).receive())
    }

    /// Send `packet` on channel `channel` and block for the reply.
    ///
    /// The await wakes spuriously when the portal closes; in that case
    /// this fails with [`PortalError::Closed`] instead of a reply.
    pub fn transfer(&self, channel: usize, packet: Packet) -> Result<Packet> {
        self.send(channel, packet)?;
        let ch = self.channel(channel);
        loop {
            ch.await_input();
            if let Some(reply) = ch.receive() {
                return Ok(reply);
            }
            if self.is_closed() {
                return Err(PortalError::Closed);
            }
        }
    }

    /// Close the portal. Idempotent.
    ///
    /// Sets `closed`, waits for the selector to drain every outbound
    /// queue and stop, then shuts the underlying stream down. Blocked
    /// awaiters on all channels are released.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.selector.stop();
        for channel in self.channels.iter() {
            channel.release();
        }
        self.stream.shutdown()?;
        debug!(name = %self.name, "portal closed");
        Ok(())
    }
}

impl Drop for MultiplexedPortal {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for MultiplexedPortal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiplexedPortal")
            .field("name", &self.name)
            .field("channels", &self.channels.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
