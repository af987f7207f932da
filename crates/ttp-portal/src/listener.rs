use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use ttp_transport::TcpTransport;

use crate::direct::DirectPortal;
use crate::error::Result;
use crate::portal::MultiplexedPortal;

/// Default number of channels for accepted portals.
pub const DEFAULT_CHANNEL_COUNT: usize = 1;

/// Listens for and accepts portal connections.
pub struct PortalListener {
    transport: TcpTransport,
    channel_count: usize,
    next_portal_id: AtomicU64,
}

impl PortalListener {
    /// Bind to a TCP address.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        let transport = TcpTransport::bind(addr)?;
        Ok(Self {
            transport,
            channel_count: DEFAULT_CHANNEL_COUNT,
            next_portal_id: AtomicU64::new(1),
        })
    }

    /// Override the channel count for accepted multiplexed portals.
    ///
    /// Both ends of a connection must agree on the count; TTP carries no
    /// negotiation.
    pub fn with_channel_count(mut self, channel_count: usize) -> Self {
        self.channel_count = channel_count;
        self
    }

    /// Accept the next connection as a multiplexed portal with an
    /// auto-generated name.
    pub fn accept(&self) -> Result<MultiplexedPortal> {
        let id = self.next_portal_id.fetch_add(1, Ordering::Relaxed);
        let stream = self.transport.accept()?;
        MultiplexedPortal::open(stream, format!("portal-{id}"), self.channel_count)
    }

    /// Accept the next connection as a direct (singleplexed) portal.
    pub fn accept_direct(&self) -> Result<DirectPortal> {
        let id = self.next_portal_id.fetch_add(1, Ordering::Relaxed);
        let stream = self.transport.accept()?;
        DirectPortal::open(stream, format!("portal-{id}"))
    }

    /// The bound local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }
}
