//! Tagged Transfer Protocol.
//!
//! TTP exchanges typed packets — (header, body, footer) triples — over a
//! reliable byte stream, and multiplexes many logical channels over one
//! connection through a background selector worker.
//!
//! # Crate Structure
//!
//! - [`wire`] — Packet model, header catalog, framed binary codec
//! - [`transport`] — TCP transport with polling-window reads
//! - [`portal`] — Channels, multiplexed/direct portals, the selector
//!   engine (behind the default `portal` feature)

/// Re-export wire types.
pub mod wire {
    pub use ttp_wire::*;
}

/// Re-export transport types.
pub mod transport {
    pub use ttp_transport::*;
}

/// Re-export portal types (requires the `portal` feature).
#[cfg(feature = "portal")]
pub mod portal {
    pub use ttp_portal::*;
}
