//! TCP transport for TTP.
//!
//! Provides the byte-stream collaborator the portal layer builds on: a
//! reliable, bidirectional, ordered stream with a configurable polling
//! window on reads so a multiplexing worker can rotate between channels
//! instead of parking on an idle connection.

pub mod error;
pub mod tcp;

pub use error::{Result, TransportError};
pub use tcp::{PortalStream, TcpTransport, DEFAULT_PORT, POLL_WINDOW};
