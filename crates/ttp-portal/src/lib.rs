//! Channel multiplexing for TTP.
//!
//! This is the core value-add layer of TTP: many logical conversations
//! ("channels") share one byte stream bidirectionally. A background
//! selector worker owns all stream I/O, prefixing every payload frame
//! with a routing frame naming its channel, and drains every outbound
//! queue before it exits so a graceful stop never drops packets.
//!
//! The singleplexed [`DirectPortal`] skips all of that and applies the
//! codec straight to a blocking stream.

pub mod channel;
pub mod connector;
pub mod direct;
pub mod error;
pub mod listener;
pub mod portal;
mod selector;

pub use channel::Channel;
pub use connector::{connect, connect_direct};
pub use direct::DirectPortal;
pub use error::{PortalError, Result};
pub use listener::{PortalListener, DEFAULT_CHANNEL_COUNT};
pub use portal::MultiplexedPortal;
pub use selector::SelectorState;
