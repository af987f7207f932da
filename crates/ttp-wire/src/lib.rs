//! Packet model and framed binary codec for TTP.
//!
//! This is the wire layer of TTP. Every message is a packet framed with:
//! - A 4-byte big-endian header tag classifying the body
//! - A 4-byte big-endian body length
//! - A 2-byte big-endian footer for caller-defined auxiliary data
//!
//! No partial reads, no buffer management in user code.

pub mod codec;
pub mod error;
pub mod header;
pub mod packet;
pub mod reader;
pub mod writer;

pub use codec::{decode_packet, encode_packet, FRAME_OVERHEAD, FRAME_PREFIX, MAX_BODY_LEN};
pub use error::{Result, WireError};
pub use header::{name_of, Catalog, Category, Header, StandardCatalog};
pub use packet::{Packet, ParsePacketError, Value};
pub use reader::PacketReader;
pub use writer::PacketWriter;
