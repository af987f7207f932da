use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, WireError};
use crate::packet::Packet;

/// Fixed prefix of a frame: header (4) + body length (4) = 8 bytes.
pub const FRAME_PREFIX: usize = 8;

/// Framing overhead per packet: prefix + footer (2) = 10 bytes.
pub const FRAME_OVERHEAD: usize = 10;

/// Maximum body length the 32-bit length field can express.
pub const MAX_BODY_LEN: usize = i32::MAX as usize;

/// Encode a packet into the wire format.
///
/// Wire format (all fields big-endian):
/// ```text
/// ┌─────────────┬─────────────┬──────────────┬─────────────┐
/// │ Header      │ Body length │ Body          │ Footer      │
/// │ (4B, i32)   │ (4B, i32)   │ (length bytes)│ (2B, u16)   │
/// └─────────────┴─────────────┴──────────────┴─────────────┘
/// ```
///
/// The header mask is not validated against any catalog and the body is
/// not interpreted.
pub fn encode_packet(p: &Packet, dst: &mut BytesMut) -> Result<()> {
    let body = p.body();
    if body.len() > MAX_BODY_LEN {
        return Err(WireError::BodyTooLarge {
            size: body.len(),
            max: MAX_BODY_LEN,
        });
    }
    dst.reserve(FRAME_OVERHEAD + body.len());
    dst.put_i32(p.header());
    dst.put_i32(body.len() as i32);
    dst.put_slice(body);
    dst.put_u16(p.footer());
    Ok(())
}

/// Decode a packet from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_packet(src: &mut BytesMut) -> Result<Option<Packet>> {
    if src.len() < FRAME_PREFIX {
        return Ok(None); // Need more data
    }

    let declared = i32::from_be_bytes(src[4..8].try_into().unwrap());
    if declared < 0 {
        return Err(WireError::NegativeBodyLength(declared));
    }
    let body_len = declared as usize;

    let total = FRAME_OVERHEAD + body_len;
    if src.len() < total {
        return Ok(None); // Need more data
    }

    let header = src.get_i32();
    src.advance(4);
    let body = src.split_to(body_len).freeze();
    let footer = src.get_u16();

    Ok(Some(Packet::raw(header, body, footer)))
}
