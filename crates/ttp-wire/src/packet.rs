use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::header::Header;

/// The TTP message unit: an immutable (header, body, footer) triple.
///
/// The header is a 32-bit tag classifying the body; unknown tags are
/// legal on the wire. The body is a byte sequence, UTF-8 encoded whenever
/// it carries a textual value. The footer is a 16-bit code for small
/// auxiliary data such as an operation subtype; zero means "unspecified".
///
/// Equality, hashing, and ordering are structural over all three fields,
/// with ordering lexicographic on (header, body bytes, footer).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Packet {
    header: i32,
    body: Bytes,
    footer: u16,
}

/// Typed view of a packet body, decoded by its catalog header.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i32),
    Double(f64),
    Text(String),
}

impl Packet {
    /// A no-operation placeholder packet.
    pub fn nop() -> Packet {
        Packet::raw(Header::Nop.mask(), Bytes::new(), 0)
    }

    /// A `BOOLEAN` packet with body `"true"` or `"false"`.
    pub fn of_bool(val: bool) -> Packet {
        Packet::of(Header::Boolean, if val { "true" } else { "false" }, 0)
    }

    /// An `INTEGER` packet with the decimal representation as body.
    pub fn of_int(val: i32) -> Packet {
        Packet::of(Header::Integer, &val.to_string(), 0)
    }

    /// A `DOUBLE` packet with the decimal representation as body.
    pub fn of_double(val: f64) -> Packet {
        Packet::of(Header::Double, &val.to_string(), 0)
    }

    /// A `STRING` packet carrying UTF-8 text.
    pub fn of_string(val: impl Into<String>) -> Packet {
        Packet::raw(Header::String.mask(), Bytes::from(val.into()), 0)
    }

    /// A packet with an explicit catalog header, textual body, and footer.
    pub fn of(header: Header, body: &str, footer: u16) -> Packet {
        Packet::raw(header.mask(), Bytes::copy_from_slice(body.as_bytes()), footer)
    }

    /// A packet from raw parts. No re-encoding or validation is applied;
    /// the mask need not be registered in any catalog.
    pub fn raw(header: i32, body: impl Into<Bytes>, footer: u16) -> Packet {
        Packet {
            header,
            body: body.into(),
            footer,
        }
    }

    /// The header mask.
    pub fn header(&self) -> i32 {
        self.header
    }

    /// The catalog header for this packet's mask, if registered.
    pub fn tag(&self) -> Option<Header> {
        Header::from_mask(self.header)
    }

    /// The body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The footer code.
    pub fn footer(&self) -> u16 {
        self.footer
    }

    /// The body decoded as UTF-8 text. Never fails: invalid sequences
    /// become replacement characters.
    pub fn format(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The body decoded by this packet's catalog header.
    ///
    /// Total: unknown headers and unparsable bodies fall back to
    /// [`Value::Text`].
    pub fn value(&self) -> Value {
        let text = self.format();
        match self.tag() {
            Some(Header::Boolean) => match text.as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => Value::Text(text),
            },
            Some(Header::Integer) => match text.parse() {
                Ok(v) => Value::Integer(v),
                Err(_) => Value::Text(text),
            },
            Some(Header::Double) => match text.parse() {
                Ok(v) => Value::Double(v),
                Err(_) => Value::Text(text),
            },
            _ => Value::Text(text),
        }
    }

    /// The framed length of this packet on the wire.
    pub fn wire_size(&self) -> usize {
        crate::codec::FRAME_OVERHEAD + self.body.len()
    }
}

impl Default for Packet {
    fn default() -> Packet {
        Packet::nop()
    }
}

impl fmt::Display for Packet {
    /// Formats as `[HHH:body:FFFFF]` — header zero-padded to 3 digits,
    /// footer to 5, body as UTF-8 text. Always at least 12 characters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:03}:{}:{:05}]", self.header, self.format(), self.footer)
    }
}

/// Failure to parse a packet literal.
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed packet literal `{literal}`")]
pub struct ParsePacketError {
    literal: String,
}

impl ParsePacketError {
    fn new(s: &str) -> ParsePacketError {
        ParsePacketError {
            literal: s.to_owned(),
        }
    }
}

impl FromStr for Packet {
    type Err = ParsePacketError;

    /// Parses the `[HHH:body:FFFFF]` form produced by `Display`.
    ///
    /// Field positions are fixed from both ends, so bodies containing
    /// colons or brackets round-trip.
    fn from_str(s: &str) -> Result<Packet, ParsePacketError> {
        let bytes = s.as_bytes();
        if bytes.len() < 12 || bytes[0] != b'[' || bytes[bytes.len() - 1] != b']' {
            return Err(ParsePacketError::new(s));
        }
        if bytes[4] != b':' || bytes[bytes.len() - 7] != b':' {
            return Err(ParsePacketError::new(s));
        }
        let header: i32 = s[1..4].parse().map_err(|_| ParsePacketError::new(s))?;
        let footer: u16 = s[bytes.len() - 6..bytes.len() - 1]
            .parse()
            .map_err(|_| ParsePacketError::new(s))?;
        let body = &s[5..bytes.len() - 7];
        Ok(Packet::raw(header, Bytes::copy_from_slice(body.as_bytes()), footer))
    }
}

impl Packet {
    /// See [`FromStr`].
    pub fn parse(s: &str) -> Result<Packet, ParsePacketError> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_constructors_encode_utf8_decimal() {
        assert_eq!(Packet::of_bool(true).format(), "true");
        assert_eq!(Packet::of_bool(false).format(), "false");
        assert_eq!(Packet::of_int(-42).format(), "-42");
        assert_eq!(Packet::of_double(2.5).format(), "2.5");
        assert_eq!(Packet::of_string("héllo").format(), "héllo");
        assert_eq!(Packet::of_bool(true).header(), Header::Boolean.mask());
        assert_eq!(Packet::of_int(7).header(), Header::Integer.mask());
        assert_eq!(Packet::of_double(0.0).header(), Header::Double.mask());
        assert_eq!(Packet::of_string("x").header(), Header::String.mask());
    }

    #[test]
    fn constructors_default_footer_zero() {
        assert_eq!(Packet::of_string("x").footer(), 0);
        assert_eq!(Packet::of(Header::Op, "add", 3).footer(), 3);
    }

    #[test]
    fn display_pads_header_and_footer() {
        assert_eq!(Packet::of_string("hello").to_string(), "[103:hello:00000]");
        assert_eq!(Packet::of(Header::Op, "", 5).to_string(), "[001::00005]");
        assert_eq!(Packet::nop().to_string(), "[000::00000]");
        assert!(Packet::nop().to_string().len() >= 12);
    }

    #[test]
    fn parse_roundtrips_display() {
        let packets = [
            Packet::nop(),
            Packet::of_bool(true),
            Packet::of_int(123),
            Packet::of_string("with:colons:inside"),
            Packet::of(Header::Op, "op-body", 65535),
            Packet::raw(999, Bytes::from_static(b"x"), 5),
        ];
        for p in packets {
            assert_eq!(Packet::parse(&p.to_string()).unwrap(), p);
        }
    }

    #[test]
    fn parse_rejects_malformed_literals() {
        for bad in ["", "[103:hi:0]", "103:hi:00000", "[10a:hi:00000]", "[103:hi:9999x]"] {
            assert!(Packet::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn equality_is_structural() {
        let a = Packet::of_string("same");
        let b = Packet::raw(103, Bytes::from_static(b"same"), 0);
        assert_eq!(a, b);
        assert_ne!(a, Packet::of_string("other"));
        assert_ne!(a, Packet::of(Header::String, "same", 1));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let low_header = Packet::raw(1, Bytes::from_static(b"zzz"), 9);
        let high_header = Packet::raw(2, Bytes::from_static(b"aaa"), 0);
        assert!(low_header < high_header);

        let short_body = Packet::raw(1, Bytes::from_static(b"ab"), 9);
        let long_body = Packet::raw(1, Bytes::from_static(b"b"), 0);
        assert!(short_body < long_body);

        let small_footer = Packet::raw(1, Bytes::from_static(b"ab"), 1);
        let big_footer = Packet::raw(1, Bytes::from_static(b"ab"), 2);
        assert!(small_footer < big_footer);
    }

    #[test]
    fn format_is_lossy_never_failing() {
        let p = Packet::raw(103, Bytes::from_static(&[0xFF, 0xFE, b'a']), 0);
        let text = p.format();
        assert!(text.ends_with('a'));
        assert!(text.contains('\u{FFFD}'));
    }

    #[test]
    fn value_decodes_by_header() {
        assert_eq!(Packet::of_bool(true).value(), Value::Boolean(true));
        assert_eq!(Packet::of_int(-3).value(), Value::Integer(-3));
        assert_eq!(Packet::of_double(1.5).value(), Value::Double(1.5));
        assert_eq!(
            Packet::of_string("plain").value(),
            Value::Text("plain".to_owned())
        );
        // Unparsable datum bodies and unknown headers degrade to text.
        assert_eq!(
            Packet::of(Header::Integer, "NaN", 0).value(),
            Value::Text("NaN".to_owned())
        );
        assert_eq!(
            Packet::raw(999, Bytes::from_static(b"x"), 0).value(),
            Value::Text("x".to_owned())
        );
    }

    #[test]
    fn wire_size_counts_framing() {
        assert_eq!(Packet::nop().wire_size(), 10);
        assert_eq!(Packet::of_string("hello").wire_size(), 15);
    }
}
