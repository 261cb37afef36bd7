//! BOSS header codec: the one-byte tag plus inline or extended value.
//!
//! Every encoded item starts with a header byte carrying a 3-bit type code in
//! the low bits and a value field in the high five. A value field below 23 is
//! the value itself; 23..=30 announces that many minus 22 (1..=8)
//! little-endian trailing bytes; 31 switches to the arbitrary-precision form,
//! a varint byte count followed by a little-endian magnitude.

use bytes::{Buf, BufMut, BytesMut};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;

use crate::error::BossError;
use crate::types::Value;

/// BOSS type codes (the low 3 bits of every header byte).
pub mod code {
    pub const INT: u8 = 0;
    pub const EXTRA: u8 = 1;
    pub const NINT: u8 = 2;
    pub const TEXT: u8 = 3;
    pub const BIN: u8 = 4;
    pub const CREF: u8 = 5;
    pub const LIST: u8 = 6;
    pub const DICT: u8 = 7;
}

/// Extended sub-codes carried in the value field of an `EXTRA` header.
pub mod extra {
    pub const DZERO: u64 = 1;
    pub const DONE: u64 = 2;
    pub const DMINUS_ONE: u64 = 4;
    pub const DOUBLE: u64 = 7;
    pub const TRUE: u64 = 12;
    pub const FALSE: u64 = 13;
    pub const TIME: u64 = 15;
    pub const STREAM_MODE: u64 = 16;
}

/// A decoded header: type code plus its non-negative numeric field.
#[derive(Debug, Clone)]
pub struct Header {
    pub code: u8,
    pub value: HeaderValue,
}

/// The numeric field of a header. `Big` only appears for payloads longer
/// than 8 bytes; small magnitudes framed long-form by a foreign encoder are
/// normalized on access.
#[derive(Debug, Clone)]
pub enum HeaderValue {
    Small(u64),
    Big(BigUint),
}

impl Header {
    /// The value field as a machine word, for contexts where the format
    /// requires one: lengths, counts, reference ordinals and sub-codes.
    pub fn small(&self) -> Result<u64, BossError> {
        match &self.value {
            HeaderValue::Small(v) => Ok(*v),
            HeaderValue::Big(b) => b.to_u64().ok_or_else(|| {
                BossError::Format(format!("header value out of range: {b}"))
            }),
        }
    }

    /// Converts the value field into the smallest fitting integer value,
    /// applying the sign conveyed by the type code.
    pub fn into_integer(self, negative: bool) -> Value {
        match self.value {
            HeaderValue::Small(u) => small_integer(u, negative),
            HeaderValue::Big(magnitude) => match magnitude.to_u64() {
                Some(u) => small_integer(u, negative),
                None => {
                    let sign = if negative { Sign::Minus } else { Sign::Plus };
                    Value::BigInteger(BigInt::from_biguint(sign, magnitude))
                }
            },
        }
    }
}

fn small_integer(magnitude: u64, negative: bool) -> Value {
    const I64_MAX: u64 = i64::MAX as u64;
    if negative {
        match magnitude {
            0..=I64_MAX => Value::Integer(-(magnitude as i64)),
            m if m == I64_MAX + 1 => Value::Integer(i64::MIN),
            _ => Value::BigInteger(-BigInt::from(magnitude)),
        }
    } else if magnitude <= I64_MAX {
        Value::Integer(magnitude as i64)
    } else {
        Value::BigInteger(BigInt::from(magnitude))
    }
}

/// Fails with a short-read error unless `needed` bytes remain.
pub fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), BossError> {
    if buf.remaining() < needed {
        Err(BossError::NoData {
            needed,
            available: buf.remaining(),
        })
    } else {
        Ok(())
    }
}

/// Minimal byte length of a non-zero-extended value, 1..=8.
pub(crate) fn size_in_bytes(value: u64) -> usize {
    let mut value = value;
    let mut count = 1;
    while value > 255 {
        count += 1;
        value >>= 8;
    }
    count
}

/// Encodes a header for a value that fits a machine word.
pub fn write_header(buf: &mut BytesMut, code: u8, value: u64) {
    debug_assert!(code <= 7, "type code out of range: {code}");
    if value < 23 {
        buf.put_u8(code | ((value as u8) << 3));
    } else {
        let n = size_in_bytes(value);
        buf.put_u8(code | (((n as u8) + 22) << 3));
        buf.put_slice(&value.to_le_bytes()[..n]);
    }
}

/// Encodes a header for an arbitrary-precision magnitude. Magnitudes that
/// fit 8 bytes take the compact form; the header layout is chosen by the
/// number, not by how the caller happened to hold it.
pub fn write_big_header(buf: &mut BytesMut, code: u8, magnitude: &BigUint) {
    match magnitude.to_u64() {
        Some(value) => write_header(buf, code, value),
        None => {
            buf.put_u8(code | 0xF8);
            let bytes = magnitude.to_bytes_le();
            write_varint(buf, bytes.len() as u64);
            buf.put_slice(&bytes);
        }
    }
}

/// Writes the 7-bit varint used for big-integer lengths and timestamps.
/// Continuation bytes carry bit 7 clear; the terminating byte carries it set.
pub fn write_varint(buf: &mut BytesMut, value: u64) {
    let mut value = value;
    while value > 0x7F {
        buf.put_u8((value & 0x7F) as u8);
        value >>= 7;
    }
    buf.put_u8(value as u8 | 0x80);
}

/// Reads a 7-bit varint. More than 64 accumulated bits is a format error.
pub fn read_varint(buf: &mut impl Buf) -> Result<u64, BossError> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        ensure_remaining(buf, 1)?;
        let b = buf.get_u8();
        if shift >= 64 {
            return Err(BossError::Format("varint exceeds 64 bits".into()));
        }
        value |= u64::from(b & 0x7F) << shift;
        if b & 0x80 != 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

/// Decodes one header from the buffer.
pub fn read_header(buf: &mut impl Buf) -> Result<Header, BossError> {
    ensure_remaining(buf, 1)?;
    let b = buf.get_u8();
    let code = b & 7;
    let field = b >> 3;

    let value = match field {
        0..=22 => HeaderValue::Small(u64::from(field)),
        23..=30 => {
            let n = usize::from(field - 22);
            ensure_remaining(buf, n)?;
            let mut le = [0u8; 8];
            buf.copy_to_slice(&mut le[..n]);
            HeaderValue::Small(u64::from_le_bytes(le))
        }
        _ => {
            let len = read_varint(buf)?;
            let len = usize::try_from(len)
                .map_err(|_| BossError::Format(format!("length out of range: {len}")))?;
            ensure_remaining(buf, len)?;
            let mut bytes = vec![0u8; len];
            buf.copy_to_slice(&mut bytes);
            HeaderValue::Big(BigUint::from_bytes_le(&bytes))
        }
    };

    Ok(Header { code, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(code: u8, value: u64) -> Vec<u8> {
        let mut buf = BytesMut::new();
        write_header(&mut buf, code, value);
        buf.to_vec()
    }

    #[test]
    fn inline_value_boundary() {
        // 22 is the last inline value, 23 takes a trailing byte.
        assert_eq!(header_bytes(code::INT, 22), [0xB0]);
        assert_eq!(header_bytes(code::INT, 23), [0xB8, 0x17]);
    }

    #[test]
    fn trailing_byte_counts() {
        assert_eq!(header_bytes(code::INT, 99), [0xB8, 0x63]);
        assert_eq!(header_bytes(code::INT, 331), [0xC0, 0x4B, 0x01]);
        assert_eq!(
            header_bytes(code::INT, 13457559825),
            [0xD8, 0x11, 0x11, 0x22, 0x22, 0x03]
        );
        assert_eq!(
            header_bytes(code::INT, 4919112987704430865),
            [0xF0, 0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44]
        );
    }

    #[test]
    fn size_in_bytes_boundaries() {
        assert_eq!(size_in_bytes(0), 1);
        assert_eq!(size_in_bytes(255), 1);
        assert_eq!(size_in_bytes(256), 2);
        assert_eq!(size_in_bytes(u64::MAX), 8);
    }

    #[test]
    fn varint_terminator_carries_high_bit() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, 9);
        assert_eq!(&buf[..], [0x89]);

        buf.clear();
        write_varint(&mut buf, 0);
        assert_eq!(&buf[..], [0x80]);

        buf.clear();
        write_varint(&mut buf, 1375965738);
        assert_eq!(&buf[..], [0x2A, 0x24, 0x0E, 0x10, 0x85]);
    }

    #[test]
    fn varint_round_trip() {
        for value in [0u64, 1, 0x7F, 0x80, 0x3FFF, 0x4000, 1375965738, u64::MAX] {
            let mut buf = BytesMut::new();
            write_varint(&mut buf, value);
            let mut cursor = &buf[..];
            assert_eq!(read_varint(&mut cursor).unwrap(), value, "failed for {value}");
            assert!(cursor.is_empty());
        }
    }

    #[test]
    fn varint_overlong_is_format_error() {
        // Eleven continuation bytes would shift past 64 bits.
        let bytes = [0x01u8, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x81];
        assert!(matches!(
            read_varint(&mut &bytes[..]),
            Err(BossError::Format(_))
        ));
    }

    #[test]
    fn header_round_trip() {
        for value in [0u64, 7, 22, 23, 30, 31, 255, 256, 65535, u64::MAX] {
            let mut buf = BytesMut::new();
            write_header(&mut buf, code::INT, value);
            let header = read_header(&mut &buf[..]).unwrap();
            assert_eq!(header.code, code::INT);
            assert_eq!(header.small().unwrap(), value, "failed for {value}");
        }
    }

    #[test]
    fn big_header_delegates_small_magnitudes() {
        let mut buf = BytesMut::new();
        write_big_header(&mut buf, code::INT, &BigUint::from(99u32));
        assert_eq!(&buf[..], [0xB8, 0x63]);
    }

    #[test]
    fn big_header_extended_form() {
        let magnitude: BigUint = "97152833356252188945".parse().unwrap();
        let mut buf = BytesMut::new();
        write_big_header(&mut buf, code::INT, &magnitude);
        assert_eq!(
            &buf[..],
            [0xF8, 0x89, 0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44, 0x05]
        );

        let header = read_header(&mut &buf[..]).unwrap();
        assert_eq!(header.code, code::INT);
        let Value::BigInteger(decoded) = header.into_integer(false) else {
            panic!("expected a big integer");
        };
        assert_eq!(decoded, "97152833356252188945".parse::<BigInt>().unwrap());
    }

    #[test]
    fn extended_framed_small_value_normalizes() {
        // A foreign encoder may frame a small number long-form.
        let bytes = [0xF8u8, 0x81, 0x05];
        let header = read_header(&mut &bytes[..]).unwrap();
        assert_eq!(header.small().unwrap(), 5);
        assert_eq!(header.into_integer(false), Value::Integer(5));
    }

    #[test]
    fn negative_magnitude_edge_cases() {
        assert_eq!(small_integer(7, true), Value::Integer(-7));
        assert_eq!(
            small_integer(i64::MAX as u64, true),
            Value::Integer(-i64::MAX)
        );
        assert_eq!(
            small_integer(i64::MAX as u64 + 1, true),
            Value::Integer(i64::MIN)
        );
        assert!(matches!(
            small_integer(u64::MAX, true),
            Value::BigInteger(_)
        ));
    }

    #[test]
    fn truncated_header_is_short_read() {
        // Announces two trailing bytes, supplies one.
        let bytes = [0xC0u8, 0x4B];
        assert!(matches!(
            read_header(&mut &bytes[..]),
            Err(BossError::NoData { needed: 2, available: 1 })
        ));
    }
}
