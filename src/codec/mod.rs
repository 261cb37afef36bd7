//! BOSS binary encoding: header codec, reference caches, and the write/read
//! engines, plus one-shot `pack`/`unpack` entry points.
//!
//! A BOSS byte stream has no outer envelope: it is exactly the concatenation
//! of one encoded value per engine call. Consumers either know how many root
//! values to expect or read until the source is exhausted.

pub(crate) mod cache;
pub mod header;
pub mod reader;
pub mod writer;

pub use reader::ReadEngine;
pub use writer::WriteEngine;

use bytes::{Buf, Bytes, BytesMut};

use crate::error::BossError;
use crate::types::Value;

/// Encodes a single value with a fresh reference cache.
pub fn pack(value: &Value) -> Result<Bytes, BossError> {
    let mut buf = BytesMut::new();
    WriteEngine::new().put(&mut buf, value)?;
    Ok(buf.freeze())
}

/// Decodes a single value with a fresh reference cache. Trailing bytes are
/// ignored; use [`unpack_all`] to consume a sequence.
pub fn unpack(bytes: &[u8]) -> Result<Value, BossError> {
    ReadEngine::new().read(&mut &bytes[..])
}

/// Decodes root values until the buffer is exhausted. Truncation inside an
/// item still fails; exhaustion at an item boundary ends the sequence.
pub fn unpack_all(bytes: &[u8]) -> Result<Vec<Value>, BossError> {
    let mut engine = ReadEngine::new();
    let mut cursor = &bytes[..];
    let mut values = Vec::new();
    while cursor.has_remaining() {
        values.push(engine.read(&mut cursor)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack() {
        let value: Value = "Hello".into();
        let packed = pack(&value).unwrap();
        assert_eq!(unpack(&packed).unwrap(), value);
    }

    #[test]
    fn unpack_ignores_trailing_bytes() {
        assert_eq!(unpack(&[0x38, 0xFF]).unwrap(), Value::Integer(7));
    }

    #[test]
    fn unpack_all_reads_a_sequence() {
        let mut buf = BytesMut::new();
        let mut engine = WriteEngine::new();
        for value in [Value::Integer(1), "two".into(), Value::Null] {
            engine.put(&mut buf, &value).unwrap();
        }
        let values = unpack_all(&buf).unwrap();
        assert_eq!(values, [Value::Integer(1), "two".into(), Value::Null]);
    }

    #[test]
    fn unpack_all_empty_input() {
        assert_eq!(unpack_all(&[]).unwrap(), []);
    }

    #[test]
    fn unpack_all_rejects_mid_item_truncation() {
        // A complete integer followed by a truncated text.
        let result = unpack_all(&[0x38, 0x2B, 0x48]);
        assert!(matches!(result, Err(BossError::NoData { .. })));
    }
}
