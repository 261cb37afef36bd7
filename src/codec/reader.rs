//! BOSS decoding: bytes → `Value`, with reference caching.

use std::sync::Arc;

use bytes::Buf;
use num_traits::ToPrimitive;

use crate::error::BossError;
use crate::types::{StructValue, Value};

use super::cache::ReadCache;
use super::header::{code, ensure_remaining, extra, read_header, read_varint};

/// Upper bound on up-front capacity reservation for containers, so a hostile
/// count cannot allocate unbounded memory before any element is decoded.
pub(crate) const PREALLOC_LIMIT: usize = 0x10000;

/// Parses values out of a byte buffer, one `read` per item.
///
/// The engine owns the session's reference cache, the mirror of the one the
/// writer maintained: a `CREF` resolves to the very value decoded earlier,
/// identity included. A short read surfaces as [`BossError::NoData`], never
/// as a partially-populated value.
#[derive(Debug, Default)]
pub struct ReadEngine {
    cache: ReadCache,
}

impl ReadEngine {
    pub fn new() -> Self {
        Self {
            cache: ReadCache::new(),
        }
    }

    /// Reads exactly one value, the counterpart of one `put`.
    pub fn read(&mut self, buf: &mut impl Buf) -> Result<Value, BossError> {
        let header = read_header(buf)?;
        match header.code {
            code::INT => Ok(header.into_integer(false)),
            code::NINT => Ok(header.into_integer(true)),
            code::TEXT | code::BIN => {
                let is_text = header.code == code::TEXT;
                let len = length(header.small()?)?;
                ensure_remaining(buf, len)?;
                let mut data = vec![0u8; len];
                buf.copy_to_slice(&mut data);
                let value = if is_text {
                    let s = String::from_utf8(data)
                        .map_err(|e| BossError::Format(format!("invalid UTF-8 text: {e}")))?;
                    Value::Text(Arc::from(s))
                } else {
                    Value::Binary(Arc::from(data))
                };
                self.cache.register(&value);
                Ok(value)
            }
            code::LIST => {
                let count = length(header.small()?)?;
                let slot = self.cache.reserve();
                let mut items = Vec::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    items.push(self.read(buf)?);
                }
                let value = Value::List(Arc::new(items));
                self.cache.fill(slot, &value);
                Ok(value)
            }
            code::DICT => {
                let count = length(header.small()?)?;
                let slot = self.cache.reserve();
                let mut map = StructValue::with_capacity(count.min(PREALLOC_LIMIT));
                for _ in 0..count {
                    let key = self.read(buf)?;
                    let entry = self.read(buf)?;
                    map.insert(key, entry);
                }
                let value = Value::Map(Arc::new(map));
                self.cache.fill(slot, &value);
                Ok(value)
            }
            code::CREF => self.cache.resolve(header.small()?),
            code::EXTRA => self.read_extra(buf, header.small()?),
            other => Err(BossError::Format(format!("bad BOSS header: type code {other}"))),
        }
    }

    /// Reads one value that must be an integer fitting `i64`.
    pub fn read_i64(&mut self, buf: &mut impl Buf) -> Result<i64, BossError> {
        value_to_i64(&self.read(buf)?)
    }

    /// Reads one value as a double, widening integers.
    pub fn read_f64(&mut self, buf: &mut impl Buf) -> Result<f64, BossError> {
        value_to_f64(&self.read(buf)?)
    }

    /// Reads one value that must be text.
    pub fn read_text(&mut self, buf: &mut impl Buf) -> Result<Arc<str>, BossError> {
        value_to_text(self.read(buf)?)
    }

    fn read_extra(&mut self, buf: &mut impl Buf, sub_code: u64) -> Result<Value, BossError> {
        match sub_code {
            extra::DZERO => Ok(Value::Double(0.0)),
            extra::DONE => Ok(Value::Double(1.0)),
            extra::DMINUS_ONE => Ok(Value::Double(-1.0)),
            extra::TRUE => Ok(Value::Boolean(true)),
            extra::FALSE => Ok(Value::Boolean(false)),
            extra::TIME => {
                let secs = read_varint(buf)?;
                let secs = i64::try_from(secs)
                    .map_err(|_| BossError::Format(format!("timestamp out of range: {secs}")))?;
                Ok(Value::Timestamp(secs))
            }
            extra::DOUBLE => {
                ensure_remaining(buf, 8)?;
                let mut raw = [0u8; 8];
                buf.copy_to_slice(&mut raw);
                Ok(Value::Double(f64::from_bits(u64::from_le_bytes(raw))))
            }
            extra::STREAM_MODE => {
                // The marker is transparent: switch modes, hand back the
                // next real value.
                self.cache.enter_stream_mode();
                self.read(buf)
            }
            other => Err(BossError::Format(format!("unknown extra code: {other}"))),
        }
    }
}

pub(crate) fn length(value: u64) -> Result<usize, BossError> {
    usize::try_from(value)
        .map_err(|_| BossError::Format(format!("length out of range: {value}")))
}

pub(crate) fn value_to_i64(value: &Value) -> Result<i64, BossError> {
    match value {
        Value::Integer(i) => Ok(*i),
        Value::BigInteger(b) => b
            .to_i64()
            .ok_or_else(|| BossError::Format(format!("integer out of i64 range: {b}"))),
        other => Err(BossError::Format(format!("expected integer, got {other}"))),
    }
}

pub(crate) fn value_to_f64(value: &Value) -> Result<f64, BossError> {
    match value {
        Value::Double(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        Value::BigInteger(b) => b
            .to_f64()
            .ok_or_else(|| BossError::Format(format!("integer out of f64 range: {b}"))),
        other => Err(BossError::Format(format!("expected number, got {other}"))),
    }
}

pub(crate) fn value_to_text(value: Value) -> Result<Arc<str>, BossError> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(BossError::Format(format!("expected text, got {other}"))),
    }
}
