//! BOSS encoding: `Value` → bytes, with reference caching.

use bytes::{BufMut, BytesMut};
use num_bigint::Sign;

use crate::error::BossError;
use crate::types::Value;

use super::cache::WriteCache;
use super::header::{code, extra, write_big_header, write_header, write_varint};

/// Serializes values into a byte buffer, one `put` per item.
///
/// The engine owns the session's reference cache, so repeated cacheable
/// values — within one item or across successive `put` calls — are emitted
/// as back-references. The engine never touches a transport: it appends to a
/// caller-supplied buffer, and every header lands in that buffer as a whole.
#[derive(Debug, Default)]
pub struct WriteEngine {
    cache: WriteCache,
}

impl WriteEngine {
    pub fn new() -> Self {
        Self {
            cache: WriteCache::new(),
        }
    }

    /// Appends the encoding of one value.
    pub fn put(&mut self, buf: &mut BytesMut, value: &Value) -> Result<(), BossError> {
        match value {
            Value::Null => write_header(buf, code::CREF, 0),
            Value::Boolean(true) => write_header(buf, code::EXTRA, extra::TRUE),
            Value::Boolean(false) => write_header(buf, code::EXTRA, extra::FALSE),
            Value::Integer(i) => {
                let code = if *i >= 0 { code::INT } else { code::NINT };
                write_header(buf, code, i.unsigned_abs());
            }
            Value::BigInteger(b) => {
                let code = if b.sign() == Sign::Minus {
                    code::NINT
                } else {
                    code::INT
                };
                write_big_header(buf, code, b.magnitude());
            }
            Value::Double(f) => put_double(buf, *f),
            Value::Timestamp(secs) => {
                let secs = u64::try_from(*secs).map_err(|_| {
                    BossError::Type(format!("timestamp before the epoch: {secs}"))
                })?;
                write_header(buf, code::EXTRA, extra::TIME);
                write_varint(buf, secs);
            }
            Value::Text(s) => {
                if !self.try_write_reference(buf, value) {
                    let bytes = s.as_bytes();
                    write_header(buf, code::TEXT, bytes.len() as u64);
                    buf.put_slice(bytes);
                }
            }
            Value::Binary(b) => {
                if !self.try_write_reference(buf, value) {
                    write_header(buf, code::BIN, b.len() as u64);
                    buf.put_slice(b);
                }
            }
            Value::List(items) => {
                if !self.try_write_reference(buf, value) {
                    write_header(buf, code::LIST, items.len() as u64);
                    for item in items.iter() {
                        self.put(buf, item)?;
                    }
                }
            }
            Value::Map(map) => {
                if !self.try_write_reference(buf, value) {
                    write_header(buf, code::DICT, map.len() as u64);
                    for (key, entry) in map.iter() {
                        self.put(buf, key)?;
                        self.put(buf, entry)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Switches the session into stream mode: the cache is cleared and
    /// frozen, and the in-band marker record is emitted. One-way.
    pub fn set_stream_mode(&mut self, buf: &mut BytesMut) {
        self.cache.enter_stream_mode();
        write_header(buf, code::EXTRA, extra::STREAM_MODE);
    }

    /// Emits a back-reference if the value is already cached, reporting
    /// `true`. On a miss the value is registered *before* the caller writes
    /// its literal body, so children observe the parent's ordinal.
    fn try_write_reference(&mut self, buf: &mut BytesMut, value: &Value) -> bool {
        match self.cache.try_reference(value) {
            Some(ordinal) => {
                write_header(buf, code::CREF, ordinal);
                true
            }
            None => false,
        }
    }
}

fn put_double(buf: &mut BytesMut, f: f64) {
    if f == 0.0 {
        write_header(buf, code::EXTRA, extra::DZERO);
    } else if f == 1.0 {
        write_header(buf, code::EXTRA, extra::DONE);
    } else if f == -1.0 {
        write_header(buf, code::EXTRA, extra::DMINUS_ONE);
    } else {
        write_header(buf, code::EXTRA, extra::DOUBLE);
        buf.put_slice(&f.to_bits().to_le_bytes());
    }
}
