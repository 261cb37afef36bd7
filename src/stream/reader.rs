//! Reads BOSS values from an async byte stream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use num_bigint::BigUint;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::codec::cache::ReadCache;
use crate::codec::header::{Header, HeaderValue, code, extra};
use crate::codec::reader::{PREALLOC_LIMIT, length, value_to_f64, value_to_i64, value_to_text};
use crate::error::BossError;
use crate::types::{StructValue, Value};

type ValueFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, BossError>> + Send + 'a>>;

/// Reads a sequence of BOSS values from an `AsyncRead` transport.
///
/// The async twin of [`ReadEngine`](crate::codec::ReadEngine): same cache
/// semantics, same one-item-per-call contract, pulling bytes on demand with
/// exact-length reads. An EOF from the transport surfaces as
/// [`BossError::NoData`]; hitting it before the first byte of an item is the
/// normal end of an open-ended stream, anywhere else it means truncation.
pub struct StreamReader<R> {
    transport: R,
    cache: ReadCache,
}

impl<R: AsyncRead + Unpin + Send> StreamReader<R> {
    pub fn new(transport: R) -> Self {
        Self {
            transport,
            cache: ReadCache::new(),
        }
    }

    /// Reads exactly one value, the counterpart of one
    /// [`StreamWriter::write`](crate::stream::StreamWriter::write).
    pub async fn read(&mut self) -> Result<Value, BossError> {
        let result = self.read_value().await;
        if let Err(e @ BossError::Format(_)) = &result {
            tracing::warn!(error = %e, "BOSS decode error");
        }
        result
    }

    /// Reads one value that must be an integer fitting `i64`.
    pub async fn read_i64(&mut self) -> Result<i64, BossError> {
        value_to_i64(&self.read_value().await?)
    }

    /// Reads one value as a double, widening integers.
    pub async fn read_f64(&mut self) -> Result<f64, BossError> {
        value_to_f64(&self.read_value().await?)
    }

    /// Reads one value that must be text.
    pub async fn read_text(&mut self) -> Result<Arc<str>, BossError> {
        value_to_text(self.read_value().await?)
    }

    /// Consumes the reader, returning the transport.
    pub fn into_inner(self) -> R {
        self.transport
    }

    // Containers recurse; the future is boxed to give it a size.
    fn read_value(&mut self) -> ValueFuture<'_> {
        Box::pin(async move {
            let header = self.read_header().await?;
            match header.code {
                code::INT => Ok(header.into_integer(false)),
                code::NINT => Ok(header.into_integer(true)),
                code::TEXT | code::BIN => {
                    let is_text = header.code == code::TEXT;
                    let len = length(header.small()?)?;
                    let data = self.read_payload(len).await?;
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
                        items.push(self.read_value().await?);
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
                        let key = self.read_value().await?;
                        let entry = self.read_value().await?;
                        map.insert(key, entry);
                    }
                    let value = Value::Map(Arc::new(map));
                    self.cache.fill(slot, &value);
                    Ok(value)
                }
                code::CREF => self.cache.resolve(header.small()?),
                code::EXTRA => self.read_extra(header.small()?).await,
                other => Err(BossError::Format(format!(
                    "bad BOSS header: type code {other}"
                ))),
            }
        })
    }

    async fn read_extra(&mut self, sub_code: u64) -> Result<Value, BossError> {
        match sub_code {
            extra::DZERO => Ok(Value::Double(0.0)),
            extra::DONE => Ok(Value::Double(1.0)),
            extra::DMINUS_ONE => Ok(Value::Double(-1.0)),
            extra::TRUE => Ok(Value::Boolean(true)),
            extra::FALSE => Ok(Value::Boolean(false)),
            extra::TIME => {
                let secs = self.read_varint().await?;
                let secs = i64::try_from(secs)
                    .map_err(|_| BossError::Format(format!("timestamp out of range: {secs}")))?;
                Ok(Value::Timestamp(secs))
            }
            extra::DOUBLE => {
                let mut raw = [0u8; 8];
                self.read_exact(&mut raw).await?;
                Ok(Value::Double(f64::from_bits(u64::from_le_bytes(raw))))
            }
            extra::STREAM_MODE => {
                tracing::debug!("BOSS reader entered stream mode");
                self.cache.enter_stream_mode();
                self.read_value().await
            }
            other => Err(BossError::Format(format!("unknown extra code: {other}"))),
        }
    }

    async fn read_header(&mut self) -> Result<Header, BossError> {
        let first = self.read_u8().await?;
        let code = first & 7;
        let field = first >> 3;

        let value = match field {
            0..=22 => HeaderValue::Small(u64::from(field)),
            23..=30 => {
                let n = usize::from(field - 22);
                let mut le = [0u8; 8];
                self.read_exact(&mut le[..n]).await?;
                HeaderValue::Small(u64::from_le_bytes(le))
            }
            _ => {
                let len = length(self.read_varint().await?)?;
                let data = self.read_payload(len).await?;
                HeaderValue::Big(BigUint::from_bytes_le(&data))
            }
        };

        Ok(Header { code, value })
    }

    async fn read_varint(&mut self) -> Result<u64, BossError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let b = self.read_u8().await?;
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

    /// Reads a length-prefixed payload. The buffer grows a chunk at a time as
    /// bytes actually arrive, so a hostile length cannot reserve unbounded
    /// memory up front.
    async fn read_payload(&mut self, len: usize) -> Result<Vec<u8>, BossError> {
        let mut data = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        while data.len() < len {
            let start = data.len();
            let chunk = (len - start).min(PREALLOC_LIMIT);
            data.resize(start + chunk, 0);
            self.read_exact(&mut data[start..]).await?;
        }
        Ok(data)
    }

    async fn read_u8(&mut self) -> Result<u8, BossError> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte).await?;
        Ok(byte[0])
    }

    async fn read_exact(&mut self, dst: &mut [u8]) -> Result<(), BossError> {
        match self.transport.read_exact(dst).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(BossError::NoData {
                needed: dst.len(),
                available: 0,
            }),
            Err(e) => Err(e.into()),
        }
    }
}
