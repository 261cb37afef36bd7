//! Writes BOSS values to an async byte stream.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::codec::WriteEngine;
use crate::error::BossError;
use crate::types::Value;

/// Writes a sequence of BOSS values to an `AsyncWrite` transport.
///
/// Each value is encoded into a staging buffer first and handed to the
/// transport in one `write_all`, so an item — headers included — is never
/// visible half-written. The reference cache lives for the lifetime of the
/// writer: a value repeated across calls is sent as a back-reference until
/// [`set_stream_mode`](Self::set_stream_mode) is invoked.
pub struct StreamWriter<W> {
    transport: W,
    engine: WriteEngine,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> StreamWriter<W> {
    pub fn new(transport: W) -> Self {
        Self {
            transport,
            engine: WriteEngine::new(),
            buf: BytesMut::new(),
        }
    }

    /// Encodes and sends one value.
    pub async fn write(&mut self, value: &Value) -> Result<(), BossError> {
        self.buf.clear();
        self.engine.put(&mut self.buf, value)?;
        self.transport.write_all(&self.buf).await?;
        Ok(())
    }

    /// Switches the session into stream mode and sends the in-band marker.
    /// Caching is disabled for the remainder of the session.
    pub async fn set_stream_mode(&mut self) -> Result<(), BossError> {
        self.buf.clear();
        self.engine.set_stream_mode(&mut self.buf);
        self.transport.write_all(&self.buf).await?;
        tracing::debug!("BOSS writer entered stream mode");
        Ok(())
    }

    /// Flushes the underlying transport.
    pub async fn flush(&mut self) -> Result<(), BossError> {
        self.transport.flush().await?;
        Ok(())
    }

    /// Consumes the writer, returning the transport.
    pub fn into_inner(self) -> W {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::pack;

    #[tokio::test]
    async fn write_matches_one_shot_encoding() {
        let mut output = Vec::new();
        let mut writer = StreamWriter::new(&mut output);
        let value: Value = "Hello".into();
        writer.write(&value).await.unwrap();
        drop(writer);
        assert_eq!(&output[..], &pack(&value).unwrap()[..]);
    }

    #[tokio::test]
    async fn cache_spans_items() {
        let mut output = Vec::new();
        let mut writer = StreamWriter::new(&mut output);
        let value: Value = "dup".into();
        writer.write(&value).await.unwrap();
        writer.write(&value).await.unwrap();
        drop(writer);
        assert_eq!(output, [0x1B, 0x64, 0x75, 0x70, 0x0D]);
    }

    #[tokio::test]
    async fn stream_mode_emits_marker_and_stops_caching() {
        let mut output = Vec::new();
        let mut writer = StreamWriter::new(&mut output);
        let value: Value = "dup".into();
        writer.set_stream_mode().await.unwrap();
        writer.write(&value).await.unwrap();
        writer.write(&value).await.unwrap();
        drop(writer);
        assert_eq!(
            output,
            [0x81, 0x1B, 0x64, 0x75, 0x70, 0x1B, 0x64, 0x75, 0x70]
        );
    }
}
