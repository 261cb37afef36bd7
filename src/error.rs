//! Error types for the BOSS codec.

/// Errors that can occur while encoding or decoding BOSS data.
#[derive(Debug, thiserror::Error)]
pub enum BossError {
    /// A value was presented to the writer that has no BOSS encoding.
    #[error("unsupported type: {0}")]
    Type(String),

    /// The decoder encountered a header, sub-code or reference it cannot
    /// interpret. The stream is corrupt or was produced by a foreign format.
    #[error("format error: {0}")]
    Format(String),

    /// The byte source ran out of data mid-read. Distinct from [`Format`]:
    /// this signals truncation, not corruption. At an item boundary it is the
    /// normal end-of-stream condition for open-ended sequences.
    ///
    /// [`Format`]: BossError::Format
    #[error("unexpected end of data: needed {needed} bytes, {available} available")]
    NoData { needed: usize, available: usize },

    /// Transport failure surfaced by the async stream layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BossError {
    /// True when this error is the short-read condition used to detect the
    /// end of an open-ended stream.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}
