//! Async BOSS streaming over `AsyncRead`/`AsyncWrite` transports.
//!
//! BOSS streams carry no framing: these engines write and read items
//! directly against the transport, suspending only at whole-item writes and
//! exact-length reads. For unbounded streams, switch to stream mode to keep
//! the reference caches from growing without limit.

pub mod reader;
pub mod writer;

pub use reader::StreamReader;
pub use writer::StreamWriter;
