//! BossR — A pure-Rust BOSS serialization library.
//!
//! BOSS ("Binary Object Streaming Schema") is a self-describing,
//! space-efficient binary encoding for dynamically-typed object trees:
//! arbitrary-size integers, doubles, UTF-8 strings, binary blobs,
//! second-resolution timestamps, booleans, lists and ordered maps. Repeated
//! strings, blobs and containers are deduplicated within one stream through
//! a per-session reference cache, and an in-band switch turns the cache off
//! for unbounded streams.
//!
//! # Architecture
//!
//! - **`codec`** — Binary encoding/decoding: header codec, reference caches,
//!   the write/read engines, and one-shot `pack`/`unpack` helpers
//! - **`stream`** — Async reader/writer over `AsyncRead`/`AsyncWrite`
//!   transports
//! - **`types`** — The dynamic `Value` sum type and the insertion-ordered
//!   `StructValue` map
//! - **`mapper`** — Typed record mapping with pluggable per-type converters
//!
//! # Example
//!
//! ```
//! use bossr::codec::{pack, unpack};
//! use bossr::types::Value;
//!
//! let value: Value = "Hello".into();
//! let bytes = pack(&value)?;
//! assert_eq!(unpack(&bytes)?, value);
//! # Ok::<(), bossr::error::BossError>(())
//! ```

pub mod codec;
pub mod error;
pub mod mapper;
pub mod stream;
pub mod types;
