//! Zstd compression adapter for a copy-on-write filesystem's per-block
//! compression path.
//!
//! The codec itself (`zstd-sys`) is an external collaborator; what lives
//! here is the block-framing/level-mapping layer and the bounded-pool
//! allocator that makes using that codec safe in a context where general
//! heap allocation is expensive and decompression must never fail for
//! want of memory.
//!
//! Module map, leaves first:
//! - [`level`] — Level Map (A): logical level ⇄ codec cookie.
//! - [`header`] — Block Header Codec (B): the 8-byte big-endian frame prefix.
//! - [`alloc`] — Bounded Allocator (C): pooled buffers plus a guaranteed
//!   decompression fallback slab.
//! - [`codec`] — the `zstd-sys` FFI boundary, including the custom
//!   allocator trampolines that connect [`alloc`] to the codec.
//! - [`facade`] — Compress/Decompress Facade (D): the public Rust API.
//! - [`abi`] — the C ABI entry points the upstream dispatcher calls.
//! - [`diagnostics`] — gated stderr notes for corrupt-state conditions.

pub mod abi;
pub mod alloc;
pub mod codec;
pub mod diagnostics;
pub mod facade;
pub mod header;
pub mod level;
pub mod util;

pub use facade::{Adapter, DecompressError};
pub use header::{Header, HeaderError, HEADER_SIZE};
pub use level::{cookie_of_logical, logical_of_cookie, Logical, DEFAULT_LEVEL};
