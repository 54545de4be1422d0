//! Compress/Decompress Facade (Component D): the public entry points. This
//! is the only module that composes the level map, the header codec, the
//! bounded allocator, and the codec FFI surface into a single operation.
//!
//! Compression is best-effort: any failure, resource or codec, is silently
//! converted to the "declined, store raw" sentinel (returning `src_len`).
//! Decompression is not allowed that freedom — a well-formed frame must
//! decompress, which is exactly what the bounded allocator's fallback slab
//! exists to guarantee.

use crate::alloc::BoundedAllocator;
use crate::codec::{self, CCtxHandle, DCtxHandle};
use crate::header::{self, HeaderError, Header};
use crate::level::{self, Logical};

/// Errors [`decompress`]/[`decompress_and_report_level`] may return.
/// [`compress`] never returns an error — it falls back to the "declined"
/// sentinel instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    Header(HeaderError),
    Codec(codec::CodecError),
    /// The decompression context itself could not be created, and the
    /// fallback slab either doesn't exist yet (`init` never called) or is
    /// otherwise unavailable.
    ContextUnavailable,
}

impl std::fmt::Display for DecompressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecompressError::Header(e) => write!(f, "{e}"),
            DecompressError::Codec(e) => write!(f, "{e}"),
            DecompressError::ContextUnavailable => {
                write!(f, "decompression context could not be created")
            }
        }
    }
}

impl std::error::Error for DecompressError {}

impl From<HeaderError> for DecompressError {
    fn from(e: HeaderError) -> Self {
        DecompressError::Header(e)
    }
}

/// Resolves `INHERIT`/`DEFAULT` to the system default level before any
/// level-map lookup.
fn normalise(level: Logical) -> Logical {
    match level {
        Logical::Inherit | Logical::Default => level::DEFAULT_LEVEL,
        other => other,
    }
}

/// The adapter's working state: the bounded allocator each compress/
/// decompress call draws contexts from. Owned by the caller (see
/// [`crate::abi`] for the global-singleton wrapper the C entry points use);
/// nothing in this module is itself global.
pub struct Adapter {
    allocator: BoundedAllocator,
}

impl Adapter {
    /// Builds a fresh adapter, sizing the bounded allocator's fallback
    /// slab from the codec's own decompression-context estimate.
    pub fn new() -> Self {
        Adapter {
            allocator: BoundedAllocator::new(codec::estimate_dctx_size()),
        }
    }

    /// Compresses `src` into `dst`, returning the number of bytes written.
    ///
    /// `dst` must have spare capacity for the 8-byte header plus whatever
    /// the codec produces. `dst.len()` must not exceed `src.len()` ("refuse
    /// to grow") — compression that can't beat the input size is simply
    /// declined.
    ///
    /// Never fails: on any obstacle (oversized request, context creation
    /// failure, codec error, output that wouldn't shrink the input) this
    /// returns `src.len()`, the "declined; store raw" sentinel the
    /// upstream dispatcher recognises.
    pub fn compress(&self, src: &[u8], dst: &mut [u8], logical_level: Logical) -> usize {
        let declined = src.len();

        if dst.len() < header::HEADER_SIZE || dst.len() > src.len() {
            return declined;
        }

        let level = normalise(logical_level);
        let cookie = level::cookie_of_logical(level);

        let mut cctx = match CCtxHandle::new(&self.allocator) {
            Ok(c) => c,
            Err(_) => return declined,
        };

        let payload_cap = dst.len() - header::HEADER_SIZE;
        let written = {
            let (header_buf, payload_buf) = dst.split_at_mut(header::HEADER_SIZE);
            let _ = header_buf;
            match cctx.compress2(&mut payload_buf[..payload_cap], src, cookie) {
                Ok(n) => n,
                Err(_) => return declined,
            }
        };

        if written as u32 as usize != written {
            // payload_len must fit a u32 per the on-disk header; codec
            // output this large couldn't have fit dst_cap anyway, but guard
            // explicitly rather than truncate silently.
            return declined;
        }

        header::encode(dst, written as u32, level);
        header::HEADER_SIZE + written
    }

    /// Decompresses a frame previously produced by [`Adapter::compress`].
    ///
    /// Requires `src.len() >= HEADER_SIZE` and `dst.len() >= src.len()`; a
    /// header whose claimed payload length overruns `src` is rejected
    /// before the codec is ever invoked.
    pub fn decompress(&self, src: &[u8], dst: &mut [u8]) -> Result<usize, DecompressError> {
        let (produced, _level) = self.decompress_reporting(src, dst)?;
        Ok(produced)
    }

    /// As [`Adapter::decompress`], additionally reporting the frame's
    /// stored logical level.
    pub fn decompress_and_report_level(
        &self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<(usize, Logical), DecompressError> {
        self.decompress_reporting(src, dst)
    }

    fn decompress_reporting(
        &self,
        src: &[u8],
        dst: &mut [u8],
    ) -> Result<(usize, Logical), DecompressError> {
        if dst.len() < src.len() {
            // Treat a caller violating the dst_cap >= src_len precondition
            // the same as a malformed frame rather than panicking.
            return Err(DecompressError::Header(HeaderError::PayloadLengthInvalid));
        }

        let Header {
            payload_len, level, ..
        } = header::decode(src)?;

        let payload = &src[header::HEADER_SIZE..header::HEADER_SIZE + payload_len as usize];

        // Try the pool-backed context first; fall through to the
        // guaranteed fallback slab if the pool can't honour the request.
        // Only when both are exhausted does decompression actually fail.
        let mut dctx = match DCtxHandle::new(&self.allocator) {
            Ok(d) => d,
            Err(_) => DCtxHandle::new_static(&self.allocator)
                .map_err(|_| DecompressError::ContextUnavailable)?,
        };

        let produced = dctx
            .decompress(dst, payload)
            .map_err(DecompressError::Codec)?;

        Ok((produced, level))
    }

    /// Pure header inspection: no allocation, no codec call.
    pub fn get_level(src: &[u8]) -> Result<Logical, HeaderError> {
        header::decode(src).map(|h| h.level)
    }

    /// Releases the allocator's pooled buffers and the fallback slab.
    /// Idempotent; callers must ensure no concurrent compress/decompress
    /// is in flight.
    pub fn fini(&self) {
        self.allocator.clear();
    }
}

impl Default for Adapter {
    fn default() -> Self {
        Adapter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_zeros_block() {
        let adapter = Adapter::new();
        let src = vec![0u8; 4096];
        let mut dst = vec![0u8; 4096];
        let written = adapter.compress(&src, &mut dst, Logical::Level1);
        assert!(written < 4096, "zeros should compress well below input size");

        let mut out = vec![0u8; 4096];
        let (produced, level) = adapter
            .decompress_and_report_level(&dst[..written], &mut out)
            .unwrap();
        assert_eq!(produced, 4096);
        assert_eq!(&out[..produced], &src[..]);
        assert_eq!(level, Logical::Level1);
    }

    #[test]
    fn incompressible_small_input_is_declined() {
        let adapter = Adapter::new();
        let src = b"Hello, world!\n"; // 14 bytes, no redundancy to exploit
        let mut dst = vec![0u8; src.len()];
        let written = adapter.compress(src, &mut dst, Logical::Default);
        assert_eq!(written, src.len());
    }

    #[test]
    fn small_redundant_input_compresses_and_roundtrips() {
        // Sized so a real compression gain is possible within the "never
        // grow" dst_cap == src_len precondition.
        let adapter = Adapter::new();
        let src = b"Hello, world!\n".repeat(8);
        let mut dst = vec![0u8; src.len()];
        let written = adapter.compress(&src, &mut dst, Logical::Default);
        assert!(written < src.len());

        let mut out = vec![0u8; src.len()];
        let produced = adapter.decompress(&dst[..written], &mut out).unwrap();
        assert_eq!(produced, src.len());
        assert_eq!(&out[..produced], &src[..]);
    }

    #[test]
    fn fast_level_roundtrips_and_reports_level() {
        let adapter = Adapter::new();
        let pattern: Vec<u8> = b"abcd".iter().cloned().cycle().take(4096).collect();
        let mut dst = vec![0u8; 4096];
        let written = adapter.compress(&pattern, &mut dst, Logical::Fast3);
        assert!(written < 4096);

        assert_eq!(Adapter::get_level(&dst[..written]).unwrap(), Logical::Fast3);

        let mut out = vec![0u8; 4096];
        let produced = adapter.decompress(&dst[..written], &mut out).unwrap();
        assert_eq!(&out[..produced], &pattern[..]);
    }

    #[test]
    fn inherit_and_default_round_trip_as_system_default() {
        let adapter = Adapter::new();
        let src = vec![7u8; 2048];
        for level in [Logical::Inherit, Logical::Default] {
            let mut dst = vec![0u8; 2048];
            let written = adapter.compress(&src, &mut dst, level);
            assert!(written < 2048);
            assert_eq!(
                Adapter::get_level(&dst[..written]).unwrap(),
                crate::level::DEFAULT_LEVEL
            );
            let mut out = vec![0u8; 2048];
            let produced = adapter.decompress(&dst[..written], &mut out).unwrap();
            assert_eq!(&out[..produced], &src[..]);
        }
    }

    #[test]
    fn tampered_header_rejected_without_decompressing() {
        let adapter = Adapter::new();
        let src = vec![9u8; 4096];
        let mut dst = vec![0u8; 4096];
        let written = adapter.compress(&src, &mut dst, Logical::Level2);
        assert!(written < 4096);

        let mut tampered = dst[..written].to_vec();
        tampered[0] = 0xFF; // claim a huge payload length

        let mut out = vec![0u8; 4096];
        let err = adapter.decompress(&tampered, &mut out).unwrap_err();
        assert_eq!(
            err,
            DecompressError::Header(HeaderError::PayloadLengthInvalid)
        );
        assert!(out.iter().all(|&b| b == 0), "dst must be untouched on rejection");
    }

    #[test]
    fn refuses_to_grow_declines_instead() {
        let adapter = Adapter::new();
        let src = vec![1u8; 16];
        // dst_cap > src_len is disallowed by the "refuse to grow" precondition.
        let mut dst = vec![0u8; 32];
        let written = adapter.compress(&src, &mut dst[..32], Logical::Level1);
        // dst.len() (32) > src.len() (16) triggers the precondition guard.
        assert_eq!(written, src.len());
    }
}
