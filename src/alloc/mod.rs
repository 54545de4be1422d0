//! Bounded Allocator (Component C): two recycling pools plus one guaranteed
//! fallback slab.
//!
//! The two pools are fronted by a uniform allocate/free surface the codec's
//! `ZSTD_customMem` trampolines (see [`crate::codec`]) call into; every
//! buffer they hand out is a raw `libc::malloc` block carrying the in-band
//! [`header`] record, so `free()` is a single dispatch on that header. The
//! fallback slab is deliberately outside this protocol — see
//! [`BoundedAllocator::acquire_fallback_workspace`].

pub mod fallback;
pub mod header;
pub mod lock;
pub mod pool;

use std::os::raw::c_void;

use self::fallback::FallbackSlab;
use self::header::{Kind, PoolId};
use self::pool::Pool;
use crate::util::cores::default_pool_size;

/// Ties the two pools and the fallback slab into a single allocate/free
/// surface.
pub struct BoundedAllocator {
    compress: Pool,
    decompress: Pool,
    fallback: FallbackSlab,
}

impl BoundedAllocator {
    /// Builds an allocator sized for this host: `max(16, 4*cpu_count)` slots
    /// per pool, and a fallback slab sized to `dctx_estimate` bytes (the
    /// codec's own worst-case decompression context size) rounded to a page.
    pub fn new(dctx_estimate: usize) -> Self {
        let slots = default_pool_size();
        BoundedAllocator {
            compress: Pool::new(PoolId::Compress, slots),
            decompress: Pool::new(PoolId::Decompress, slots),
            fallback: FallbackSlab::new(dctx_estimate),
        }
    }

    /// Allocates from the compression pool. Never returns null except under
    /// true system OOM — compression has no fallback-slab guarantee; the
    /// slab exists to keep decompression making forward progress, and a
    /// compressor that cannot get memory reports the failure upward instead.
    pub fn allocate_compress(&self, size: usize) -> *mut u8 {
        self.compress.allocate(size)
    }

    /// Allocates from the decompression pool: the two-pass scan plus
    /// unpooled-heap fallback, nothing more. Returns null on true OOM.
    ///
    /// This deliberately does *not* fall through to the guaranteed fallback
    /// slab: it backs the codec's `customAlloc` callback, which a single
    /// context can invoke more than once over its lifetime. The slab's
    /// lock is held for as long as a static context lives (see
    /// [`acquire_fallback_workspace`](Self::acquire_fallback_workspace)), so
    /// routing a reentrant `customAlloc` call through it here would let a
    /// thread block on a lock it already holds. The forward-progress
    /// guarantee instead lives one level up, in
    /// `crate::codec::DCtxHandle::new_static`, which claims the slab once,
    /// whole, for a context that never calls back into this allocator
    /// again.
    pub fn allocate_decompress(&self, size: usize) -> *mut u8 {
        self.decompress.allocate(size)
    }

    /// Releases a buffer previously returned by one of the `allocate_*`
    /// methods, dispatching on its in-band header.
    ///
    /// # Safety
    /// `ptr` must be a pointer this allocator itself returned, and must not
    /// be used again afterward.
    pub unsafe fn free(&self, ptr: *mut u8) {
        if ptr.is_null() {
            return;
        }
        let (base, kind, pool_id, slot) = header::read_header(ptr);
        match kind {
            Kind::Heap => libc::free(base as *mut c_void),
            Kind::Pooled => {
                let pool = match pool_id {
                    PoolId::Compress => &self.compress,
                    PoolId::Decompress => &self.decompress,
                };
                pool.release_slot(slot as usize);
            }
        }
    }

    /// Blocks until the guaranteed fallback slab is free, then returns its
    /// whole buffer as `(ptr, capacity)`, or `(null, 0)` if the slab has
    /// already been torn down by `fini()`.
    ///
    /// This is a one-shot handout, not a `customAlloc`-style allocation:
    /// the caller (`DCtxHandle::new_static`) takes the entire slab as a
    /// single static-context workspace and must call
    /// [`release_fallback_workspace`](Self::release_fallback_workspace)
    /// exactly once, when that context is no longer in use, never sooner.
    pub fn acquire_fallback_workspace(&self) -> (*mut u8, usize) {
        self.fallback.acquire()
    }

    /// Releases the fallback slab claimed by
    /// [`acquire_fallback_workspace`](Self::acquire_fallback_workspace).
    pub fn release_fallback_workspace(&self) {
        self.fallback.release()
    }

    /// Releases every pooled buffer and the fallback slab — the full
    /// teardown the adapter's `fini()` performs. Callers must guarantee no
    /// concurrent `allocate`/`free`/`allocate_decompress` calls are in
    /// flight.
    pub fn clear(&self) {
        self.compress.clear();
        self.decompress.clear();
        self.fallback.free_slab();
    }
}

/// Raw `void*` context handed to the codec's custom allocator callbacks,
/// selecting which pool an `alloc` call should draw from. Wrapped in
/// [`crate::codec`] rather than exposed directly.
#[repr(C)]
pub struct AllocatorContext {
    pub allocator: *const BoundedAllocator,
    pub pool: PoolId,
}
