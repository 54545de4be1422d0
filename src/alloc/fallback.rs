//! Fallback slab — the single guaranteed-available decompression buffer.
//!
//! Decompression must always be able to make forward progress even when both
//! pools are fully saturated: a single page-aligned slab, sized to the
//! codec's own worst-case context estimate, guarded by a blocking lock
//! rather than the pools' non-blocking `try_lock`. Callers on this path
//! wait rather than fail.
//!
//! The slab is handed out whole, as a static-context workspace for
//! `ZSTD_initStaticDCtx` (see `crate::codec::DCtxHandle::new_static`), not
//! through the pool's `customAlloc`/`customFree` protocol. A static context
//! never calls back into the allocator for more memory once initialised, so
//! a thread can never re-enter `acquire()` while it already holds the
//! slab's lock — the one-slab reservation matches the one allocation it is
//! sized for.

use std::cell::UnsafeCell;
use std::os::raw::c_void;

use super::lock::SlotLock;

/// Rounds `n` up to the nearest multiple of the host page size.
fn round_to_page(n: usize) -> usize {
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    let page = if page == 0 { 4096 } else { page };
    (n + page - 1) / page * page
}

/// The single fallback slab. There is exactly one of these per adapter
/// instance — it exists to guarantee decompression forward progress, not
/// to add throughput, so making it a pool of its own would defeat the
/// point.
pub struct FallbackSlab {
    lock: SlotLock,
    // A static-lived `BoundedAllocator` (the ABI singleton) can never run
    // `Drop`, so `fini()` must be able to release this slab's memory
    // through `&self`. `UnsafeCell` gives the interior mutability that
    // needs; the slot lock is what makes mutating it through a shared
    // reference sound.
    base: UnsafeCell<*mut u8>,
    capacity: usize,
}

// SAFETY: `base` is only read/written while `lock` is held.
unsafe impl Sync for FallbackSlab {}
unsafe impl Send for FallbackSlab {}

impl FallbackSlab {
    /// Allocates the slab. `min_size` should be the codec's own estimate of
    /// its worst-case decompression context size (`ZSTD_estimateDCtxSize`);
    /// the actual allocation is that estimate rounded up to a full page.
    pub fn new(min_size: usize) -> Self {
        let capacity = round_to_page(min_size.max(1));
        let base = unsafe { libc::malloc(capacity) as *mut u8 };
        assert!(!base.is_null(), "fallback slab allocation failed");

        FallbackSlab {
            lock: SlotLock::new(),
            base: UnsafeCell::new(base),
            capacity,
        }
    }

    /// Blocks until the slab is free, then returns its whole buffer
    /// (pointer, capacity), or a null pointer if `free_slab` has already
    /// torn it down (the "already torn down" case is treated as a
    /// legitimate decompress-side resource-exhaustion error rather than a
    /// crash).
    ///
    /// The returned buffer carries no allocator header: callers hand it
    /// straight to `ZSTD_initStaticDCtx`, which owns the whole range.
    pub fn acquire(&self) -> (*mut u8, usize) {
        self.lock.lock();
        // SAFETY: holding `lock` excludes `free_slab`.
        let base = unsafe { *self.base.get() };
        if base.is_null() {
            self.lock.unlock();
            return (std::ptr::null_mut(), 0);
        }
        (base, self.capacity)
    }

    /// Usable size of the slab, in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn release(&self) {
        self.lock.unlock();
    }

    /// Releases the slab's backing memory. Idempotent; like `Pool::clear`,
    /// callers must guarantee no concurrent `acquire`/`release` is in
    /// flight. This is what makes `fini()` actually tear down the fallback
    /// reservation the adapter guarantees at init, rather than leaving it for a
    /// `Drop` that a process-wide static singleton will never run.
    pub fn free_slab(&self) {
        self.lock.try_lock();
        // SAFETY: no concurrent acquire/release per the contract above.
        let slot = unsafe { &mut *self.base.get() };
        if !slot.is_null() {
            unsafe { libc::free(*slot as *mut c_void) };
            *slot = std::ptr::null_mut();
        }
    }
}

impl Drop for FallbackSlab {
    fn drop(&mut self) {
        self.free_slab();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn acquire_then_release_roundtrip() {
        let slab = FallbackSlab::new(4096);
        assert!(slab.capacity() >= 4096);
        let (ptr, cap) = slab.acquire();
        assert!(!ptr.is_null());
        assert_eq!(cap, slab.capacity());
        slab.release();
    }

    #[test]
    fn second_acquire_blocks_until_release() {
        let slab = Arc::new(FallbackSlab::new(4096));
        let _first = slab.acquire();

        let waiter = Arc::clone(&slab);
        let handle = thread::spawn(move || {
            let (ptr, _) = waiter.acquire();
            assert!(!ptr.is_null());
            waiter.release();
        });

        thread::sleep(Duration::from_millis(20));
        slab.release();
        handle.join().expect("waiter thread panicked");
    }

    #[test]
    fn size_rounds_up_to_page_multiple() {
        let slab = FallbackSlab::new(1);
        let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        assert_eq!(slab.capacity() % page, 0);
        assert!(slab.capacity() >= page);
    }

    #[test]
    fn free_slab_is_idempotent() {
        let slab = FallbackSlab::new(4096);
        slab.free_slab();
        slab.free_slab(); // must not double-free
    }

    #[test]
    fn acquire_after_teardown_returns_null_instead_of_crashing() {
        let slab = FallbackSlab::new(4096);
        slab.free_slab();
        let (ptr, cap) = slab.acquire();
        assert!(ptr.is_null());
        assert_eq!(cap, 0);
    }
}
