//! Bounded Allocator — slot-based recycling pool.
//!
//! Implements a two-pass acquire algorithm: an opportunistic-reuse pass
//! followed by a fresh-allocation pass, falling back to an unpooled heap
//! allocation if both passes find no room. Each slot's buffer is a raw
//! `libc::malloc`'d block; the allocator header (`super::header`) is
//! written once, at the block's front, when the slot's buffer is first
//! created, and never changes thereafter — the slot index and pool id are
//! fixed for the lifetime of that block.

use std::cell::UnsafeCell;
use std::os::raw::c_void;
use std::ptr;
use std::time::{Duration, Instant};

use super::header::{self, Kind, PoolId};
use super::lock::SlotLock;

/// Idle timeout after which a slot's cached buffer may be reclaimed.
pub const SLOT_TIMEOUT: Duration = Duration::from_secs(120);

struct RawBlock {
    /// Pointer to the start of the malloc'd block (header included).
    base: *mut u8,
    /// Usable payload capacity, i.e. excluding the allocator header.
    capacity: usize,
    deadline: Instant,
}

/// One cell of the bounded pool.
///
/// `raw` is touched only while `lock` is held by the scanning thread or by
/// the current consumer, so a plain `UnsafeCell` (rather than a second,
/// redundant `std::sync::Mutex`) is the correct tool here: the `SlotLock`
/// *is* the synchronization: it guards both slot metadata and buffer use.
struct Slot {
    lock: SlotLock,
    raw: UnsafeCell<Option<RawBlock>>,
}

// SAFETY: `raw` is accessed exclusively by whichever thread holds `lock`.
unsafe impl Sync for Slot {}

impl Slot {
    fn new() -> Self {
        Slot {
            lock: SlotLock::new(),
            raw: UnsafeCell::new(None),
        }
    }
}

/// One of the two pools (one for compression contexts, one for decompression
/// contexts), tagged with the id its allocations should record in their
/// header.
pub struct Pool {
    id: PoolId,
    slots: Vec<Slot>,
}

impl Pool {
    pub fn new(id: PoolId, slot_count: usize) -> Self {
        let mut slots = Vec::with_capacity(slot_count);
        slots.resize_with(slot_count, Slot::new);
        Pool { id, slots }
    }

    /// Acquires a buffer of at least `size` bytes, per the two-pass scan
    /// plus unpooled-fallback algorithm. Returns null only if even the
    /// unpooled heap allocation fails (true OOM).
    pub fn allocate(&self, size: usize) -> *mut u8 {
        if let Some(ptr) = self.pass_reuse(size) {
            return ptr;
        }
        if let Some(ptr) = self.pass_fresh(size) {
            return ptr;
        }
        self.allocate_unpooled(size)
    }

    /// Pass 1: opportunistic reuse of an already-hot buffer, with incidental
    /// expiry cleanup of idle slots encountered along the way.
    fn pass_reuse(&self, size: usize) -> Option<*mut u8> {
        let mut claimed: Option<*mut u8> = None;
        let now = Instant::now();

        for slot in self.slots.iter() {
            if !slot.lock.try_lock() {
                continue; // contended: another consumer owns it
            }

            // SAFETY: we hold this slot's lock exclusively.
            let raw = unsafe { &mut *slot.raw.get() };

            match raw {
                Some(block) if block.capacity >= size && claimed.is_none() => {
                    block.deadline = now + SLOT_TIMEOUT;
                    let ptr = unsafe { block.base.add(header::HEADER_LEN) };
                    claimed = Some(ptr);
                    // Lock stays held: it now denotes "in use" until free().
                }
                Some(block) if block.deadline <= now => {
                    unsafe { libc::free(block.base as *mut c_void) };
                    *raw = None;
                    slot.lock.unlock();
                }
                _ => {
                    slot.lock.unlock();
                }
            }
        }

        claimed
    }

    /// Pass 2: fresh allocation into any slot left empty after pass 1.
    fn pass_fresh(&self, size: usize) -> Option<*mut u8> {
        for (idx, slot) in self.slots.iter().enumerate() {
            if !slot.lock.try_lock() {
                continue;
            }

            // SAFETY: we hold this slot's lock exclusively.
            let raw = unsafe { &mut *slot.raw.get() };
            if raw.is_some() {
                slot.lock.unlock();
                continue;
            }

            let total = header::HEADER_LEN + size;
            let base = unsafe { libc::malloc(total) as *mut u8 };
            if base.is_null() {
                slot.lock.unlock();
                continue;
            }
            unsafe { header::write_header(base, Kind::Pooled, self.id, idx as u32) };

            *raw = Some(RawBlock {
                base,
                capacity: size,
                deadline: Instant::now() + SLOT_TIMEOUT,
            });

            return Some(unsafe { base.add(header::HEADER_LEN) });
        }
        None
    }

    /// Pass 3: unpooled heap allocation, used when the pool is saturated or
    /// short on memory. Never touches a slot.
    fn allocate_unpooled(&self, size: usize) -> *mut u8 {
        let total = header::HEADER_LEN + size;
        let base = unsafe { libc::malloc(total) as *mut u8 };
        if base.is_null() {
            return ptr::null_mut();
        }
        unsafe {
            header::write_header(base, Kind::Heap, self.id, 0);
            base.add(header::HEADER_LEN)
        }
    }

    /// Releases the slot at `index`: the buffer is retained for reuse, only
    /// the slot's lock is released.
    pub fn release_slot(&self, index: usize) {
        self.slots[index].lock.unlock();
    }

    /// Drops every slot's cached buffer. Used by `fini()`.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.lock.try_lock(); // best-effort: fini assumes no concurrent use
            // SAFETY: fini is documented as requiring no concurrent callers.
            let raw = unsafe { &mut *slot.raw.get() };
            if let Some(block) = raw.take() {
                unsafe { libc::free(block.base as *mut c_void) };
            }
        }
    }
}
