//! Allocator header — the small record prefixed to every buffer this
//! allocator hands to the codec through its `customAlloc`/`customFree`
//! protocol.
//!
//! The codec's custom-allocator protocol is pure C ABI: `customFree`
//! receives only the pointer it was once handed, nothing else. The release
//! path therefore cannot carry Rust-level provenance (an enum, a slot
//! reference) alongside the pointer the way ordinary owned Rust values
//! would — it has to recover that information *from the pointer itself*.
//! This module is the one place that does the negative-offset pointer
//! arithmetic the allocator header requires; everywhere else in the crate,
//! buffer provenance is ordinary typed Rust.
//!
//! The fallback slab is deliberately *not* a `Kind` this header can tag:
//! it is handed to the codec once, whole, as a static-context workspace
//! (see `crate::codec::DCtxHandle::new_static`), never through
//! `customAlloc`/`customFree` at all.

use std::ptr;

/// Release policy recorded in a buffer's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Kind {
    /// Freed directly via the backing heap.
    Heap = 0,
    /// Returned to a pool slot; memory itself is retained for reuse.
    Pooled = 1,
}

impl Kind {
    fn from_byte(b: u8) -> Kind {
        match b {
            0 => Kind::Heap,
            1 => Kind::Pooled,
            _ => panic!("corrupt allocator header: unknown kind byte {b}"),
        }
    }
}

/// Which of the two pools (if any) a `Pooled` allocation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PoolId {
    Compress = 0,
    Decompress = 1,
}

impl PoolId {
    fn from_byte(b: u8) -> PoolId {
        match b {
            0 => PoolId::Compress,
            1 => PoolId::Decompress,
            _ => panic!("corrupt allocator header: unknown pool id byte {b}"),
        }
    }
}

/// Header layout, fixed at 8 bytes so the offset math below never depends
/// on `std::mem::size_of` / alignment inference:
///
/// ```text
/// byte 0: kind     (Kind as u8)
/// byte 1: pool_id  (PoolId as u8, meaningful only when kind == Pooled)
/// byte 2..4: unused, reserved
/// byte 4..8: slot index (u32, native endian; meaningful only when kind == Pooled)
/// ```
pub const HEADER_LEN: usize = 8;

/// Writes a header at `base` and returns the pointer past it — the pointer
/// handed to the codec.
///
/// # Safety
/// `base` must point to a writable allocation of at least `HEADER_LEN +
/// payload_len` bytes that this module exclusively owns.
pub unsafe fn write_header(base: *mut u8, kind: Kind, pool_id: PoolId, slot: u32) -> *mut u8 {
    ptr::write(base, kind as u8);
    ptr::write(base.add(1), pool_id as u8);
    ptr::write(base.add(2), 0u8);
    ptr::write(base.add(3), 0u8);
    ptr::write_unaligned(base.add(4) as *mut u32, slot);
    base.add(HEADER_LEN)
}

/// Recovers `(base_pointer, kind, pool_id, slot)` from a pointer previously
/// returned by [`write_header`].
///
/// # Safety
/// `user_ptr` must be a pointer this module itself returned from
/// [`write_header`], still within the lifetime of its backing allocation.
pub unsafe fn read_header(user_ptr: *mut u8) -> (*mut u8, Kind, PoolId, u32) {
    let base = user_ptr.sub(HEADER_LEN);
    let kind = Kind::from_byte(ptr::read(base));
    let pool_id = PoolId::from_byte(ptr::read(base.add(1)));
    let slot = ptr::read_unaligned(base.add(4) as *const u32);
    (base, kind, pool_id, slot)
}
