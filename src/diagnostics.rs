//! Minimal diagnostic output, gated by a level.
//!
//! An atomic level plus a gated `eprintln!`, rather than pulling in
//! `log`/`env_logger`: this adapter is destined for a kernel build where no
//! stdio/async logging backend exists, so a dependency on an async logging
//! facade would be a poor fit. Output here is limited to one case: a
//! level-map lookup miss, which indicates corrupt on-disk state.

use std::sync::atomic::{AtomicI32, Ordering};

/// Current diagnostic level. 0 = silent (default), 1+ = emit notes.
static DIAGNOSTIC_LEVEL: AtomicI32 = AtomicI32::new(0);

/// Sets the diagnostic level, so embedders (and tests) can opt into the
/// notes.
pub fn set_level(level: i32) {
    DIAGNOSTIC_LEVEL.store(level, Ordering::Relaxed);
}

/// Emits `msg` to stderr if the diagnostic level is >= 1.
#[inline]
pub fn note(msg: &str) {
    if DIAGNOSTIC_LEVEL.load(Ordering::Relaxed) >= 1 {
        eprintln!("zio_zstd: {msg}");
    }
}
