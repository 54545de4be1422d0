//! C ABI entry points exposed to the upstream dispatcher. The adapter
//! instance behind these is a process-wide singleton: `init`/`fini`
//! construct and tear it down; there is no runtime reconfiguration.

use std::os::raw::c_int;
use std::sync::OnceLock;

use crate::facade::Adapter;
use crate::level::Logical;

static ADAPTER: OnceLock<Adapter> = OnceLock::new();

/// `init() -> ok/err`. Idempotent: a second call while already initialised
/// is a no-op success, so callers don't need external synchronisation
/// around startup.
#[no_mangle]
pub extern "C" fn zio_zstd_init() -> c_int {
    let _ = ADAPTER.get_or_init(Adapter::new);
    0
}

/// `fini()`. Releases pooled buffers. Idempotent; safe to call without a
/// prior `init` (a no-op in that case).
#[no_mangle]
pub extern "C" fn zio_zstd_fini() {
    if let Some(adapter) = ADAPTER.get() {
        adapter.fini();
    }
}

/// # Safety
/// `src_ptr` must be valid for reads of `src_len` bytes; `dst_ptr` valid
/// for writes of `dst_cap` bytes; neither may be null when the
/// corresponding length is nonzero.
#[no_mangle]
pub unsafe extern "C" fn zio_zstd_compress(
    src_ptr: *const u8,
    dst_ptr: *mut u8,
    src_len: usize,
    dst_cap: usize,
    logical_level: u8,
) -> usize {
    let Some(adapter) = ADAPTER.get() else {
        return src_len; // uninitialised: decline, matching the "store raw" policy
    };
    let level = Logical::from_tag(logical_level).unwrap_or(crate::level::DEFAULT_LEVEL);
    let src = std::slice::from_raw_parts(src_ptr, src_len);
    let dst = std::slice::from_raw_parts_mut(dst_ptr, dst_cap);
    adapter.compress(src, dst, level)
}

/// # Safety
/// Same pointer/length obligations as [`zio_zstd_compress`].
#[no_mangle]
pub unsafe extern "C" fn zio_zstd_decompress(
    src_ptr: *const u8,
    dst_ptr: *mut u8,
    src_len: usize,
    dst_cap: usize,
) -> c_int {
    let Some(adapter) = ADAPTER.get() else {
        return -1;
    };
    let src = std::slice::from_raw_parts(src_ptr, src_len);
    let dst = std::slice::from_raw_parts_mut(dst_ptr, dst_cap);
    match adapter.decompress(src, dst) {
        Ok(_) => 0,
        Err(_) => -1,
    }
}

/// # Safety
/// Same pointer/length obligations as [`zio_zstd_compress`]; `out_level`
/// must be valid for one `u8` write.
#[no_mangle]
pub unsafe extern "C" fn zio_zstd_decompress_and_report_level(
    src_ptr: *const u8,
    dst_ptr: *mut u8,
    src_len: usize,
    dst_cap: usize,
    out_level: *mut u8,
) -> c_int {
    let Some(adapter) = ADAPTER.get() else {
        return -1;
    };
    let src = std::slice::from_raw_parts(src_ptr, src_len);
    let dst = std::slice::from_raw_parts_mut(dst_ptr, dst_cap);
    match adapter.decompress_and_report_level(src, dst) {
        Ok((_, level)) => {
            if !out_level.is_null() {
                std::ptr::write(out_level, level.tag());
            }
            0
        }
        Err(_) => -1,
    }
}

/// # Safety
/// `src_ptr` valid for reads of `src_len` bytes; `out_level` valid for one
/// `u8` write.
#[no_mangle]
pub unsafe extern "C" fn zio_zstd_get_level(
    src_ptr: *const u8,
    src_len: usize,
    out_level: *mut u8,
) -> c_int {
    let src = std::slice::from_raw_parts(src_ptr, src_len);
    match Adapter::get_level(src) {
        Ok(level) => {
            if !out_level.is_null() {
                std::ptr::write(out_level, level.tag());
            }
            0
        }
        Err(_) => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        assert_eq!(zio_zstd_init(), 0);
        assert_eq!(zio_zstd_init(), 0);
        zio_zstd_fini();
    }

    #[test]
    fn round_trip_through_raw_pointers() {
        zio_zstd_init();
        let src = vec![5u8; 2048];
        let mut dst = vec![0u8; 2048];

        let written = unsafe {
            zio_zstd_compress(
                src.as_ptr(),
                dst.as_mut_ptr(),
                src.len(),
                dst.len(),
                Logical::Level3.tag(),
            )
        };
        assert!(written < 2048);

        let mut out = vec![0u8; 2048];
        let rc = unsafe {
            zio_zstd_decompress(dst.as_ptr(), out.as_mut_ptr(), written, out.len())
        };
        assert_eq!(rc, 0);
        assert_eq!(out, src);
    }

    #[test]
    fn get_level_reads_header_only() {
        zio_zstd_init();
        let src = vec![3u8; 1024];
        let mut dst = vec![0u8; 1024];
        let written = unsafe {
            zio_zstd_compress(
                src.as_ptr(),
                dst.as_mut_ptr(),
                src.len(),
                dst.len(),
                Logical::Fast2.tag(),
            )
        };

        let mut level_out = 0u8;
        let rc = unsafe { zio_zstd_get_level(dst.as_ptr(), written, &mut level_out) };
        assert_eq!(rc, 0);
        assert_eq!(level_out, Logical::Fast2.tag());
    }
}
