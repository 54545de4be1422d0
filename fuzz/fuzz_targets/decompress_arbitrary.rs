#![no_main]

use libfuzzer_sys::fuzz_target;
use zio_zstd::Adapter;

// Arbitrary, untrusted bytes as an on-disk frame. decompress() must never
// panic, never write past dst, and must reject anything whose header
// invariants don't hold before touching the codec at all.
fuzz_target!(|data: &[u8]| {
    if data.len() > 1 << 16 {
        return;
    }

    let adapter = Adapter::new();
    let mut dst = vec![0u8; data.len().max(8)];
    let _ = adapter.decompress(data, &mut dst);
});
