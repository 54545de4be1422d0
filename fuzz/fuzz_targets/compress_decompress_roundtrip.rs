#![no_main]

use libfuzzer_sys::fuzz_target;
use zio_zstd::{Adapter, Logical};

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 1 << 20 {
        return;
    }

    let adapter = Adapter::new();
    let mut dst = vec![0u8; data.len()];
    let written = adapter.compress(data, &mut dst, Logical::Level3);

    if written == data.len() {
        return; // declined; nothing further to check
    }

    let mut out = vec![0u8; data.len()];
    let produced = adapter
        .decompress(&dst[..written], &mut out)
        .expect("a frame this adapter just produced must decompress");
    assert_eq!(produced, data.len());
    assert_eq!(&out[..produced], data);
});
