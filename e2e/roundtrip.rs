//! Full-flow round-trip coverage across the facade's public surface,
//! exercising a tiny incompressible input, a highly compressible zero
//! block, a fast level, and the two level sentinels.

use zio_zstd::{Adapter, Logical};

fn roundtrip(adapter: &Adapter, src: &[u8], level: Logical) -> (usize, Vec<u8>) {
    let mut dst = vec![0u8; src.len()];
    let written = adapter.compress(src, &mut dst, level);
    dst.truncate(written);
    (written, dst)
}

#[test]
fn tiny_incompressible_input_declines() {
    let adapter = Adapter::new();
    let src = b"Hello, world!\n";
    let (written, _) = roundtrip(&adapter, src, Logical::Default);
    assert_eq!(written, src.len(), "14 bytes of text should not beat raw storage");
}

#[test]
fn zero_block_compresses_and_roundtrips_at_level_one() {
    let adapter = Adapter::new();
    let src = vec![0u8; 4096];
    let (written, framed) = roundtrip(&adapter, &src, Logical::Level1);
    assert!(written < 4096);
    assert!(written <= 64, "an all-zero 4KiB block should compress tiny");

    let header = Adapter::get_level(&framed).unwrap();
    assert_eq!(header, Logical::Level1);

    let mut out = vec![0u8; 4096];
    let produced = adapter.decompress(&framed, &mut out).unwrap();
    assert_eq!(produced, 4096);
    assert!(out.iter().all(|&b| b == 0));
}

#[test]
fn fast_level_roundtrips_on_repeating_pattern() {
    let adapter = Adapter::new();
    let src: Vec<u8> = b"abcd".iter().cloned().cycle().take(4096).collect();
    let (written, framed) = roundtrip(&adapter, &src, Logical::Fast3);
    assert!(written < 4096);
    assert_eq!(Adapter::get_level(&framed).unwrap(), Logical::Fast3);

    let mut out = vec![0u8; 4096];
    let produced = adapter.decompress(&framed, &mut out).unwrap();
    assert_eq!(&out[..produced], &src[..]);
}

#[test]
fn level_sentinels_resolve_to_system_default() {
    let adapter = Adapter::new();
    let src = vec![42u8; 8192];

    for sentinel in [Logical::Inherit, Logical::Default] {
        let (written, framed) = roundtrip(&adapter, &src, sentinel);
        assert!(written < src.len());
        assert_eq!(Adapter::get_level(&framed).unwrap(), zio_zstd::DEFAULT_LEVEL);

        let mut out = vec![0u8; src.len()];
        let produced = adapter.decompress(&framed, &mut out).unwrap();
        assert_eq!(&out[..produced], &src[..]);
    }
}

#[test]
fn every_mapped_level_roundtrips() {
    let adapter = Adapter::new();
    let src: Vec<u8> = (0..8192u32).map(|i| (i % 251) as u8).collect();

    let levels = [
        Logical::Level1,
        Logical::Level5,
        Logical::Level19,
        Logical::Fast1,
        Logical::Fast10,
        Logical::FastCoarse20,
        Logical::FastCoarse100,
        Logical::FastVeryCoarse500,
        Logical::FastVeryCoarse1000,
    ];

    for level in levels {
        let (written, framed) = roundtrip(&adapter, &src, level);
        assert!(written > 0);
        let mut out = vec![0u8; src.len()];
        if written < src.len() {
            let produced = adapter.decompress(&framed, &mut out).unwrap();
            assert_eq!(&out[..produced], &src[..], "level {level:?} round-trip mismatch");
        }
    }
}
