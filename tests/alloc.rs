use zio_zstd::alloc::header::{read_header, Kind, PoolId};
use zio_zstd::alloc::BoundedAllocator;

#[test]
fn compress_allocation_tags_itself_pooled_and_frees_cleanly() {
    let allocator = BoundedAllocator::new(4096);
    let ptr = allocator.allocate_compress(256);
    assert!(!ptr.is_null());
    unsafe {
        let (_, kind, pool_id, _) = read_header(ptr);
        assert_eq!(kind, Kind::Pooled);
        assert_eq!(pool_id, PoolId::Compress);
        allocator.free(ptr);
    }
}

#[test]
fn decompress_allocation_never_returns_null() {
    let allocator = BoundedAllocator::new(4096);
    let ptr = allocator.allocate_decompress(1024);
    assert!(!ptr.is_null());
    unsafe { allocator.free(ptr) };
}

#[test]
fn clear_is_safe_to_call_with_no_outstanding_allocations() {
    let allocator = BoundedAllocator::new(4096);
    allocator.clear();
    allocator.clear(); // idempotent
}
