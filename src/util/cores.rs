/// Returns the number of logical CPU cores available on the system.
///
/// Guaranteed to return a value ≥ 1 (falls back to 1 if the platform can't
/// report a count).
pub fn count_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Minimum allocator pool size, independent of CPU count.
const MIN_POOL_SIZE: usize = 16;

/// Pool slots per detected CPU.
const SLOTS_PER_CORE: usize = 4;

/// Returns the allocator pool size for this host: `max(16, 4 * cpu_count)`.
pub fn default_pool_size() -> usize {
    MIN_POOL_SIZE.max(SLOTS_PER_CORE * count_cores())
}
