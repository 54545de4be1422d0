//! A manual-unlock mutex: lock and unlock are independent calls that need
//! not happen on the same call stack, unlike `std::sync::Mutex`'s RAII
//! guard. This is the shape the bounded allocator actually needs: a slot is
//! acquired inside `allocate()` and released later from an unrelated call
//! site (`free()`), once the codec has finished using the buffer.
//!
//! A short-lived `Mutex` guards a plain flag, and a `Condvar` wakes blocked
//! waiters. The flag, not the underlying `Mutex` guard, is what's "held"
//! for the long term.

use std::sync::{Condvar, Mutex};

pub struct SlotLock {
    locked: Mutex<bool>,
    available: Condvar,
}

impl SlotLock {
    pub const fn new() -> Self {
        SlotLock {
            locked: Mutex::new(false),
            available: Condvar::new(),
        }
    }

    /// Non-blocking acquire. Returns `false` immediately if the lock is
    /// contended (held by another consumer) or already logically locked.
    pub fn try_lock(&self) -> bool {
        match self.locked.try_lock() {
            Ok(mut guard) => {
                if *guard {
                    false
                } else {
                    *guard = true;
                    true
                }
            }
            Err(_) => false,
        }
    }

    /// Blocking acquire. Used only by the fallback slab's last-resort path.
    pub fn lock(&self) {
        let mut guard = self.locked.lock().expect("slot lock poisoned");
        while *guard {
            guard = self.available.wait(guard).expect("slot lock poisoned");
        }
        *guard = true;
    }

    /// Releases the lock. Always succeeds; never blocks.
    pub fn unlock(&self) {
        let mut guard = self.locked.lock().expect("slot lock poisoned");
        *guard = false;
        drop(guard);
        self.available.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn try_lock_then_unlock() {
        let lock = SlotLock::new();
        assert!(lock.try_lock());
        assert!(!lock.try_lock(), "already locked, try_lock must fail");
        lock.unlock();
        assert!(lock.try_lock());
        lock.unlock();
    }

    #[test]
    fn blocking_lock_waits_for_release() {
        let lock = Arc::new(SlotLock::new());
        assert!(lock.try_lock());

        let waiter = Arc::clone(&lock);
        let handle = thread::spawn(move || {
            waiter.lock();
            waiter.unlock();
        });

        thread::sleep(std::time::Duration::from_millis(20));
        lock.unlock();
        handle.join().expect("waiter thread panicked");
    }
}
