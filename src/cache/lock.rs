//! Per-entry mutual exclusion within a process

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry of one mutex per cache entry path
///
/// Holding an entry's lock across lookup, compile and persist ensures at most
/// one compilation is in flight per entry in this process.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the lock handle for `key`, creating it on first use
    pub fn handle(&self, key: &Path) -> EntryLock {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = locks.entry(key.to_path_buf()).or_default();
        EntryLock(Arc::clone(lock))
    }

    /// Forget the handle for `key` unless another caller still holds it
    pub fn release(&self, key: &Path) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(key);
        }
    }

    /// Drop handles nobody is holding
    pub fn prune(&self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Number of tracked entries
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no entries are tracked
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handle to one entry's mutex
#[derive(Debug, Clone)]
pub struct EntryLock(Arc<Mutex<()>>);

impl EntryLock {
    /// Block until the entry is free
    ///
    /// A panic in a previous holder does not poison the entry; the cached
    /// file is validated on read regardless.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn same_key_shares_lock() {
        let locks = KeyedLocks::new();
        let a = locks.handle(Path::new("/cache/a.bin"));
        let _guard = a.lock();

        let b = locks.handle(Path::new("/cache/a.bin"));
        assert!(b.0.try_lock().is_err());

        let c = locks.handle(Path::new("/cache/c.bin"));
        assert!(c.0.try_lock().is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn serializes_holders() {
        let locks = KeyedLocks::new();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let handle = locks.handle(Path::new("entry"));
                    let _guard = handle.lock();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prune_drops_idle_handles() {
        let locks = KeyedLocks::new();
        let held = locks.handle(Path::new("held"));
        drop(locks.handle(Path::new("idle")));
        assert_eq!(locks.len(), 2);

        locks.prune();
        assert_eq!(locks.len(), 1);
        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }

    #[test]
    fn release_keeps_handles_in_use() {
        let locks = KeyedLocks::new();
        let first = locks.handle(Path::new("entry"));
        let waiting = locks.handle(Path::new("entry"));

        drop(first);
        locks.release(Path::new("entry"));
        assert_eq!(locks.len(), 1);

        drop(waiting);
        locks.release(Path::new("entry"));
        assert!(locks.is_empty());

        locks.release(Path::new("never-seen"));
        assert!(locks.is_empty());
    }

    #[test]
    fn poisoned_lock_still_usable() {
        let locks = KeyedLocks::new();
        let handle = locks.handle(Path::new("entry"));

        let cloned = handle.clone();
        let _ = thread::spawn(move || {
            let _guard = cloned.lock();
            panic!("compiler crashed");
        })
        .join();

        let _guard = handle.lock();
    }
}
