//! Scoped lock handles threaded through materialization against shared
//! file handles.
//!
//! The indexing core never creates locks on its own behalf; a file-manager
//! collaborator hands a [`ResourceLock`] to the adapter that needs one, and
//! the adapter holds it for the duration of a `get`/`set`. Everything else
//! in the crate is lock-free until materialization.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A cloneable handle to zero or more shared locks.
///
/// Clones guard the same underlying resources. The no-op handle carries no
/// lock at all, for backends that do not share a handle with anyone.
#[derive(Clone, Debug, Default)]
pub struct ResourceLock {
    inner: Vec<Arc<Mutex<()>>>,
}

impl ResourceLock {
    /// A fresh lock guarding one resource.
    pub fn new() -> ResourceLock {
        ResourceLock {
            inner: vec![Arc::new(Mutex::new(()))],
        }
    }

    /// A handle that acquires nothing.
    pub fn noop() -> ResourceLock {
        ResourceLock { inner: Vec::new() }
    }

    /// A fresh lock when `needs_lock` is set, the no-op handle otherwise.
    ///
    /// This mirrors the `acquire(needs_lock)` shape of the file-manager
    /// collaborator interface.
    pub fn when(needs_lock: bool) -> ResourceLock {
        if needs_lock {
            ResourceLock::new()
        } else {
            ResourceLock::noop()
        }
    }

    pub fn is_noop(&self) -> bool {
        self.inner.is_empty()
    }

    /// Acquire every underlying lock, in a fixed order, for the lifetime of
    /// the returned guard.
    pub fn acquire(&self) -> ResourceGuard<'_> {
        ResourceGuard {
            _guards: self
                .inner
                .iter()
                .map(|m| m.lock().unwrap_or_else(PoisonError::into_inner))
                .collect(),
        }
    }
}

/// Scoped acquisition of a [`ResourceLock`]; dropping it releases every
/// underlying lock.
#[must_use = "a lock guard is released as soon as it is dropped"]
pub struct ResourceGuard<'a> {
    _guards: Vec<MutexGuard<'a, ()>>,
}

/// The given lock, or the no-op handle if there is none.
pub fn ensure_lock(lock: Option<ResourceLock>) -> ResourceLock {
    lock.unwrap_or_else(ResourceLock::noop)
}

/// Combine several handles into one that acquires all of their underlying
/// locks, deduplicated, in one fixed order.
pub fn combine_locks(locks: &[ResourceLock]) -> ResourceLock {
    let mut inner: Vec<Arc<Mutex<()>>> = Vec::new();
    for lock in locks {
        for m in &lock.inner {
            if !inner.iter().any(|seen| Arc::ptr_eq(seen, m)) {
                inner.push(Arc::clone(m));
            }
        }
    }
    ResourceLock { inner }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_acquires_nothing() {
        let lock = ensure_lock(None);
        assert!(lock.is_noop());
        let _guard = lock.acquire();
    }

    #[test]
    fn combine_dedupes_shared_locks() {
        let a = ResourceLock::new();
        let b = a.clone();
        let c = ResourceLock::new();
        let combined = combine_locks(&[a, b, c]);
        assert_eq!(combined.inner.len(), 2);
        let _guard = combined.acquire();
    }

    #[test]
    fn guard_serializes_access() {
        let lock = ResourceLock::when(true);
        {
            let _guard = lock.acquire();
        }
        // reacquisition after release must not deadlock
        let _guard = lock.acquire();
    }
}
