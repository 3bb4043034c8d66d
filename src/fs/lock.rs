//! Filesystem Serialization Lock
//!
//! One lock for every filesystem call in the system. The filesystem behind
//! it is not assumed to be thread-safe, so the only way to reach it is
//! through the guard returned by [`FsLock::lock`].
//!
//! # Rules
//! - Not reentrant: a call path that holds the guard must not lock again
//! - Never held across a suspend point (exec rendezvous, wait)
//! - Dropping the guard releases the lock, which covers early returns
//!   through `?` on validation faults
//! - Lock order: this lock first, then a process's descriptor table

use spin::{Mutex, MutexGuard};

/// Scoped ownership of the filesystem.
pub type FsGuard<'a, F> = MutexGuard<'a, F>;

/// The filesystem collaborator behind its serialization lock.
pub struct FsLock<F> {
    inner: Mutex<F>,
}

impl<F> FsLock<F> {
    /// Put a filesystem behind the lock.
    pub const fn new(fs: F) -> Self {
        Self {
            inner: Mutex::new(fs),
        }
    }

    /// Acquire the lock, spinning until it is free.
    pub fn lock(&self) -> FsGuard<'_, F> {
        self.inner.lock()
    }

    /// Acquire the lock only if it is free right now.
    pub fn try_lock(&self) -> Option<FsGuard<'_, F>> {
        self.inner.try_lock()
    }

    /// Check whether some thread holds the lock.
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}
