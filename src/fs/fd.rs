//! File Descriptor Table
//!
//! Per-process map from small integers to open files.
//!
//! # Design
//! - Descriptors 0 (stdin) and 1 (stdout) are reserved and never stored
//! - New descriptors come from a counter that starts at 2 and only grows,
//!   so a closed descriptor is never handed out again
//! - Operations that give a handle back to the filesystem take the
//!   filesystem by `&mut`, which is only reachable through the filesystem
//!   lock guard

use alloc::collections::BTreeMap;
use core::fmt;

use super::FileSystem;

/// A file descriptor.
///
/// A newtype so arbitrary integers aren't mistaken for table keys.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Fd(i32);

impl Fd {
    /// Console input.
    pub const STDIN: Self = Self(0);

    /// Console output.
    pub const STDOUT: Self = Self(1);

    /// First descriptor handed out for a file.
    pub const FIRST_FILE: Self = Self(2);

    /// Wrap a raw descriptor.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Check for stdin/stdout.
    #[inline]
    pub const fn is_console(self) -> bool {
        self.0 == Self::STDIN.0 || self.0 == Self::STDOUT.0
    }
}

impl From<u32> for Fd {
    fn from(word: u32) -> Self {
        Self(word as i32)
    }
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-process descriptor table.
pub struct FdTable<H> {
    entries: BTreeMap<Fd, H>,
    next: i32,
}

impl<H> FdTable<H> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: Fd::FIRST_FILE.0,
        }
    }

    /// Take ownership of an open file and give it a descriptor.
    ///
    /// Returns the handle if the descriptor space is exhausted so the
    /// caller can close it.
    pub fn insert(&mut self, file: H) -> Result<Fd, H> {
        let fd = Fd(self.next);
        let Some(next) = self.next.checked_add(1) else {
            return Err(file);
        };
        self.next = next;
        self.entries.insert(fd, file);
        Ok(fd)
    }

    /// Look up a descriptor. Console descriptors are never found.
    pub fn get(&self, fd: Fd) -> Option<&H> {
        self.entries.get(&fd)
    }

    /// Look up a descriptor mutably.
    pub fn get_mut(&mut self, fd: Fd) -> Option<&mut H> {
        self.entries.get_mut(&fd)
    }

    /// Close one descriptor.
    ///
    /// Unknown, reserved and already-closed descriptors are a no-op and
    /// return false.
    pub fn close<F>(&mut self, fd: Fd, fs: &mut F) -> bool
    where
        F: FileSystem<File = H> + ?Sized,
    {
        match self.entries.remove(&fd) {
            Some(file) => {
                fs.close(file);
                true
            }
            None => false,
        }
    }

    /// Close every descriptor still open. Returns how many were closed.
    pub fn close_all<F>(&mut self, fs: &mut F) -> usize
    where
        F: FileSystem<File = H> + ?Sized,
    {
        let mut closed = 0;
        while let Some((_, file)) = self.entries.pop_first() {
            fs.close(file);
            closed += 1;
        }
        closed
    }

    /// Check if no descriptor is open.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H> Default for FdTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::SimFs;

    #[test]
    fn test_reserved_descriptors() {
        assert!(Fd::STDIN.is_console());
        assert!(Fd::STDOUT.is_console());
        assert!(!Fd::FIRST_FILE.is_console());
    }

    #[test]
    fn test_descriptors_start_at_two_and_grow() {
        let mut fs = SimFs::new();
        fs.create("a", 0);
        let mut table = FdTable::new();
        let first = table.insert(fs.open("a").unwrap()).ok().unwrap();
        let second = table.insert(fs.open("a").unwrap()).ok().unwrap();
        assert_eq!(first, Fd::new(2));
        assert_eq!(second, Fd::new(3));
    }

    #[test]
    fn test_no_reuse_after_close() {
        let mut fs = SimFs::new();
        fs.create("a", 0);
        let mut table = FdTable::new();
        let fd = table.insert(fs.open("a").unwrap()).ok().unwrap();
        assert!(table.close(fd, &mut fs));
        let again = table.insert(fs.open("a").unwrap()).ok().unwrap();
        assert!(again > fd);
    }

    #[test]
    fn test_close_is_checked() {
        let mut fs = SimFs::new();
        fs.create("a", 0);
        let mut table = FdTable::new();
        let fd = table.insert(fs.open("a").unwrap()).ok().unwrap();
        assert!(!table.close(Fd::STDIN, &mut fs));
        assert!(!table.close(Fd::new(42), &mut fs));
        assert!(table.close(fd, &mut fs));
        assert!(!table.close(fd, &mut fs));
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn test_close_all_is_idempotent() {
        let mut fs = SimFs::new();
        fs.create("a", 0);
        let mut table = FdTable::new();
        for _ in 0..3 {
            let _ = table.insert(fs.open("a").unwrap());
        }
        assert_eq!(table.close_all(&mut fs), 3);
        assert_eq!(table.close_all(&mut fs), 0);
        assert!(table.is_empty());
        assert_eq!(fs.open_handles(), 0);
    }

    #[test]
    fn test_exhausted_descriptor_space() {
        let mut table: FdTable<u8> = FdTable::new();
        table.next = i32::MAX;
        assert_eq!(table.insert(7), Err(7));
        assert!(table.is_empty());
    }
}
