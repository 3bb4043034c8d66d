//! Filesystem side of the bridge
//!
//! The on-disk filesystem is a collaborator reached through [`FileSystem`].
//! The bridge adds two things on top of it:
//! - [`FsLock`]: the single lock serializing every filesystem call
//! - [`FdTable`]: the per-process map from descriptors to open files
//!
//! # Security Properties
//! - File handles are owned by exactly one table entry
//! - Descriptors 0 and 1 never reach the filesystem

pub mod fd;
pub mod lock;

pub use fd::{Fd, FdTable};
pub use lock::{FsGuard, FsLock};

/// The filesystem collaborator
///
/// Implementations need not be thread-safe: the bridge only calls them with
/// the [`FsLock`] held.
pub trait FileSystem {
    /// Open-file handle: a cursor plus a length.
    type File;

    /// Create a zero-filled file of `initial_size` bytes.
    fn create(&mut self, path: &str, initial_size: u32) -> bool;

    /// Unlink `path`. Open handles to it stay usable.
    fn remove(&mut self, path: &str) -> bool;

    /// Open `path`.
    fn open(&mut self, path: &str) -> Option<Self::File>;

    /// Release a handle.
    fn close(&mut self, file: Self::File);

    /// Read at the cursor; returns bytes read (short at end of file).
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> usize;

    /// Write at the cursor; returns bytes written.
    fn write(&mut self, file: &mut Self::File, buf: &[u8]) -> usize;

    /// Move the cursor.
    fn seek(&mut self, file: &mut Self::File, position: u32);

    /// Current cursor position.
    fn tell(&self, file: &Self::File) -> u32;

    /// File length in bytes.
    fn length(&self, file: &Self::File) -> u32;
}
