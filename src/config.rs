//! Bridge configuration
//!
//! All tunables are plain values fixed at kernel build or boot time. There is
//! no runtime reconfiguration: a [`BridgeConfig`] is handed to
//! [`crate::SyscallBridge::new`] and stays put for the life of the kernel.

use crate::mm::address::{VirtAddr, PAGE_SIZE, PHYS_BASE};

/// Exec generations allowed before `exec` starts refusing.
pub const MAX_FORK_DEPTH: u32 = 30;

/// Longest user string (path or command line) the bridge will scan,
/// including the terminating NUL.
pub const MAX_USER_STRING: usize = PAGE_SIZE;

/// Size of the kernel bounce buffer used for read/write.
pub const IO_CHUNK: usize = 512;

/// Tunables for the syscall bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// First address that is not user-accessible.
    pub user_top: VirtAddr,
    /// A caller deeper than this cannot exec.
    pub max_fork_depth: u32,
    /// Upper bound on a NUL-terminated user string.
    pub max_user_string: usize,
    /// Bytes moved per step between user memory and a file or the console.
    pub io_chunk: usize,
}

impl BridgeConfig {
    /// Defaults for a 32-bit kernel mapped at [`PHYS_BASE`].
    pub const DEFAULT: Self = Self {
        user_top: VirtAddr::new(PHYS_BASE),
        max_fork_depth: MAX_FORK_DEPTH,
        max_user_string: MAX_USER_STRING,
        io_chunk: IO_CHUNK,
    };

    /// Move the user/kernel boundary.
    pub const fn with_user_top(mut self, user_top: usize) -> Self {
        self.user_top = VirtAddr::new(user_top);
        self
    }

    /// Change the exec depth ceiling.
    pub const fn with_max_fork_depth(mut self, depth: u32) -> Self {
        self.max_fork_depth = depth;
        self
    }

    /// Change the longest accepted user string.
    pub const fn with_max_user_string(mut self, len: usize) -> Self {
        self.max_user_string = len;
        self
    }

    /// Change the bounce buffer size. Zero is bumped to one byte.
    pub const fn with_io_chunk(mut self, len: usize) -> Self {
        self.io_chunk = if len == 0 { 1 } else { len };
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
