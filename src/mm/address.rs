//! Virtual Address Type
//!
//! Type-safe wrapper for addresses handed to the kernel by user code.
//!
//! # Security Properties
//! - User addresses are never dereferenced directly; they go through the
//!   validator first (see [`crate::syscall::validate`])
//! - Arithmetic is checked, so an address range cannot wrap around into
//!   the low half of the address space

use core::fmt;

/// Page size (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Base of the kernel's mapping of physical memory. Everything at or above
/// this address belongs to the kernel; everything below it to the current
/// user process.
pub const PHYS_BASE: usize = 0xC000_0000;

/// A virtual memory address.
///
/// The address itself carries no claim of validity. Whether it may be
/// touched depends on the user/kernel boundary in force.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct VirtAddr(usize);

impl VirtAddr {
    /// The null address.
    pub const NULL: Self = Self(0);

    /// Create a new virtual address.
    #[inline]
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// Check for the null address.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Add an offset, or `None` if the result would wrap.
    #[inline]
    pub const fn checked_add(self, offset: usize) -> Option<Self> {
        match self.0.checked_add(offset) {
            Some(addr) => Some(Self(addr)),
            None => None,
        }
    }

    /// Check if this address lies strictly below `user_top`.
    #[inline]
    pub const fn is_below(self, user_top: VirtAddr) -> bool {
        self.0 < user_top.0
    }

    /// Convert to a raw pointer.
    ///
    /// # Safety
    /// The caller must ensure the address is valid and properly mapped.
    #[inline]
    pub const unsafe fn as_ptr<T>(self) -> *const T {
        self.0 as *const T
    }

    /// Convert to a mutable raw pointer.
    ///
    /// # Safety
    /// The caller must ensure the address is valid, properly mapped,
    /// and that mutable access is safe.
    #[inline]
    pub const unsafe fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as *mut T
    }
}

impl From<u32> for VirtAddr {
    fn from(word: u32) -> Self {
        Self(word as usize)
    }
}

impl fmt::Debug for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtAddr({:#010x})", self.0)
    }
}

impl fmt::Display for VirtAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
