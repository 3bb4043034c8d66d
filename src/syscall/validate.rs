//! System Call Input Validation
//!
//! Every address a user process hands the kernel goes through here before a
//! single byte behind it is touched.
//!
//! # Security Principles
//! - Validate the whole accessed range, not just its first byte
//! - Fail-secure: null, the boundary itself and anything above it are unsafe
//! - Overflowing ranges are unsafe rather than wrapping into user space
//! - Only a [`UserSlice`] (proof of validation) can reach [`UserMemory`]

use alloc::string::String;
use alloc::vec::Vec;

use bitflags::bitflags;

use super::error::{Fault, SysResult};
use crate::mm::VirtAddr;

/// Width of a syscall argument word.
pub const WORD_SIZE: usize = 4;

bitflags! {
    /// How the kernel intends to access a user range.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Access: u8 {
        /// Kernel reads user memory (write(2) buffers, paths, arguments).
        const READ = 1 << 0;
        /// Kernel writes user memory (read(2) buffers).
        const WRITE = 1 << 1;
    }
}

/// A validated user-space range
///
/// This type guarantees that:
/// - The start address is non-null
/// - Every byte of the range lies below the user/kernel boundary
/// - `addr + len` does not overflow
///
/// It is only constructed by [`validate_user`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSlice {
    addr: VirtAddr,
    len: usize,
    access: Access,
}

impl UserSlice {
    /// Start of the range.
    pub const fn addr(&self) -> VirtAddr {
        self.addr
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Access rights the range was validated for.
    pub const fn access(&self) -> Access {
        self.access
    }

    /// Narrow to `[offset, offset + len)` of this range.
    ///
    /// Returns `None` if the window does not fit, so a sub-range can never
    /// escape what was validated.
    pub fn window(&self, offset: usize, len: usize) -> Option<UserSlice> {
        let end = offset.checked_add(len)?;
        if end > self.len {
            return None;
        }
        Some(UserSlice {
            addr: self.addr.checked_add(offset)?,
            len,
            access: self.access,
        })
    }
}

/// Access to the current process's address space
///
/// Implementations may assume every slice they are given has already been
/// validated against the boundary. Copies move `min(slice.len(), buf.len())`
/// bytes.
pub trait UserMemory {
    /// Copy user bytes into a kernel buffer.
    fn copy_in(&self, src: &UserSlice, dst: &mut [u8]);

    /// Copy kernel bytes into user memory.
    fn copy_out(&self, dst: &UserSlice, src: &[u8]);
}

/// User memory reached through the kernel's own mapping
///
/// For kernels where the current process's pages are mapped below the
/// boundary while the kernel runs, so a validated user address is directly
/// addressable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectUserMemory;

impl UserMemory for DirectUserMemory {
    fn copy_in(&self, src: &UserSlice, dst: &mut [u8]) {
        let len = src.len().min(dst.len());
        if len == 0 {
            return;
        }
        // SAFETY:
        // - The range was validated to lie in user space and not overflow
        // - The current process's pages are mapped while it traps
        // - dst is a kernel buffer and cannot overlap user memory
        unsafe {
            core::ptr::copy_nonoverlapping(src.addr().as_ptr::<u8>(), dst.as_mut_ptr(), len);
        }
    }

    fn copy_out(&self, dst: &UserSlice, src: &[u8]) {
        debug_assert!(dst.access().contains(Access::WRITE));
        let len = dst.len().min(src.len());
        if len == 0 {
            return;
        }
        // SAFETY: Same as copy_in, with the direction reversed
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), dst.addr().as_mut_ptr::<u8>(), len);
        }
    }
}

/// Check whether `[addr, addr + len)` is safe to touch from the kernel.
///
/// The start address is checked even when `len` is zero: a null or kernel
/// pointer is never acceptable.
pub fn is_user_range(addr: VirtAddr, len: usize, user_top: VirtAddr) -> bool {
    if addr.is_null() || !addr.is_below(user_top) {
        return false;
    }
    match addr.checked_add(len) {
        Some(end) => end <= user_top,
        None => false,
    }
}

/// Validate a user-space range
///
/// # Returns
/// * `Ok(UserSlice)` - Validated range
/// * `Err(Fault::BadAddress)` - Validation failed
///
/// # Security Checks
/// 1. Pointer is not null
/// 2. Pointer is below the user/kernel boundary
/// 3. Pointer + length doesn't overflow
/// 4. End address does not cross the boundary
pub fn validate_user(
    addr: VirtAddr,
    len: usize,
    access: Access,
    user_top: VirtAddr,
) -> SysResult<UserSlice> {
    if !is_user_range(addr, len, user_top) {
        return Err(Fault::BadAddress { addr, len });
    }
    Ok(UserSlice { addr, len, access })
}

/// Validate a range the kernel will read from.
pub fn validate_user_read(addr: VirtAddr, len: usize, user_top: VirtAddr) -> SysResult<UserSlice> {
    validate_user(addr, len, Access::READ, user_top)
}

/// Validate a range the kernel will write to.
pub fn validate_user_write(
    addr: VirtAddr,
    len: usize,
    user_top: VirtAddr,
) -> SysResult<UserSlice> {
    validate_user(addr, len, Access::READ | Access::WRITE, user_top)
}

/// Read one little-endian argument word.
pub fn read_user_word<M: UserMemory + ?Sized>(
    memory: &M,
    addr: VirtAddr,
    user_top: VirtAddr,
) -> SysResult<u32> {
    let slice = validate_user_read(addr, WORD_SIZE, user_top)?;
    let mut bytes = [0u8; WORD_SIZE];
    memory.copy_in(&slice, &mut bytes);
    Ok(u32::from_le_bytes(bytes))
}

/// Read a NUL-terminated user string.
///
/// Each byte is validated before it is read, so a string running into
/// kernel space faults at the boundary. A string longer than `max_len`
/// bytes (NUL included) faults as well.
///
/// # Returns
/// * `Ok(Some(s))` - The string, without its NUL
/// * `Ok(None)` - The bytes were not UTF-8; callers report this as a
///   lookup failure
pub fn read_user_str<M: UserMemory + ?Sized>(
    memory: &M,
    addr: VirtAddr,
    max_len: usize,
    user_top: VirtAddr,
) -> SysResult<Option<String>> {
    let mut bytes = Vec::new();
    for offset in 0..max_len {
        let at = addr
            .checked_add(offset)
            .ok_or(Fault::BadAddress { addr, len: offset + 1 })?;
        let slice = validate_user_read(at, 1, user_top)
            .map_err(|_| Fault::BadAddress { addr, len: offset + 1 })?;
        let mut byte = [0u8; 1];
        memory.copy_in(&slice, &mut byte);
        if byte[0] == 0 {
            return Ok(String::from_utf8(bytes).ok());
        }
        bytes.push(byte[0]);
    }
    Err(Fault::UnterminatedString { addr })
}
