//! Fault taxonomy
//!
//! A [`Fault`] is a syscall that can't be trusted to continue. Faults are
//! never reported back to user space: the dispatcher turns every one of them
//! into `exit(-1)`. Recoverable failures (unknown fd, failed open, depth
//! ceiling) are plain sentinel return values and do not appear here.

use core::fmt;

use crate::fs::Fd;
use crate::mm::VirtAddr;

/// Sentinel returned to user space for non-fatal failures.
pub const FAILURE: i32 = -1;

/// Exit status recorded for a process killed by a fault.
pub const KILLED: i32 = -1;

/// Fatal syscall error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Some byte of `[addr, addr + len)` is null, kernel space or wraps.
    BadAddress { addr: VirtAddr, len: usize },
    /// No NUL within the configured string limit.
    UnterminatedString { addr: VirtAddr },
    /// Reading stdout or writing stdin.
    ReservedDescriptor { fd: Fd },
    /// Opcode outside the syscall table.
    UnknownSyscall(u32),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadAddress { addr, len } => {
                write!(f, "bad user address {} (+{} bytes)", addr, len)
            }
            Self::UnterminatedString { addr } => {
                write!(f, "unterminated user string at {}", addr)
            }
            Self::ReservedDescriptor { fd } => {
                write!(f, "descriptor {} used in the wrong direction", fd)
            }
            Self::UnknownSyscall(number) => write!(f, "unknown syscall {}", number),
        }
    }
}

/// Result of a syscall handler.
pub type SysResult<T> = Result<T, Fault>;
