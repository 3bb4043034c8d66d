//! sysbridge - user/kernel syscall bridge
//!
//! The part of a teaching kernel that sits on the trust boundary between
//! untrusted user memory and the kernel. Every syscall trapped from user mode
//! comes through here.
//!
//! # Responsibilities
//! - Validate every user-supplied address before it is dereferenced
//! - Dispatch the syscall number to the right kernel operation
//! - Own per-process file descriptor tables
//! - Serialize all filesystem access behind one lock
//! - Run the exec/wait/exit handshake between parents and children
//!
//! # Collaborators
//! The scheduler, the filesystem, the console and user memory are consumed
//! through traits ([`proc::Scheduler`], [`fs::FileSystem`],
//! [`console::Console`], [`syscall::UserMemory`]). The trap entry code
//! builds an [`trap::IntrFrame`] and calls [`trap::syscall_entry`].
//!
//! # Security Model
//! - Validation failures never come back to user space as values; the
//!   calling process is terminated with status -1
//! - Validated ranges are carried as [`syscall::UserSlice`] tokens, so user
//!   memory cannot be touched without a prior check

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod console;
pub mod fs;
pub mod logger;
pub mod mm;
pub mod proc;
pub mod syscall;
pub mod trap;

#[cfg(test)]
mod test_utils;

pub use config::BridgeConfig;
pub use syscall::{Disposition, SyscallBridge};
pub use trap::{syscall_entry, IntrFrame};
