//! System Call Interface
//!
//! The bridge between trapped user code and the kernel.
//!
//! # Security Model
//! - Every argument word and every buffer is validated before use
//! - Validation failures kill the caller with status -1; they are never
//!   returned as values
//! - Only the opcodes in [`SyscallNumber`] are accepted; anything else
//!   kills the caller
//!
//! # Syscalls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmd_line) -> pid
//! - 3: wait(pid) -> status
//! - 4: create(path, initial_size) -> bool
//! - 5: remove(path) -> bool
//! - 6: open(path) -> fd
//! - 7: filesize(fd) -> bytes
//! - 8: read(fd, buf, len) -> bytes
//! - 9: write(fd, buf, len) -> bytes
//! - 10: seek(fd, position)
//! - 11: tell(fd) -> position
//! - 12: close(fd)

mod error;
mod file;
mod handler;
mod numbers;
mod process;
pub mod validate;

pub use error::{Fault, SysResult, FAILURE, KILLED};
pub use handler::Disposition;
pub use numbers::SyscallNumber;
pub use validate::{Access, DirectUserMemory, UserMemory, UserSlice};

use crate::config::BridgeConfig;
use crate::console::Console;
use crate::fs::{FileSystem, FsLock};
use crate::proc::Scheduler;

/// The syscall bridge
///
/// Owns the filesystem lock and holds the collaborators every syscall
/// needs. One instance serves every process; per-process state lives in
/// the scheduler's [`crate::proc::Process`] records.
pub struct SyscallBridge<F, S, C, M> {
    fs: FsLock<F>,
    sched: S,
    console: C,
    memory: M,
    config: BridgeConfig,
}

impl<F, S, C, M> SyscallBridge<F, S, C, M>
where
    F: FileSystem,
    S: Scheduler<File = F::File>,
    C: Console,
    M: UserMemory,
{
    /// Wire the bridge to its collaborators.
    pub fn new(fs: F, sched: S, console: C, memory: M, config: BridgeConfig) -> Self {
        log::debug!(
            "[SYSCALL] bridge up: user_top={}, max_fork_depth={}",
            config.user_top,
            config.max_fork_depth
        );
        Self {
            fs: FsLock::new(fs),
            sched,
            console,
            memory,
            config,
        }
    }

    /// The filesystem behind its lock.
    pub fn fs(&self) -> &FsLock<F> {
        &self.fs
    }

    /// The scheduler collaborator.
    pub fn scheduler(&self) -> &S {
        &self.sched
    }

    /// The console collaborator.
    pub fn console(&self) -> &C {
        &self.console
    }

    /// User memory access.
    pub fn memory(&self) -> &M {
        &self.memory
    }

    /// Active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }
}
