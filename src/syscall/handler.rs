//! System Call Dispatcher
//!
//! Reads the opcode and its argument words off the trapped user stack and
//! routes to the handlers in `file` and `process`.
//!
//! # Stack Layout
//! ```text
//!   esp + 12  arg 2
//!   esp + 8   arg 1
//!   esp + 4   arg 0
//!   esp       opcode
//! ```
//! Each word is 32 bits, little-endian.
//!
//! # Security
//! - The opcode word is validated before it is read
//! - All argument words a call needs are validated before any is read
//! - A fault anywhere becomes `exit(-1)` for the caller

use alloc::string::String;
use alloc::sync::Arc;

use log::{trace, warn};

use super::error::{Fault, SysResult, KILLED};
use super::numbers::SyscallNumber;
use super::validate::{self, UserMemory, WORD_SIZE};
use super::SyscallBridge;
use crate::console::Console;
use crate::fs::{Fd, FileSystem};
use crate::mm::VirtAddr;
use crate::proc::{Process, Scheduler};
use crate::trap::IntrFrame;

/// What the trap entry must do once the dispatcher returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return to user mode.
    Resume,
    /// The caller went through exit; tear its thread down.
    Exit(i32),
    /// Power the machine off.
    PowerOff,
}

/// Handler result before it is applied to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    /// No return value.
    Resume,
    /// Store a word in the return slot.
    Return(u32),
    Exit(i32),
    PowerOff,
}

impl Flow {
    fn from_int(value: i32) -> Self {
        Self::Return(value as u32)
    }

    fn from_bool(value: bool) -> Self {
        Self::Return(value as u32)
    }
}

impl<F, S, C, M> SyscallBridge<F, S, C, M>
where
    F: FileSystem,
    S: Scheduler<File = F::File>,
    C: Console,
    M: UserMemory,
{
    /// Handle one trapped syscall for the current process.
    ///
    /// Writes the result into `frame.eax` for value-returning calls. When
    /// this returns [`Disposition::Exit`], the exit path (descriptor
    /// cleanup, status, exit line) has already run.
    pub fn dispatch(&self, frame: &mut IntrFrame) -> Disposition {
        let current = self.sched.current();
        let flow = match self.invoke(&current, frame.stack_pointer()) {
            Ok(flow) => flow,
            Err(fault) => {
                warn!(
                    "[SYSCALL] pid {} ({}): {}, killing",
                    current.pid(),
                    current.name(),
                    fault
                );
                Flow::Exit(KILLED)
            }
        };

        match flow {
            Flow::Resume => Disposition::Resume,
            Flow::Return(value) => {
                frame.set_return(value);
                Disposition::Resume
            }
            Flow::Exit(status) => {
                self.exit(&current, status);
                Disposition::Exit(status)
            }
            Flow::PowerOff => Disposition::PowerOff,
        }
    }

    fn invoke(&self, current: &Arc<Process<F::File>>, sp: VirtAddr) -> SysResult<Flow> {
        let opcode = validate::read_user_word(&self.memory, sp, self.config.user_top)?;
        let call = SyscallNumber::try_from(opcode).map_err(Fault::UnknownSyscall)?;
        trace!("[SYSCALL] pid {}: {:?}", current.pid(), call);

        match call {
            SyscallNumber::Halt => Ok(Flow::PowerOff),
            SyscallNumber::Exit => {
                let [status] = self.args(sp)?;
                Ok(Flow::Exit(status as i32))
            }
            SyscallNumber::Exec => {
                let [cmd_line] = self.args(sp)?;
                self.exec(current, cmd_line.into()).map(Flow::from_int)
            }
            SyscallNumber::Wait => {
                let [pid] = self.args(sp)?;
                Ok(Flow::from_int(self.wait(pid.into())))
            }
            SyscallNumber::Create => {
                let [path, initial_size] = self.args(sp)?;
                self.create(path.into(), initial_size).map(Flow::from_bool)
            }
            SyscallNumber::Remove => {
                let [path] = self.args(sp)?;
                self.remove(path.into()).map(Flow::from_bool)
            }
            SyscallNumber::Open => {
                let [path] = self.args(sp)?;
                self.open(current, path.into()).map(Flow::from_int)
            }
            SyscallNumber::Filesize => {
                let [fd] = self.args(sp)?;
                Ok(Flow::from_int(self.filesize(current, Fd::from(fd))))
            }
            SyscallNumber::Read => {
                let [fd, buffer, size] = self.args(sp)?;
                self.read(current, Fd::from(fd), buffer.into(), size)
                    .map(Flow::from_int)
            }
            SyscallNumber::Write => {
                let [fd, buffer, size] = self.args(sp)?;
                self.write(current, Fd::from(fd), buffer.into(), size)
                    .map(Flow::from_int)
            }
            SyscallNumber::Seek => {
                let [fd, position] = self.args(sp)?;
                self.seek(current, Fd::from(fd), position);
                Ok(Flow::Resume)
            }
            SyscallNumber::Tell => {
                let [fd] = self.args(sp)?;
                Ok(Flow::from_int(self.tell(current, Fd::from(fd))))
            }
            SyscallNumber::Close => {
                let [fd] = self.args(sp)?;
                self.close(current, Fd::from(fd));
                Ok(Flow::Resume)
            }
        }
    }

    /// Fetch the `N` argument words above the opcode.
    ///
    /// Every word is validated before the first one is read.
    fn args<const N: usize>(&self, sp: VirtAddr) -> SysResult<[u32; N]> {
        let top = self.config.user_top;
        let mut addrs = [VirtAddr::NULL; N];
        for (i, addr) in addrs.iter_mut().enumerate() {
            let offset = (i + 1) * WORD_SIZE;
            *addr = sp.checked_add(offset).ok_or(Fault::BadAddress {
                addr: sp,
                len: offset + WORD_SIZE,
            })?;
            validate::validate_user_read(*addr, WORD_SIZE, top)?;
        }

        let mut words = [0u32; N];
        for (word, addr) in words.iter_mut().zip(addrs) {
            *word = validate::read_user_word(&self.memory, addr, top)?;
        }
        Ok(words)
    }

    /// Read a path or command line argument.
    pub(super) fn user_str(&self, addr: VirtAddr) -> SysResult<Option<String>> {
        validate::read_user_str(
            &self.memory,
            addr,
            self.config.max_user_string,
            self.config.user_top,
        )
    }
}
