//! Syscall trap entry
//!
//! The low-level interrupt code saves user registers into an [`IntrFrame`]
//! and calls [`syscall_entry`]. This module is the seam between that code
//! and the dispatcher.
//!
//! # Security Considerations
//! - Only the user stack pointer is read from the frame; everything else
//!   comes from validated user memory
//! - A caller that goes through exit never returns to user mode

use log::info;

use crate::console::Console;
use crate::fs::FileSystem;
use crate::mm::VirtAddr;
use crate::proc::Scheduler;
use crate::syscall::{Disposition, SyscallBridge, UserMemory};

/// Register state saved at the syscall trap
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrFrame {
    /// User stack pointer; the opcode word sits here.
    pub esp: usize,
    /// Return value register.
    pub eax: u32,
}

impl IntrFrame {
    /// Frame for a trap with user stack pointer `esp`.
    pub const fn new(esp: usize) -> Self {
        Self { esp, eax: 0 }
    }

    /// The trapped user stack pointer.
    #[inline]
    pub const fn stack_pointer(&self) -> VirtAddr {
        VirtAddr::new(self.esp)
    }

    /// Store a syscall result.
    #[inline]
    pub fn set_return(&mut self, value: u32) {
        self.eax = value;
    }
}

/// Handle a syscall trap from user mode.
///
/// Returns only if the caller should resume in user mode; exit and halt
/// leave through the scheduler.
pub fn syscall_entry<F, S, C, M>(bridge: &SyscallBridge<F, S, C, M>, frame: &mut IntrFrame)
where
    F: FileSystem,
    S: Scheduler<File = F::File>,
    C: Console,
    M: UserMemory,
{
    match bridge.dispatch(frame) {
        Disposition::Resume => {}
        Disposition::Exit(_) => bridge.scheduler().terminate(),
        Disposition::PowerOff => {
            info!("[SYSCALL] halt: powering off");
            bridge.scheduler().power_off()
        }
    }
}
