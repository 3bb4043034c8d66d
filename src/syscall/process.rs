//! Process lifecycle syscalls
//!
//! exec, wait and exit. halt never gets here: the dispatcher hands it
//! straight back to the trap entry as [`super::Disposition::PowerOff`].
//!
//! # Exec Handshake
//! 1. Read and validate the command line
//! 2. Refuse if the caller is past the fork depth ceiling
//! 3. Spawn the child at depth + 1, then link it to its parent
//! 4. Block on the child's load rendezvous
//! 5. Return the child pid if it loaded, -1 otherwise

use alloc::format;
use alloc::sync::Arc;

use log::{debug, info, warn};

use super::error::{SysResult, FAILURE};
use super::validate::UserMemory;
use super::SyscallBridge;
use crate::console::Console;
use crate::fs::FileSystem;
use crate::mm::VirtAddr;
use crate::proc::{LoadOutcome, Pid, Process, Scheduler};

impl<F, S, C, M> SyscallBridge<F, S, C, M>
where
    F: FileSystem,
    S: Scheduler<File = F::File>,
    C: Console,
    M: UserMemory,
{
    /// Run the exit path for `process`.
    ///
    /// Closes every descriptor, records the status, prints the exit line and
    /// wakes the parent. Only the first call for a process does more than
    /// the descriptor sweep, which is safe to repeat. Control then belongs
    /// to the scheduler's `terminate`.
    pub fn exit(&self, process: &Process<F::File>, status: i32) {
        let closed = self.close_all(process);
        if !process.record_exit(status) {
            return;
        }
        let line = format!("{}: exit({})\n", process.name(), status);
        self.console.putbuf(line.as_bytes());
        info!(
            "[PROC] pid {} ({}) exited with {}, {} files closed",
            process.pid(),
            process.name(),
            status,
            closed
        );
        if let Some(parent) = process.parent() {
            self.sched.wake_parent(&parent, process.pid());
        }
    }

    /// Start a child process and wait for it to load.
    pub fn exec(&self, current: &Arc<Process<F::File>>, cmd_line: VirtAddr) -> SysResult<i32> {
        let Some(cmd_line) = self.user_str(cmd_line)? else {
            return Ok(FAILURE);
        };

        let depth = current.fork_depth();
        if depth > self.config.max_fork_depth {
            warn!(
                "[PROC] pid {}: exec refused at fork depth {}",
                current.pid(),
                depth
            );
            return Ok(FAILURE);
        }

        let Some(pid) = self.sched.spawn(&cmd_line, depth + 1) else {
            debug!("[PROC] pid {}: spawn {:?} failed", current.pid(), cmd_line);
            return Ok(FAILURE);
        };
        let Some(child) = self.sched.lookup(pid) else {
            warn!("[PROC] spawned pid {} has no process record", pid);
            return Ok(FAILURE);
        };
        child.set_parent(current);
        let rendezvous = child.load_rendezvous();
        drop(child);

        match rendezvous.wait(|| self.sched.yield_now()) {
            LoadOutcome::Loaded => {
                debug!("[PROC] pid {}: exec {:?} -> pid {}", current.pid(), cmd_line, pid);
                Ok(pid.raw())
            }
            LoadOutcome::Failed => {
                debug!("[PROC] pid {}: {:?} failed to load", current.pid(), cmd_line);
                Ok(FAILURE)
            }
        }
    }

    /// Wait for a child. The scheduler owns the semantics.
    pub fn wait(&self, pid: Pid) -> i32 {
        self.sched.wait(pid)
    }
}
