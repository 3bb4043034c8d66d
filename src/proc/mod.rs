//! Process records and the scheduler collaborator
//!
//! The scheduler allocates a [`Process`] for every user process and shares
//! it as an `Arc`. The bridge reads and updates the fields it owns:
//! - the descriptor table (with its next-fd counter)
//! - the exit status, set once on exit
//! - the fork depth, which only grows
//! - the load rendezvous used by `exec`
//! - the back-reference to the parent, set once by the parent
//!
//! # State Machine
//! ```text
//! CREATED ──► (exec rendezvous pending) ──► RUNNING ──► EXITING ──► REAPED
//!                                                       close_all
//!                                                       status set
//! ```

pub mod rendezvous;

use alloc::string::String;
use alloc::sync::{Arc, Weak};
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use spin::{Mutex, MutexGuard, Once};

use crate::fs::FdTable;

pub use rendezvous::{LoadOutcome, LoadRendezvous};

/// A process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Pid(i32);

impl Pid {
    /// Wrap a raw pid.
    #[inline]
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }
}

impl From<u32> for Pid {
    fn from(word: u32) -> Self {
        Self(word as i32)
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Executable name of a command line: its first word.
pub fn executable_name(cmd_line: &str) -> &str {
    cmd_line.split_whitespace().next().unwrap_or("")
}

/// The part of a process the syscall bridge is responsible for.
///
/// `H` is the filesystem's open-file handle type.
pub struct Process<H> {
    pid: Pid,
    name: String,
    files: Mutex<FdTable<H>>,
    exit_status: Once<i32>,
    fork_depth: AtomicU32,
    load: Arc<LoadRendezvous>,
    parent: Once<Weak<Process<H>>>,
}

impl<H> Process<H> {
    /// Create the record for a new process at fork depth 0.
    pub fn new(pid: Pid, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            files: Mutex::new(FdTable::new()),
            exit_status: Once::new(),
            fork_depth: AtomicU32::new(0),
            load: Arc::new(LoadRendezvous::new()),
            parent: Once::new(),
        }
    }

    /// Process id.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Executable name, as printed in the exit line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the descriptor table.
    ///
    /// Callers that close handles must already hold the filesystem lock.
    pub fn files(&self) -> MutexGuard<'_, FdTable<H>> {
        self.files.lock()
    }

    /// Recorded exit status, once the process has exited.
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status.get().copied()
    }

    /// Record the exit status.
    ///
    /// Returns true only for the call that actually set it; later calls
    /// leave the first status in place.
    pub fn record_exit(&self, status: i32) -> bool {
        let mut first = false;
        self.exit_status.call_once(|| {
            first = true;
            status
        });
        first
    }

    /// Number of exec generations above this process.
    pub fn fork_depth(&self) -> u32 {
        self.fork_depth.load(Ordering::Acquire)
    }

    /// Raise the fork depth to `depth`. A lower value is ignored.
    pub fn raise_fork_depth(&self, depth: u32) {
        self.fork_depth.fetch_max(depth, Ordering::AcqRel);
    }

    /// The rendezvous this process reports its load result on.
    pub fn load_rendezvous(&self) -> Arc<LoadRendezvous> {
        Arc::clone(&self.load)
    }

    /// Child side of exec: report whether the program loaded.
    ///
    /// Returns false if a result was already reported.
    pub fn report_load(&self, loaded: bool) -> bool {
        let outcome = if loaded {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::Failed
        };
        self.load.signal(outcome)
    }

    /// Load result, if reported.
    pub fn load_outcome(&self) -> Option<LoadOutcome> {
        self.load.outcome()
    }

    /// Link this process to the parent that exec'd it. Only the first link
    /// sticks.
    pub fn set_parent(&self, parent: &Arc<Process<H>>) -> bool {
        let mut first = false;
        self.parent.call_once(|| {
            first = true;
            Arc::downgrade(parent)
        });
        first
    }

    /// The parent, if linked and still alive.
    pub fn parent(&self) -> Option<Arc<Process<H>>> {
        self.parent.get().and_then(Weak::upgrade)
    }
}

impl<H> fmt::Debug for Process<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &self.name)
            .field("exit_status", &self.exit_status())
            .field("fork_depth", &self.fork_depth())
            .finish()
    }
}

/// The scheduler collaborator
///
/// Owns threads, process creation and reaping. The bridge never creates or
/// frees a [`Process`] itself.
pub trait Scheduler {
    /// Open-file handle type stored in process descriptor tables.
    type File;

    /// The process whose thread is running this syscall.
    fn current(&self) -> Arc<Process<Self::File>>;

    /// Start a process for `cmd_line` at `fork_depth`. `None` if it could
    /// not be created.
    ///
    /// The record must carry `fork_depth` before the child first runs, so
    /// a child that preempts its parent cannot exec below the ceiling it
    /// inherits. The child loads asynchronously and reports through its
    /// [`LoadRendezvous`].
    fn spawn(&self, cmd_line: &str, fork_depth: u32) -> Option<Pid>;

    /// Find a live process record.
    fn lookup(&self, pid: Pid) -> Option<Arc<Process<Self::File>>>;

    /// Block until child `pid` exits and return its status.
    ///
    /// Invalid, foreign and already-waited pids get the scheduler's own
    /// failure value.
    fn wait(&self, pid: Pid) -> i32;

    /// A child of `parent` just recorded its exit status.
    fn wake_parent(&self, _parent: &Process<Self::File>, _child: Pid) {}

    /// Give up the CPU while polling a rendezvous.
    fn yield_now(&self) {
        core::hint::spin_loop();
    }

    /// Tear down the current thread. Its process has already been through
    /// the exit path.
    fn terminate(&self) -> !;

    /// Power the machine off.
    fn power_off(&self) -> !;
}
