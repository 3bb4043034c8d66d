//! Load rendezvous
//!
//! One-shot handoff from a freshly spawned child to the parent blocked in
//! `exec`. The child reports exactly once whether its program loaded; the
//! parent waits exactly once for that report.
//!
//! # Protocol
//! ```text
//!   parent (exec)                 child (loader)
//!   spawn ─────────────────────►  start
//!   wait() ... polling            load program
//!                                 signal(Loaded | Failed)
//!   ◄──────────────────────────── state published (Release)
//!   observe (Acquire), return
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

const PENDING: u8 = 0;
const LOADED: u8 = 1;
const FAILED: u8 = 2;

/// What the child reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Program image is in place; the child will run.
    Loaded,
    /// Loading failed; the child is tearing itself down.
    Failed,
}

impl LoadOutcome {
    const fn encode(self) -> u8 {
        match self {
            Self::Loaded => LOADED,
            Self::Failed => FAILED,
        }
    }

    const fn decode(raw: u8) -> Option<Self> {
        match raw {
            LOADED => Some(Self::Loaded),
            FAILED => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Single-producer single-consumer load report.
#[derive(Debug)]
pub struct LoadRendezvous {
    state: AtomicU8,
}

impl LoadRendezvous {
    /// Create an unsignaled rendezvous.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(PENDING),
        }
    }

    /// Publish the load result.
    ///
    /// Only the first signal counts. Returns false if one was already
    /// published.
    pub fn signal(&self, outcome: LoadOutcome) -> bool {
        self.state
            .compare_exchange(PENDING, outcome.encode(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// The published result, if any.
    pub fn outcome(&self) -> Option<LoadOutcome> {
        LoadOutcome::decode(self.state.load(Ordering::Acquire))
    }

    /// Block until the child signals.
    ///
    /// `idle` runs between polls; the scheduler passes its yield there so
    /// the child gets CPU time on a single core.
    pub fn wait(&self, mut idle: impl FnMut()) -> LoadOutcome {
        loop {
            if let Some(outcome) = self.outcome() {
                return outcome;
            }
            idle();
        }
    }
}

impl Default for LoadRendezvous {
    fn default() -> Self {
        Self::new()
    }
}
