//! Simulated collaborators for host tests
//!
//! In the kernel these are the real filesystem, scheduler, console and
//! address space. Here they are small in-memory stand-ins that record what
//! the bridge did to them so tests can assert on it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::string::String;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::vec::Vec;

use crate::config::BridgeConfig;
use crate::console::Console;
use crate::fs::FileSystem;
use crate::mm::PHYS_BASE;
use crate::proc::{executable_name, Pid, Process, Scheduler};
use crate::syscall::{Disposition, SyscallBridge, UserMemory, UserSlice};
use crate::trap::IntrFrame;

/// In-memory filesystem. Files grow on write.
#[derive(Default)]
pub struct SimFs {
    files: BTreeMap<String, Arc<Mutex<Vec<u8>>>>,
    open: usize,
}

/// Open file: shared contents plus a private cursor.
pub struct SimFile {
    data: Arc<Mutex<Vec<u8>>>,
    pos: usize,
}

impl SimFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles opened and not yet closed.
    pub fn open_handles(&self) -> usize {
        self.open
    }

    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Full contents of a file.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.get(path).map(|data| data.lock().unwrap().clone())
    }
}

impl FileSystem for SimFs {
    type File = SimFile;

    fn create(&mut self, path: &str, initial_size: u32) -> bool {
        if path.is_empty() || self.files.contains_key(path) {
            return false;
        }
        let data = vec![0u8; initial_size as usize];
        self.files
            .insert(String::from(path), Arc::new(Mutex::new(data)));
        true
    }

    fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }

    fn open(&mut self, path: &str) -> Option<SimFile> {
        let data = Arc::clone(self.files.get(path)?);
        self.open += 1;
        Some(SimFile { data, pos: 0 })
    }

    fn close(&mut self, _file: SimFile) {
        self.open -= 1;
    }

    fn read(&mut self, file: &mut SimFile, buf: &mut [u8]) -> usize {
        let data = file.data.lock().unwrap();
        let start = file.pos.min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        drop(data);
        file.pos += n;
        n
    }

    fn write(&mut self, file: &mut SimFile, buf: &[u8]) -> usize {
        let mut data = file.data.lock().unwrap();
        let end = file.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[file.pos..end].copy_from_slice(buf);
        drop(data);
        file.pos = end;
        buf.len()
    }

    fn seek(&mut self, file: &mut SimFile, position: u32) {
        file.pos = position as usize;
    }

    fn tell(&self, file: &SimFile) -> u32 {
        file.pos as u32
    }

    fn length(&self, file: &SimFile) -> u32 {
        file.data.lock().unwrap().len() as u32
    }
}

/// Console with scripted input and captured output.
#[derive(Default)]
pub struct SimConsole {
    input: Mutex<VecDeque<u8>>,
    output: Mutex<Vec<u8>>,
}

impl SimConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue keyboard input.
    pub fn type_in(&self, bytes: &[u8]) {
        self.input.lock().unwrap().extend(bytes.iter().copied());
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output.lock().unwrap()).into_owned()
    }

    /// Output lines that look like a process termination.
    pub fn exit_lines(&self) -> Vec<String> {
        self.output()
            .lines()
            .filter(|line| line.contains(": exit("))
            .map(String::from)
            .collect()
    }
}

impl Console for SimConsole {
    fn getc(&self) -> u8 {
        self.input.lock().unwrap().pop_front().unwrap_or(0)
    }

    fn putbuf(&self, buf: &[u8]) {
        self.output.lock().unwrap().extend_from_slice(buf);
    }
}

/// Sparse user address space. Untouched bytes read as zero.
#[derive(Default)]
pub struct SimMemory {
    bytes: Mutex<BTreeMap<usize, u8>>,
}

impl SimMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes without any validation (test setup only).
    pub fn poke(&self, addr: usize, data: &[u8]) {
        let mut bytes = self.bytes.lock().unwrap();
        for (i, byte) in data.iter().enumerate() {
            bytes.insert(addr + i, *byte);
        }
    }

    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        let bytes = self.bytes.lock().unwrap();
        (addr..addr + len)
            .map(|at| bytes.get(&at).copied().unwrap_or(0))
            .collect()
    }
}

impl UserMemory for SimMemory {
    fn copy_in(&self, src: &UserSlice, dst: &mut [u8]) {
        let len = src.len().min(dst.len());
        let data = self.peek(src.addr().as_usize(), len);
        dst[..len].copy_from_slice(&data);
    }

    fn copy_out(&self, dst: &UserSlice, src: &[u8]) {
        let len = dst.len().min(src.len());
        self.poke(dst.addr().as_usize(), &src[..len]);
    }
}

/// What happens to the next spawned process.
#[derive(Debug, Clone, Copy)]
pub enum SpawnPlan {
    /// Loads and reports success before spawn returns.
    Load,
    /// Reports a load failure before spawn returns.
    FailLoad,
    /// Reports success from another thread after a delay.
    LoadLater(Duration),
    /// Process creation fails outright.
    Refuse,
}

/// Scheduler stand-in
///
/// Tests pick the current process explicitly. `terminate` and `power_off`
/// panic, so a test can observe that control left the bridge.
pub struct SimScheduler {
    procs: Mutex<BTreeMap<Pid, Arc<Process<SimFile>>>>,
    current: Mutex<Pid>,
    next_pid: AtomicI32,
    plans: Mutex<VecDeque<SpawnPlan>>,
    spawned: Mutex<Vec<String>>,
    waited: Mutex<BTreeSet<Pid>>,
    woken: Mutex<Vec<(Pid, Pid)>>,
    loads: Arc<Mutex<Vec<(Pid, u32)>>>,
}

pub const INIT_PID: Pid = Pid::new(1);

impl SimScheduler {
    /// Start with a single process, `init`, as current.
    pub fn new() -> Self {
        let sched = Self {
            procs: Mutex::new(BTreeMap::new()),
            current: Mutex::new(INIT_PID),
            next_pid: AtomicI32::new(INIT_PID.raw() + 1),
            plans: Mutex::new(VecDeque::new()),
            spawned: Mutex::new(Vec::new()),
            waited: Mutex::new(BTreeSet::new()),
            woken: Mutex::new(Vec::new()),
            loads: Arc::new(Mutex::new(Vec::new())),
        };
        sched
            .procs
            .lock()
            .unwrap()
            .insert(INIT_PID, Arc::new(Process::new(INIT_PID, "init")));
        sched
    }

    pub fn plan(&self, plan: SpawnPlan) {
        self.plans.lock().unwrap().push_back(plan);
    }

    pub fn switch_to(&self, pid: Pid) {
        *self.current.lock().unwrap() = pid;
    }

    /// Command lines passed to spawn, refused ones included.
    pub fn spawned(&self) -> Vec<String> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn process_count(&self) -> usize {
        self.procs.lock().unwrap().len()
    }

    /// (child, fork depth) seen by each child as it reported its load.
    pub fn loads(&self) -> Vec<(Pid, u32)> {
        self.loads.lock().unwrap().clone()
    }

    /// (parent, child) pairs passed to `wake_parent`.
    pub fn woken(&self) -> Vec<(Pid, Pid)> {
        self.woken.lock().unwrap().clone()
    }
}

impl Scheduler for SimScheduler {
    type File = SimFile;

    fn current(&self) -> Arc<Process<SimFile>> {
        let pid = *self.current.lock().unwrap();
        self.lookup(pid).expect("current process exists")
    }

    fn spawn(&self, cmd_line: &str, fork_depth: u32) -> Option<Pid> {
        self.spawned.lock().unwrap().push(String::from(cmd_line));
        let plan = self.plans.lock().unwrap().pop_front().unwrap_or(SpawnPlan::Load);
        if let SpawnPlan::Refuse = plan {
            return None;
        }
        let pid = Pid::new(self.next_pid.fetch_add(1, Ordering::SeqCst));
        let child = Arc::new(Process::new(pid, executable_name(cmd_line)));
        child.raise_fork_depth(fork_depth);
        self.procs.lock().unwrap().insert(pid, Arc::clone(&child));
        let loads = Arc::clone(&self.loads);
        let report = move |loaded: bool| {
            loads.lock().unwrap().push((child.pid(), child.fork_depth()));
            child.report_load(loaded);
        };
        match plan {
            SpawnPlan::Load => report(true),
            SpawnPlan::FailLoad => report(false),
            SpawnPlan::LoadLater(delay) => {
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    report(true);
                });
            }
            SpawnPlan::Refuse => unreachable!(),
        }
        Some(pid)
    }

    fn lookup(&self, pid: Pid) -> Option<Arc<Process<SimFile>>> {
        self.procs.lock().unwrap().get(&pid).cloned()
    }

    fn wait(&self, pid: Pid) -> i32 {
        let me = self.current().pid();
        let Some(child) = self.lookup(pid) else {
            return -1;
        };
        if child.parent().map(|p| p.pid()) != Some(me) {
            return -1;
        }
        if !self.waited.lock().unwrap().insert(pid) {
            return -1;
        }
        loop {
            if let Some(status) = child.exit_status() {
                return status;
            }
            std::thread::yield_now();
        }
    }

    fn wake_parent(&self, parent: &Process<SimFile>, child: Pid) {
        self.woken.lock().unwrap().push((parent.pid(), child));
    }

    fn yield_now(&self) {
        std::thread::yield_now();
    }

    fn terminate(&self) -> ! {
        panic!("thread terminated");
    }

    fn power_off(&self) -> ! {
        panic!("machine powered off");
    }
}

pub type SimBridge = SyscallBridge<SimFs, SimScheduler, SimConsole, SimMemory>;

/// Where test frames put the syscall opcode.
pub const STACK: usize = 0xBFFF_F000;

/// Scratch area for strings and buffers.
pub const DATA: usize = 0x0804_0000;

pub fn bridge() -> SimBridge {
    SyscallBridge::new(
        SimFs::new(),
        SimScheduler::new(),
        SimConsole::new(),
        SimMemory::new(),
        BridgeConfig::DEFAULT,
    )
}

/// Lay out `words` (opcode first) at `STACK` and trap.
pub fn syscall(bridge: &SimBridge, words: &[u32]) -> (Disposition, IntrFrame) {
    syscall_at(bridge, STACK, words)
}

/// Lay out `words` at `sp` and trap.
pub fn syscall_at(bridge: &SimBridge, sp: usize, words: &[u32]) -> (Disposition, IntrFrame) {
    for (i, word) in words.iter().enumerate() {
        bridge.memory().poke(sp + i * 4, &word.to_le_bytes());
    }
    let mut frame = IntrFrame::new(sp);
    let disposition = bridge.dispatch(&mut frame);
    (disposition, frame)
}

/// Place a NUL-terminated string in user memory and return its address.
pub fn user_str(bridge: &SimBridge, addr: usize, s: &str) -> u32 {
    bridge.memory().poke(addr, s.as_bytes());
    bridge.memory().poke(addr + s.len(), &[0]);
    addr as u32
}

/// An address the validator must reject.
pub const KERNEL_ADDR: u32 = PHYS_BASE as u32;
