//! File syscalls
//!
//! create, remove, open, filesize, read, write, seek, tell, close, plus the
//! `close_all` sweep run on exit.
//!
//! Every call here holds the filesystem lock for its whole duration,
//! console I/O on descriptors 0 and 1 included. User buffers are validated
//! as a whole before the first byte moves and are copied through a bounded
//! bounce buffer, never an allocation sized by the caller.

use alloc::vec;

use log::debug;

use super::error::{Fault, SysResult, FAILURE};
use super::validate::{validate_user_read, validate_user_write, UserMemory, UserSlice};
use super::SyscallBridge;
use crate::console::Console;
use crate::fs::{Fd, FileSystem};
use crate::mm::VirtAddr;
use crate::proc::{Process, Scheduler};

impl<F, S, C, M> SyscallBridge<F, S, C, M>
where
    F: FileSystem,
    S: Scheduler<File = F::File>,
    C: Console,
    M: UserMemory,
{
    /// Create a file. No descriptor is allocated.
    pub fn create(&self, path: VirtAddr, initial_size: u32) -> SysResult<bool> {
        let Some(path) = self.user_str(path)? else {
            return Ok(false);
        };
        let mut fs = self.fs.lock();
        Ok(fs.create(&path, initial_size))
    }

    /// Delete a file.
    pub fn remove(&self, path: VirtAddr) -> SysResult<bool> {
        let Some(path) = self.user_str(path)? else {
            return Ok(false);
        };
        let mut fs = self.fs.lock();
        Ok(fs.remove(&path))
    }

    /// Open a file for `process`; returns the new descriptor or -1.
    pub fn open(&self, process: &Process<F::File>, path: VirtAddr) -> SysResult<i32> {
        let Some(path) = self.user_str(path)? else {
            return Ok(FAILURE);
        };
        let mut fs = self.fs.lock();
        let Some(file) = fs.open(&path) else {
            debug!("[FS] pid {}: open {:?} failed", process.pid(), path);
            return Ok(FAILURE);
        };
        let inserted = process.files().insert(file);
        match inserted {
            Ok(fd) => {
                debug!("[FS] pid {}: open {:?} -> fd {}", process.pid(), path, fd);
                Ok(fd.raw())
            }
            Err(file) => {
                fs.close(file);
                Ok(FAILURE)
            }
        }
    }

    /// Length of the file behind `fd`, or -1.
    pub fn filesize(&self, process: &Process<F::File>, fd: Fd) -> i32 {
        let fs = self.fs.lock();
        if fd.is_console() {
            return FAILURE;
        }
        let files = process.files();
        match files.get(fd) {
            Some(file) => fs.length(file) as i32,
            None => FAILURE,
        }
    }

    /// Read up to `size` bytes into the user buffer.
    ///
    /// Descriptor 0 reads exactly `size` console bytes. Descriptor 1 is
    /// a fault. Unknown descriptors return -1.
    pub fn read(
        &self,
        process: &Process<F::File>,
        fd: Fd,
        buffer: VirtAddr,
        size: u32,
    ) -> SysResult<i32> {
        let mut fs = self.fs.lock();
        let buffer = validate_user_write(buffer, size as usize, self.config.user_top)?;

        if fd == Fd::STDIN {
            self.console_read(&buffer);
            return Ok(size as i32);
        }
        if fd == Fd::STDOUT {
            return Err(Fault::ReservedDescriptor { fd });
        }

        let mut files = process.files();
        let Some(file) = files.get_mut(fd) else {
            return Ok(FAILURE);
        };

        let mut chunk = vec![0u8; self.config.io_chunk.min(buffer.len())];
        let mut done = 0;
        while done < buffer.len() {
            let want = (buffer.len() - done).min(chunk.len());
            let got = fs.read(file, &mut chunk[..want]).min(want);
            if let Some(window) = buffer.window(done, got) {
                self.memory.copy_out(&window, &chunk[..got]);
            }
            done += got;
            if got < want {
                break;
            }
        }
        Ok(done as i32)
    }

    /// Write `size` bytes from the user buffer.
    ///
    /// Descriptor 1 writes everything to the console. Descriptor 0 is a
    /// fault. Unknown descriptors return -1.
    pub fn write(
        &self,
        process: &Process<F::File>,
        fd: Fd,
        buffer: VirtAddr,
        size: u32,
    ) -> SysResult<i32> {
        let mut fs = self.fs.lock();
        let buffer = validate_user_read(buffer, size as usize, self.config.user_top)?;

        if fd == Fd::STDOUT {
            self.console_write(&buffer);
            return Ok(size as i32);
        }
        if fd == Fd::STDIN {
            return Err(Fault::ReservedDescriptor { fd });
        }

        let mut files = process.files();
        let Some(file) = files.get_mut(fd) else {
            return Ok(FAILURE);
        };

        let mut chunk = vec![0u8; self.config.io_chunk.min(buffer.len())];
        let mut done = 0;
        while done < buffer.len() {
            let want = (buffer.len() - done).min(chunk.len());
            if let Some(window) = buffer.window(done, want) {
                self.memory.copy_in(&window, &mut chunk[..want]);
            }
            let put = fs.write(file, &chunk[..want]).min(want);
            done += put;
            if put < want {
                break;
            }
        }
        Ok(done as i32)
    }

    /// Move the cursor of `fd`. No-op for console and unknown descriptors.
    pub fn seek(&self, process: &Process<F::File>, fd: Fd, position: u32) {
        let mut fs = self.fs.lock();
        if fd.is_console() {
            return;
        }
        match process.files().get_mut(fd) {
            Some(file) => fs.seek(file, position),
            None => debug!("[FS] pid {}: seek on unknown fd {}", process.pid(), fd),
        }
    }

    /// Cursor of `fd`: 0 for the console, -1 for unknown descriptors.
    pub fn tell(&self, process: &Process<F::File>, fd: Fd) -> i32 {
        let fs = self.fs.lock();
        if fd.is_console() {
            return 0;
        }
        match process.files().get(fd) {
            Some(file) => fs.tell(file) as i32,
            None => FAILURE,
        }
    }

    /// Close `fd`. Unknown and already-closed descriptors are ignored.
    pub fn close(&self, process: &Process<F::File>, fd: Fd) {
        let mut fs = self.fs.lock();
        if !process.files().close(fd, &mut *fs) {
            debug!("[FS] pid {}: close of unknown fd {}", process.pid(), fd);
        }
    }

    /// Close everything `process` still has open. Returns the count.
    pub fn close_all(&self, process: &Process<F::File>) -> usize {
        let mut fs = self.fs.lock();
        let closed = process.files().close_all(&mut *fs);
        if closed > 0 {
            debug!("[FS] pid {}: closed {} files", process.pid(), closed);
        }
        closed
    }

    fn console_read(&self, buffer: &UserSlice) {
        let mut chunk = vec![0u8; self.config.io_chunk.min(buffer.len())];
        let mut done = 0;
        while done < buffer.len() {
            let want = (buffer.len() - done).min(chunk.len());
            for byte in &mut chunk[..want] {
                *byte = self.console.getc();
            }
            if let Some(window) = buffer.window(done, want) {
                self.memory.copy_out(&window, &chunk[..want]);
            }
            done += want;
        }
    }

    fn console_write(&self, buffer: &UserSlice) {
        let mut chunk = vec![0u8; self.config.io_chunk.min(buffer.len())];
        let mut done = 0;
        while done < buffer.len() {
            let want = (buffer.len() - done).min(chunk.len());
            if let Some(window) = buffer.window(done, want) {
                self.memory.copy_in(&window, &mut chunk[..want]);
            }
            self.console.putbuf(&chunk[..want]);
            done += want;
        }
    }
}
