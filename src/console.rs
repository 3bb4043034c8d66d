//! Console collaborator
//!
//! Descriptor 0 reads from it one byte at a time and descriptor 1 writes to
//! it in bulk. The process exit line and the kernel logger go to it as well.

use core::fmt::{self, Write};

/// The system console.
pub trait Console {
    /// Block until one byte of input is available.
    fn getc(&self) -> u8;

    /// Write bytes verbatim.
    fn putbuf(&self, buf: &[u8]);
}

impl<C: Console + ?Sized> Console for &C {
    fn getc(&self) -> u8 {
        (**self).getc()
    }

    fn putbuf(&self, buf: &[u8]) {
        (**self).putbuf(buf)
    }
}

/// `core::fmt` adapter so `write!` can target a console without allocating.
pub struct ConsoleWriter<'a, C: ?Sized>(pub &'a C);

impl<C: Console + ?Sized> Write for ConsoleWriter<'_, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.putbuf(s.as_bytes());
        Ok(())
    }
}
