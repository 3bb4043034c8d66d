//! System call numbers
//!
//! The numbering is fixed by the user-space syscall stubs.

/// Every syscall the bridge understands.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallNumber {
    /// Power the machine off.
    Halt = 0,
    /// Terminate the calling process.
    Exit = 1,
    /// Start a child from a command line.
    Exec = 2,
    /// Wait for a child and collect its exit status.
    Wait = 3,
    /// Create a file.
    Create = 4,
    /// Delete a file.
    Remove = 5,
    /// Open a file and return a descriptor.
    Open = 6,
    /// Size of an open file.
    Filesize = 7,
    /// Read from a descriptor.
    Read = 8,
    /// Write to a descriptor.
    Write = 9,
    /// Move a file cursor.
    Seek = 10,
    /// Report a file cursor.
    Tell = 11,
    /// Close a descriptor.
    Close = 12,
}

impl TryFrom<u32> for SyscallNumber {
    type Error = u32;

    fn try_from(no: u32) -> Result<Self, Self::Error> {
        match no {
            0 => Ok(Self::Halt),
            1 => Ok(Self::Exit),
            2 => Ok(Self::Exec),
            3 => Ok(Self::Wait),
            4 => Ok(Self::Create),
            5 => Ok(Self::Remove),
            6 => Ok(Self::Open),
            7 => Ok(Self::Filesize),
            8 => Ok(Self::Read),
            9 => Ok(Self::Write),
            10 => Ok(Self::Seek),
            11 => Ok(Self::Tell),
            12 => Ok(Self::Close),
            other => Err(other),
        }
    }
}
