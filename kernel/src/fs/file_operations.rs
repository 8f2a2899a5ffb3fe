//! File operations for character devices.
//!
//! C header: [`include/linux/fs.h`](../../../../include/linux/fs.h)

use crate::{
    buf::{UserSliceReader, UserSliceWriter},
    chrdev::DevT,
    code::EINVAL,
    error::KernelResult,
};

bitflags::bitflags! {
    /// Access mode and status flags an open file was created with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FileFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const APPEND = 1 << 2;
        const NONBLOCK = 1 << 3;
    }
}

/// An open instance of a device node.
#[derive(Debug, Clone, Copy)]
pub struct File {
    devt: DevT,
    flags: FileFlags,
}

impl File {
    pub fn new(devt: DevT, flags: FileFlags) -> Self {
        Self { devt, flags }
    }

    pub fn devt(&self) -> DevT {
        self.devt
    }

    pub fn minor(&self) -> u32 {
        self.devt.minor()
    }

    pub fn flags(&self) -> FileFlags {
        self.flags
    }
}

/// The handler table of a character device, `struct file_operations` in C.
///
/// One `&'static` instance is handed to the host when the major number is
/// registered; the host calls it for every file opened on the device, possibly
/// from several threads at once.
///
/// Missing `read`/`write` handlers fail with `EINVAL`, which is what the
/// kernel's VFS reports for a `NULL` entry.
pub trait FileOperations: Sync {
    fn open(&self, _file: &File) -> KernelResult {
        Ok(())
    }

    fn release(&self, _file: &File) -> KernelResult {
        Ok(())
    }

    /// Fills `buf` with data at `offset`, returning the number of bytes
    /// produced. Zero means end of data.
    fn read(
        &self,
        _file: &File,
        _buf: &mut UserSliceWriter<'_>,
        _offset: u64,
    ) -> KernelResult<usize> {
        Err(EINVAL)
    }

    /// Consumes data from `buf` at `offset`, returning how many bytes were
    /// accepted.
    fn write(
        &self,
        _file: &File,
        _buf: &mut UserSliceReader<'_>,
        _offset: u64,
    ) -> KernelResult<usize> {
        Err(EINVAL)
    }
}
