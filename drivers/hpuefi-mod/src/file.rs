use kernel::{
    buf::{UserSliceReader, UserSliceWriter},
    error::KernelResult,
    fs::file_operations::{File, FileOperations},
};

use crate::DEVICE_NAME;

/// Handlers of the `hpuefi-mod` node.
///
/// Reads always hit end of data and writes are accepted whole without being
/// looked at. Nothing is shared between open files.
pub struct HpUefiFile;

/// The handler table registered together with the major number.
pub static HANDLERS: HpUefiFile = HpUefiFile;

impl FileOperations for HpUefiFile {
    fn open(&self, _file: &File) -> KernelResult {
        log::info!("{}: Device opened", DEVICE_NAME);
        Ok(())
    }

    fn release(&self, _file: &File) -> KernelResult {
        log::info!("{}: Device closed", DEVICE_NAME);
        Ok(())
    }

    fn read(&self, _file: &File, _buf: &mut UserSliceWriter<'_>, _offset: u64) -> KernelResult<usize> {
        log::info!("{}: Read operation", DEVICE_NAME);
        Ok(0)
    }

    fn write(&self, _file: &File, buf: &mut UserSliceReader<'_>, _offset: u64) -> KernelResult<usize> {
        log::info!("{}: Write operation", DEVICE_NAME);
        Ok(buf.len())
    }
}
