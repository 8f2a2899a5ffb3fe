//! Bounded views over the caller's buffer for `read`/`write` handlers.
//!
//! Handlers never see the raw slice: they go through [`UserSliceReader`] and
//! [`UserSliceWriter`], which fail with [`EFAULT`] instead of going out of
//! bounds.

use alloc::vec::Vec;

use crate::code::EFAULT;
use crate::error::KernelResult as Result;

/// A reader for the data passed to a `write` call.
///
/// Used to incrementally read from the user slice.
pub struct UserSliceReader<'a> {
    data: &'a [u8],
}

impl<'a> UserSliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Skip the provided number of bytes.
    ///
    /// Returns an error if skipping more than the length of the buffer.
    pub fn skip(&mut self, num_skip: usize) -> Result {
        self.data = self.data.get(num_skip..).ok_or(EFAULT)?;
        Ok(())
    }

    /// Create a reader that can access the same range of data.
    ///
    /// Reading from the clone does not advance the current reader.
    pub fn clone_reader(&self) -> UserSliceReader<'a> {
        UserSliceReader { data: self.data }
    }

    /// Returns the number of bytes left to be read from this reader.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if no data is available in the io buffer.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fills `out` from the front of the slice.
    ///
    /// Fails with [`EFAULT`] if `out` is longer than what is left, in which
    /// case nothing is consumed.
    pub fn read_slice(&mut self, out: &mut [u8]) -> Result {
        let len = out.len();
        if len > self.data.len() {
            return Err(EFAULT);
        }
        let (head, tail) = self.data.split_at(len);
        out.copy_from_slice(head);
        self.data = tail;
        Ok(())
    }

    /// Reads the entirety of the user slice, appending it to the end of the provided buffer.
    pub fn read_all(self, buf: &mut Vec<u8>) -> Result {
        buf.try_reserve(self.data.len())?;
        buf.extend_from_slice(self.data);
        Ok(())
    }
}

/// A writer for the buffer passed to a `read` call.
pub struct UserSliceWriter<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> UserSliceWriter<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the number of bytes that can still be written.
    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` if no more data can be written to this buffer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of bytes written so far.
    pub fn written(&self) -> usize {
        self.pos
    }

    /// Writes `data` after whatever was written before.
    ///
    /// Fails with [`EFAULT`] if `data` does not fit; nothing is written then.
    pub fn write_slice(&mut self, data: &[u8]) -> Result {
        let end = self.pos.checked_add(data.len()).ok_or(EFAULT)?;
        if end > self.data.len() {
            return Err(EFAULT);
        }
        self.data[self.pos..end].copy_from_slice(data);
        self.pos = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn reader_consumes_in_order() {
        let mut reader = UserSliceReader::new(b"hello world");
        let mut head = [0u8; 5];
        reader.read_slice(&mut head).unwrap();
        assert_eq!(&head, b"hello");
        reader.skip(1).unwrap();
        assert_eq!(reader.len(), 5);

        let peek = reader.clone_reader();
        let mut rest = Vec::new();
        reader.read_all(&mut rest).unwrap();
        assert_eq!(rest, b"world");
        assert_eq!(peek.len(), 5);
    }

    #[test]
    fn reader_rejects_overrun() {
        let mut reader = UserSliceReader::new(b"abc");
        let mut out = [0u8; 4];
        assert_eq!(reader.read_slice(&mut out), Err(EFAULT));
        assert_eq!(reader.len(), 3);
        assert_eq!(reader.skip(4), Err(EFAULT));
        assert!(!reader.is_empty());
    }

    #[test]
    fn writer_tracks_position_and_capacity() {
        let mut buf = [0u8; 6];
        let mut writer = UserSliceWriter::new(&mut buf);
        writer.write_slice(b"abc").unwrap();
        assert_eq!(writer.written(), 3);
        assert_eq!(writer.len(), 3);
        assert_eq!(writer.write_slice(b"defg"), Err(EFAULT));
        writer.write_slice(b"def").unwrap();
        assert!(writer.is_empty());
        assert_eq!(&buf, b"abcdef");
    }
}
