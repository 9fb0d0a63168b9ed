//! Bounds-checked stream access used by the loaders.

use std::io::{Read, Seek, SeekFrom};

use nx_common::ReadExt;
use zerocopy::FromBytes;

use crate::{Error, Result};

/// A seekable stream that knows its own length.
///
/// Every seek is checked against the file length before it happens, so a
/// table whose declared size cannot fit in the file is rejected up front
/// instead of allocating or reading a partial block.
pub(crate) struct Source<R> {
    inner: R,
    len: u64,
}

impl<R: Read + Seek> Source<R> {
    /// Wrap a stream, measuring its length and rewinding to the start.
    pub fn new(mut inner: R) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self { inner, len })
    }

    /// Total length of the stream in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Seek to `offset`, requiring `span` bytes to be available from there.
    pub fn seek_to(&mut self, what: &'static str, offset: i64, span: u64) -> Result<()> {
        let start = u64::try_from(offset).map_err(|_| Error::NegativeOffset { what, offset })?;

        match start.checked_add(span) {
            Some(end) if end <= self.len => {}
            _ => {
                return Err(Error::OutOfBounds {
                    what,
                    offset: start,
                    len: span,
                    file_len: self.len,
                })
            }
        }

        self.inner
            .seek(SeekFrom::Start(start))
            .map_err(|e| Error::from_io(e, what))?;
        Ok(())
    }

    /// Read a fixed-layout record.
    pub fn read_struct<T: FromBytes>(&mut self, what: &'static str) -> Result<T> {
        self.inner.read_struct().map_err(|e| Error::from_io(e, what))
    }

    /// Read `count` consecutive fixed-layout records.
    pub fn read_records<T: FromBytes>(&mut self, what: &'static str, count: usize) -> Result<Vec<T>> {
        self.inner
            .read_records(count)
            .map_err(|e| Error::from_io(e, what))
    }

    /// Read exactly `len` raw bytes.
    pub fn read_blob(&mut self, what: &'static str, len: usize) -> Result<Vec<u8>> {
        self.inner.read_blob(len).map_err(|e| Error::from_io(e, what))
    }

    /// Fill `buf` completely.
    pub fn read_exact(&mut self, what: &'static str, buf: &mut [u8]) -> Result<()> {
        self.inner
            .read_exact(buf)
            .map_err(|e| Error::from_io(e, what))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn test_seek_within_bounds() {
        let mut source = Source::new(Cursor::new(vec![1u8, 2, 3, 4])).unwrap();
        assert_eq!(source.len(), 4);

        source.seek_to("blob", 2, 2).unwrap();
        assert_eq!(source.read_blob("blob", 2).unwrap(), vec![3, 4]);
    }

    #[test]
    fn test_seek_past_end() {
        let mut source = Source::new(Cursor::new(vec![0u8; 8])).unwrap();
        assert!(matches!(
            source.seek_to("table", 4, 8),
            Err(Error::OutOfBounds {
                offset: 4,
                len: 8,
                file_len: 8,
                ..
            })
        ));
        assert!(matches!(
            source.seek_to("table", 0, u64::MAX),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_negative_offset() {
        let mut source = Source::new(Cursor::new(vec![0u8; 8])).unwrap();
        assert!(matches!(
            source.seek_to("table", -1, 0),
            Err(Error::NegativeOffset { offset: -1, .. })
        ));
    }

    #[test]
    fn test_short_read_is_truncated() {
        let mut source = Source::new(Cursor::new(vec![0u8; 3])).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(
            source.read_exact("record", &mut buf),
            Err(Error::Truncated { what: "record" })
        ));
    }
}
