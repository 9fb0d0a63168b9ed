//! NX file header.

use std::io::{Read, Seek};

use tracing::debug;
use zerocopy::byteorder::little_endian::{I64, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::source::Source;
use crate::{Error, Result};

/// NX file header, stored at the very start of the file.
///
/// Every field is stored little-endian and the record has no padding, so it
/// can be read in a single pass.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct NxHeader {
    /// Magic bytes, always `PKG4`.
    pub magic: [u8; 4],
    /// Number of node records.
    pub node_count: U32,
    /// Absolute offset of the node block.
    pub node_offset: I64,
    /// Number of strings.
    pub string_count: U32,
    /// Absolute offset of the string offset table.
    pub string_offset: I64,
    /// Number of bitmaps.
    pub bitmap_count: U32,
    /// Absolute offset of the bitmap offset table.
    pub bitmap_offset: I64,
    /// Number of audio clips.
    pub audio_count: U32,
    /// Absolute offset of the audio offset table.
    pub audio_offset: I64,
}

const _: () = assert!(std::mem::size_of::<NxHeader>() == NxHeader::SIZE);

/// Count and location of one block described by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLocation {
    /// Number of entries.
    pub count: u32,
    /// Absolute file offset of the first entry.
    pub offset: i64,
}

impl NxHeader {
    /// The magic bytes at the start of an NX file.
    pub const MAGIC: &'static [u8; 4] = b"PKG4";

    /// Size of the on-disk header in bytes.
    pub const SIZE: usize = 52;

    /// Check if data starts with the NX magic.
    pub fn is_nx(data: &[u8]) -> bool {
        data.starts_with(Self::MAGIC)
    }

    /// Read and validate the header at the current stream position.
    pub(crate) fn read<R: Read + Seek>(source: &mut Source<R>) -> Result<Self> {
        let header: Self = source.read_struct("header")?;

        if &header.magic != Self::MAGIC {
            return Err(Error::InvalidMagic {
                expected: *Self::MAGIC,
                actual: header.magic,
            });
        }

        debug!(
            nodes = header.node_count.get(),
            strings = header.string_count.get(),
            bitmaps = header.bitmap_count.get(),
            audio = header.audio_count.get(),
            "read NX header"
        );

        Ok(header)
    }

    /// Location of the node block.
    #[inline]
    pub fn nodes(&self) -> TableLocation {
        TableLocation {
            count: self.node_count.get(),
            offset: self.node_offset.get(),
        }
    }

    /// Location of the string offset table.
    #[inline]
    pub fn strings(&self) -> TableLocation {
        TableLocation {
            count: self.string_count.get(),
            offset: self.string_offset.get(),
        }
    }

    /// Location of the bitmap offset table.
    #[inline]
    pub fn bitmaps(&self) -> TableLocation {
        TableLocation {
            count: self.bitmap_count.get(),
            offset: self.bitmap_offset.get(),
        }
    }

    /// Location of the audio offset table.
    #[inline]
    pub fn audio(&self) -> TableLocation {
        TableLocation {
            count: self.audio_count.get(),
            offset: self.audio_offset.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::fixture;
    use crate::ErrorKind;

    #[test]
    fn test_is_nx() {
        assert!(NxHeader::is_nx(b"PKG4extra data"));
        assert!(!NxHeader::is_nx(b"PKG3"));
        assert!(!NxHeader::is_nx(b"PK"));
    }

    #[test]
    fn test_read_header_fields() {
        let data = fixture::sample();
        let mut source = Source::new(Cursor::new(data)).unwrap();
        let header = NxHeader::read(&mut source).unwrap();

        assert_eq!(header.nodes().count, 9);
        assert_eq!(header.nodes().offset, NxHeader::SIZE as i64);
        assert_eq!(header.strings().count, fixture::SAMPLE_STRINGS.len() as u32);
        assert_eq!(header.bitmaps().count, 1);
        assert_eq!(header.audio().count, 1);
    }

    #[test]
    fn test_invalid_magic() {
        let mut data = fixture::sample();
        data[0] = 0x00;
        let mut source = Source::new(Cursor::new(data)).unwrap();

        let err = NxHeader::read(&mut source).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidMagic {
                actual: [0x00, 0x4B, 0x47, 0x34],
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_truncated_header() {
        let data = fixture::sample()[..NxHeader::SIZE - 1].to_vec();
        let mut source = Source::new(Cursor::new(data)).unwrap();

        assert!(matches!(
            NxHeader::read(&mut source),
            Err(Error::Truncated { what: "header" })
        ));
    }
}
