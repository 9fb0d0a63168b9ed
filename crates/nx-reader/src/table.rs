//! Offset-indexed lookup tables.
//!
//! Strings and bitmaps share one on-disk shape: an array of absolute `i64`
//! offsets, each pointing at a `u16` length prefix followed by that many
//! bytes.

use std::fmt;
use std::io::{Read, Seek};

use tracing::debug;
use zerocopy::byteorder::little_endian::{I64, U16};

use crate::header::TableLocation;
use crate::source::Source;
use crate::{Error, Result};

/// Identifies one of the auxiliary lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Strings,
    Bitmaps,
    Audio,
}

impl TableKind {
    pub(crate) fn offsets_name(self) -> &'static str {
        match self {
            Self::Strings => "string offset table",
            Self::Bitmaps => "bitmap offset table",
            Self::Audio => "audio offset table",
        }
    }

    pub(crate) fn entry_name(self) -> &'static str {
        match self {
            Self::Strings => "string entry",
            Self::Bitmaps => "bitmap entry",
            Self::Audio => "audio entry",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strings => "string",
            Self::Bitmaps => "bitmap",
            Self::Audio => "audio",
        })
    }
}

/// Read the offset array of a table.
pub(crate) fn read_offsets<R: Read + Seek>(
    source: &mut Source<R>,
    kind: TableKind,
    location: TableLocation,
) -> Result<Vec<i64>> {
    let what = kind.offsets_name();
    let span = u64::from(location.count) * std::mem::size_of::<I64>() as u64;

    source.seek_to(what, location.offset, span)?;
    let offsets: Vec<I64> = source.read_records(what, location.count as usize)?;

    Ok(offsets.into_iter().map(I64::get).collect())
}

/// Load every length-prefixed entry of a table, passing each to `decode`
/// along with its id.
fn load_table<R, T, F>(
    source: &mut Source<R>,
    kind: TableKind,
    location: TableLocation,
    mut decode: F,
) -> Result<Vec<T>>
where
    R: Read + Seek,
    F: FnMut(u32, Vec<u8>) -> Result<T>,
{
    let what = kind.entry_name();
    let offsets = read_offsets(source, kind, location)?;
    let mut entries = Vec::with_capacity(offsets.len());

    for (id, offset) in (0u32..).zip(offsets) {
        source.seek_to(what, offset, 2)?;
        let len = source.read_struct::<U16>(what)?.get();
        let bytes = source.read_blob(what, usize::from(len))?;
        entries.push(decode(id, bytes)?);
    }

    debug!(table = %kind, count = entries.len(), "loaded lookup table");
    Ok(entries)
}

/// Load the string table.
///
/// With `lossy` set, invalid UTF-8 is replaced instead of rejected.
pub(crate) fn load_strings<R: Read + Seek>(
    source: &mut Source<R>,
    location: TableLocation,
    lossy: bool,
) -> Result<Vec<String>> {
    load_table(source, TableKind::Strings, location, |id, bytes| {
        if lossy {
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
        String::from_utf8(bytes).map_err(|source| Error::InvalidUtf8 { id, source })
    })
}

/// Load the bitmap table as opaque blobs.
pub(crate) fn load_bitmaps<R: Read + Seek>(
    source: &mut Source<R>,
    location: TableLocation,
) -> Result<Vec<Vec<u8>>> {
    load_table(source, TableKind::Bitmaps, location, |_, bytes| Ok(bytes))
}
