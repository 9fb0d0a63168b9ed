//! Error types for NX parsing and lookups.

use std::io;

use thiserror::Error;

use crate::{NodeType, TableKind};

/// Errors that can occur when loading or querying an NX file.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error other than a short read.
    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] nx_common::Error),

    /// Invalid magic bytes (not an NX file).
    #[error("invalid NX magic: expected {expected:02X?}, got {actual:02X?}")]
    InvalidMagic { expected: [u8; 4], actual: [u8; 4] },

    /// The stream ended before a fixed-size read completed.
    #[error("truncated {what}: unexpected end of file")]
    Truncated { what: &'static str },

    /// A header or offset-table entry held a negative file offset.
    #[error("negative {what} offset: {offset}")]
    NegativeOffset { what: &'static str, offset: i64 },

    /// A block would extend past the end of the file.
    #[error("{what} at offset {offset} ({len} bytes) extends past end of file ({file_len} bytes)")]
    OutOfBounds {
        what: &'static str,
        offset: u64,
        len: u64,
        file_len: u64,
    },

    /// A string-table entry is not valid UTF-8.
    #[error("string {id} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        id: u32,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// A payload or name referenced an id past the end of its table.
    #[error("{table} id {id} out of range (table size: {len})")]
    IdOutOfRange { table: TableKind, id: u32, len: usize },

    /// A node was resolved as a kind its type tag does not carry.
    #[error("node type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: NodeType, actual: NodeType },
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open, seek, or read failures from the I/O layer.
    Io,
    /// The bytes do not form a valid NX file.
    Format,
    /// An id or name could not be resolved against a loaded table.
    Lookup,
}

impl Error {
    /// Convert an I/O error raised while reading `what`.
    ///
    /// Short reads become [`Error::Truncated`]; anything else is kept as-is.
    pub(crate) fn from_io(err: io::Error, what: &'static str) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Self::Truncated { what }
        } else {
            Self::Io(err)
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Common(_)
            | Self::InvalidMagic { .. }
            | Self::Truncated { .. }
            | Self::NegativeOffset { .. }
            | Self::OutOfBounds { .. }
            | Self::InvalidUtf8 { .. } => ErrorKind::Format,
            Self::IdOutOfRange { .. } | Self::TypeMismatch { .. } => ErrorKind::Lookup,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::from_io(err, "stream")
    }
}

/// Result type for NX operations.
pub type Result<T> = std::result::Result<T, Error>;
