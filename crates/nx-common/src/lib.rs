//! Common utilities for NX readers.
//!
//! This crate provides the foundational binary-reading pieces used by
//! `nx-reader`:
//!
//! - [`BinaryReader`] - Zero-copy cursor over a byte slice
//! - [`ReadExt`] - Fixed-layout record reads from any [`std::io::Read`]

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::{BinaryReader, ReadExt};
