//! Reader for NX container files.
//!
//! An NX file (magic `PKG4`) packs a tree of named nodes plus string, bitmap,
//! and audio tables into one flat, little-endian file. The tree is stored as
//! a single array of fixed 20-byte records; each node names its children as
//! a contiguous index range into that array.
//!
//! # Layout
//!
//! ```text
//! [0x00] Header (52 bytes)
//!        magic "PKG4", node count/offset, then count/offset for the
//!        string, bitmap, and audio offset tables
//! [...]  Node records (20 bytes each)
//!        name id u32, child start u32, child count u16, type u16, payload [8]
//! [...]  Offset tables: one absolute i64 file offset per entry
//! [...]  Strings and bitmaps: u16 length prefix + bytes
//!        Audio: raw bytes, length taken from the referencing node
//! ```
//!
//! # Example
//!
//! ```no_run
//! use nx_reader::{NodeValue, NxFile};
//!
//! let nx = NxFile::open("String.nx")?;
//! if let Some(node) = nx.find("Eqp.img/Eqp/Cap/1002140/name") {
//!     if let NodeValue::String(name) = nx.value(node)? {
//!         println!("{name}");
//!     }
//! }
//! # Ok::<(), nx_reader::Error>(())
//! ```

mod audio;
mod error;
mod file;
mod header;
mod node;
mod source;
mod table;
mod value;

pub mod decode;
pub mod search;

#[cfg(test)]
mod fixture;

pub use audio::audio_length;
pub use decode::{Payload, Vector};
pub use error::{Error, ErrorKind, Result};
pub use file::{LoadOptions, NxFile};
pub use header::{NxHeader, TableLocation};
pub use node::{Bitmap, Node, NodeStrategy, NodeType, NODE_SIZE};
pub use table::TableKind;
pub use value::NodeValue;
