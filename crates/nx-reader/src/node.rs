//! NX node record and the node-array loader.

use std::fmt;
use std::io::{Read, Seek};
use std::ops::Range;

use nx_common::BinaryReader;
use tracing::{debug, warn};
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::decode::{self, Payload};
use crate::header::TableLocation;
use crate::source::Source;
use crate::{Error, Result, TableKind};

/// Size of one on-disk node record.
pub const NODE_SIZE: usize = 20;

/// A node in the NX tree.
///
/// Nodes are stored in a flat array and reference their children as a
/// contiguous index range into that same array. The in-memory layout matches
/// the on-disk record byte for byte, which lets the loader reinterpret the
/// node block directly.
#[derive(Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct Node {
    name_id: U32,
    child_start: U32,
    child_count: U16,
    type_tag: U16,
    payload: Payload,
}

const _: () = assert!(std::mem::size_of::<Node>() == NODE_SIZE);
const _: () = assert!(std::mem::align_of::<Node>() == 1);

/// The known node payload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// No payload.
    None,
    /// Signed 64-bit integer.
    Integer,
    /// 64-bit float.
    Float,
    /// Reference into the string table.
    String,
    /// Pair of signed 32-bit coordinates.
    Vector,
    /// Reference into the bitmap table.
    Bitmap,
    /// Reference into the audio table.
    Audio,
    /// A tag this reader does not interpret.
    Unknown(u16),
}

impl NodeType {
    /// Map a raw type tag.
    pub const fn from_tag(tag: u16) -> Self {
        match tag {
            0 => Self::None,
            1 => Self::Integer,
            2 => Self::Float,
            3 => Self::String,
            4 => Self::Vector,
            5 => Self::Bitmap,
            6 => Self::Audio,
            other => Self::Unknown(other),
        }
    }

    /// The raw type tag.
    pub const fn tag(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Integer => 1,
            Self::Float => 2,
            Self::String => 3,
            Self::Vector => 4,
            Self::Bitmap => 5,
            Self::Audio => 6,
            Self::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::String => f.write_str("string"),
            Self::Vector => f.write_str("vector"),
            Self::Bitmap => f.write_str("bitmap"),
            Self::Audio => f.write_str("audio"),
            Self::Unknown(tag) => write!(f, "unknown({tag})"),
        }
    }
}

/// A resolved bitmap reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap<'a> {
    /// Bitmap blob.
    pub data: &'a [u8],
    /// First 16-bit coordinate stored after the id.
    pub x: u16,
    /// Second 16-bit coordinate stored after the id.
    pub y: u16,
}

impl Node {
    /// Create a node from its field values.
    pub fn new(name_id: u32, child_start: u32, child_count: u16, type_tag: u16, payload: Payload) -> Self {
        Self {
            name_id: U32::new(name_id),
            child_start: U32::new(child_start),
            child_count: U16::new(child_count),
            type_tag: U16::new(type_tag),
            payload,
        }
    }

    /// Decode a node from one on-disk record, field by field.
    pub fn decode(record: &[u8; NODE_SIZE]) -> nx_common::Result<Self> {
        let mut reader = BinaryReader::new(record);
        let name_id = reader.read_u32()?;
        let child_start = reader.read_u32()?;
        let child_count = reader.read_u16()?;
        let type_tag = reader.read_u16()?;
        let payload = reader.read_array::<8>()?;
        Ok(Self::new(name_id, child_start, child_count, type_tag, payload))
    }

    /// String-table id of this node's name.
    #[inline]
    pub fn name_id(&self) -> u32 {
        self.name_id.get()
    }

    /// Index of the first child in the node array.
    #[inline]
    pub fn child_start(&self) -> u32 {
        self.child_start.get()
    }

    /// Number of children.
    #[inline]
    pub fn child_count(&self) -> u16 {
        self.child_count.get()
    }

    /// Raw type tag.
    #[inline]
    pub fn type_tag(&self) -> u16 {
        self.type_tag.get()
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        NodeType::from_tag(self.type_tag())
    }

    /// Raw 8-byte payload.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Children as an index range into the node array.
    ///
    /// The range is not clamped; it may run past the array in a corrupt file.
    #[inline]
    pub fn children(&self) -> Range<usize> {
        let start = self.child_start() as usize;
        start..start.saturating_add(self.child_count() as usize)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.child_count() == 0
    }

    fn expect_type(&self, expected: NodeType) -> Result<()> {
        let actual = self.node_type();
        if actual != expected {
            return Err(Error::TypeMismatch { expected, actual });
        }
        Ok(())
    }

    /// Resolve a bitmap reference.
    ///
    /// The low 4 payload bytes hold the bitmap id; the high 4 bytes hold two
    /// 16-bit coordinates.
    pub fn bitmap<'a, B: AsRef<[u8]>>(&self, bitmaps: &'a [B]) -> Result<Bitmap<'a>> {
        self.expect_type(NodeType::Bitmap)?;

        let id = decode::to_u32(&self.payload);
        let data = bitmaps
            .get(id as usize)
            .ok_or(Error::IdOutOfRange {
                table: TableKind::Bitmaps,
                id,
                len: bitmaps.len(),
            })?
            .as_ref();

        Ok(Bitmap {
            data,
            x: u16::from_le_bytes([self.payload[4], self.payload[5]]),
            y: u16::from_le_bytes([self.payload[6], self.payload[7]]),
        })
    }

    /// Resolve an audio reference.
    pub fn audio<'a, B: AsRef<[u8]>>(&self, audio: &'a [B]) -> Result<&'a [u8]> {
        self.expect_type(NodeType::Audio)?;

        let id = decode::to_u32(&self.payload);
        audio
            .get(id as usize)
            .map(AsRef::as_ref)
            .ok_or(Error::IdOutOfRange {
                table: TableKind::Audio,
                id,
                len: audio.len(),
            })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name_id", &self.name_id())
            .field("child_start", &self.child_start())
            .field("child_count", &self.child_count())
            .field("node_type", &self.node_type())
            .field("payload", &self.payload)
            .finish()
    }
}

/// How the node block is decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeStrategy {
    /// Read the block in one pass and reinterpret it as nodes, falling back
    /// to [`NodeStrategy::FieldByField`] if the result does not line up.
    #[default]
    Bulk,
    /// Decode each record's fields individually.
    FieldByField,
}

/// Load the node array described by `location`.
pub(crate) fn load_nodes<R: Read + Seek>(
    source: &mut Source<R>,
    location: TableLocation,
    strategy: NodeStrategy,
) -> Result<Vec<Node>> {
    let count = location.count as usize;
    let span = u64::from(location.count) * NODE_SIZE as u64;

    source.seek_to("node block", location.offset, span)?;

    if strategy == NodeStrategy::Bulk {
        let block = source.read_blob("node block", count * NODE_SIZE)?;

        match <[Node]>::ref_from_bytes(&block) {
            Ok(nodes) if nodes.len() == count => {
                debug!(count, "loaded node block");
                return Ok(nodes.to_vec());
            }
            Ok(nodes) => warn!(
                expected = count,
                actual = nodes.len(),
                "node block length mismatch, decoding records field by field"
            ),
            Err(_) => warn!(
                bytes = block.len(),
                "node block cast failed, decoding records field by field"
            ),
        }

        source.seek_to("node block", location.offset, span)?;
    }

    let nodes = read_records(source, count)?;
    debug!(count, "decoded node records");
    Ok(nodes)
}

fn read_records<R: Read + Seek>(source: &mut Source<R>, count: usize) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(count);
    let mut record = [0u8; NODE_SIZE];

    for _ in 0..count {
        source.read_exact("node record", &mut record)?;
        nodes.push(Node::decode(&record)?);
    }

    Ok(nodes)
}
