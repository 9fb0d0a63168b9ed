//! Parsed NX file.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::debug;

use crate::audio::load_audio;
use crate::decode;
use crate::node::{load_nodes, Bitmap, Node, NodeStrategy, NodeType};
use crate::search;
use crate::source::Source;
use crate::table::{load_bitmaps, load_strings, TableKind};
use crate::value::NodeValue;
use crate::{Error, NxHeader, Result};

/// Options controlling how an NX file is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// How the node block is decoded.
    pub node_strategy: NodeStrategy,
    /// Replace invalid UTF-8 in the string table instead of failing.
    pub lossy_strings: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the node decoding strategy.
    pub fn node_strategy(mut self, strategy: NodeStrategy) -> Self {
        self.node_strategy = strategy;
        self
    }

    /// Accept strings that are not valid UTF-8.
    pub fn lossy_strings(mut self, lossy: bool) -> Self {
        self.lossy_strings = lossy;
        self
    }
}

/// A fully loaded NX file.
///
/// Holds the header, the flat node array, and the three lookup tables.
/// Nothing is mutated after loading, so a `NxFile` can be shared freely
/// between threads.
#[derive(Debug, Clone)]
pub struct NxFile {
    header: NxHeader,
    nodes: Vec<Node>,
    strings: Vec<String>,
    bitmaps: Vec<Vec<u8>>,
    audio: Vec<Vec<u8>>,
}

impl NxFile {
    /// Open and load an NX file from disk.
    ///
    /// The file handle is closed before this returns, on success or error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nx_reader::NxFile;
    ///
    /// let nx = NxFile::open("Data.nx")?;
    /// if let Some(node) = nx.find("Item/Consume/0200.img") {
    ///     println!("{} children", node.child_count());
    /// }
    /// # Ok::<(), nx_reader::Error>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, LoadOptions::default())
    }

    /// Open and load an NX file with explicit options.
    pub fn open_with<P: AsRef<Path>>(path: P, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening NX file");

        let file = File::open(path).map_err(Error::Io)?;
        Self::from_reader_with(BufReader::new(file), options)
    }

    /// Load an NX file from any seekable stream.
    ///
    /// Offsets in the file are absolute, measured from the start of the stream.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_reader_with(reader, LoadOptions::default())
    }

    /// Load an NX file from any seekable stream with explicit options.
    pub fn from_reader_with<R: Read + Seek>(reader: R, options: LoadOptions) -> Result<Self> {
        let mut source = Source::new(reader)?;

        let header = NxHeader::read(&mut source)?;
        let nodes = load_nodes(&mut source, header.nodes(), options.node_strategy)?;
        let strings = load_strings(&mut source, header.strings(), options.lossy_strings)?;
        let bitmaps = load_bitmaps(&mut source, header.bitmaps())?;
        let audio = load_audio(&mut source, header.audio(), &nodes)?;

        debug!(
            file_len = source.len(),
            nodes = nodes.len(),
            strings = strings.len(),
            bitmaps = bitmaps.len(),
            audio = audio.len(),
            "loaded NX file"
        );

        Ok(Self {
            header,
            nodes,
            strings,
            bitmaps,
            audio,
        })
    }

    /// Load an NX file from an in-memory buffer.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::from_reader(std::io::Cursor::new(data))
    }

    /// The file header.
    #[inline]
    pub fn header(&self) -> &NxHeader {
        &self.header
    }

    /// All nodes, in file order.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    #[inline]
    pub fn bitmaps(&self) -> &[Vec<u8>] {
        &self.bitmaps
    }

    #[inline]
    pub fn audio(&self) -> &[Vec<u8>] {
        &self.audio
    }

    /// The root node, if the file has any nodes.
    #[inline]
    pub fn root(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Get a node by index.
    #[inline]
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Get a string by id.
    pub fn string(&self, id: u32) -> Result<&str> {
        self.strings
            .get(id as usize)
            .map(String::as_str)
            .ok_or(Error::IdOutOfRange {
                table: TableKind::Strings,
                id,
                len: self.strings.len(),
            })
    }

    /// Name of a node.
    pub fn name(&self, node: &Node) -> Result<&str> {
        self.string(node.name_id())
    }

    /// Iterate over the children of a node.
    ///
    /// The child range is clamped to the node array.
    pub fn children(&self, node: &Node) -> impl Iterator<Item = &Node> {
        let range = node.children();
        let end = range.end.min(self.nodes.len());
        let start = range.start.min(end);
        self.nodes[start..end].iter()
    }

    /// Find a node by `/`-separated path from the root.
    pub fn find(&self, path: &str) -> Option<&Node> {
        search::resolve(path, &self.nodes, &self.strings).and_then(|index| self.nodes.get(index))
    }

    /// Find a node by path and pass it to `visitor`.
    ///
    /// Returns whether the path resolved; the visitor is not called otherwise.
    pub fn search<F: FnOnce(&Node)>(&self, path: &str, visitor: F) -> bool {
        search::search(path, &self.nodes, &self.strings, visitor)
    }

    /// Resolve a bitmap node against this file's bitmap table.
    pub fn resolve_bitmap(&self, node: &Node) -> Result<Bitmap<'_>> {
        node.bitmap(&self.bitmaps)
    }

    /// Resolve an audio node against this file's audio table.
    pub fn resolve_audio(&self, node: &Node) -> Result<&[u8]> {
        node.audio(&self.audio)
    }

    /// Decode a node's payload according to its type tag.
    pub fn value(&self, node: &Node) -> Result<NodeValue<'_>> {
        let payload = node.payload();
        Ok(match node.node_type() {
            NodeType::None => NodeValue::Empty,
            NodeType::Integer => NodeValue::Integer(decode::to_i64(payload)),
            NodeType::Float => NodeValue::Float(decode::to_f64(payload)),
            NodeType::String => NodeValue::String(self.string(decode::to_u32(payload))?),
            NodeType::Vector => NodeValue::Vector(decode::to_vector(payload)),
            NodeType::Bitmap => NodeValue::Bitmap(self.resolve_bitmap(node)?),
            NodeType::Audio => NodeValue::Audio(self.resolve_audio(node)?),
            NodeType::Unknown(tag) => NodeValue::Unknown {
                tag,
                payload: *payload,
            },
        })
    }

    /// Take ownership of the node array and the three lookup tables.
    pub fn into_parts(self) -> (Vec<Node>, Vec<String>, Vec<Vec<u8>>, Vec<Vec<u8>>) {
        (self.nodes, self.strings, self.bitmaps, self.audio)
    }
}
