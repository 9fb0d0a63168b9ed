//! In-memory NX images for tests.

use zerocopy::byteorder::little_endian::{I64, U32};
use zerocopy::IntoBytes;

use crate::{Node, NodeType, NxHeader};

/// Strings of [`sample`], in id order.
pub const SAMPLE_STRINGS: &[&str] = &["", "a", "b", "c", "name", "pos", "img", "snd", "hello"];

/// The only bitmap blob in [`sample`].
pub const SAMPLE_BITMAP: &[u8] = &[0xDE, 0xAD, 0xBE, 0xEF];

/// The only audio blob in [`sample`].
pub fn sample_audio() -> Vec<u8> {
    (0..=255).collect()
}

/// Assembles NX images laid out as header, nodes, strings, bitmaps, audio.
#[derive(Debug, Default)]
pub struct NxBuilder {
    nodes: Vec<Node>,
    strings: Vec<Vec<u8>>,
    bitmaps: Vec<Vec<u8>>,
    audio: Vec<Vec<u8>>,
}

impl NxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(&mut self, s: &str) -> u32 {
        self.string_bytes(s.as_bytes().to_vec())
    }

    pub fn string_bytes(&mut self, bytes: Vec<u8>) -> u32 {
        self.strings.push(bytes);
        (self.strings.len() - 1) as u32
    }

    pub fn node(&mut self, name_id: u32, child_start: u32, child_count: u16, tag: u16, payload: [u8; 8]) {
        self.nodes
            .push(Node::new(name_id, child_start, child_count, tag, payload));
    }

    pub fn bitmap(&mut self, bytes: Vec<u8>) {
        self.bitmaps.push(bytes);
    }

    pub fn audio(&mut self, bytes: Vec<u8>) {
        self.audio.push(bytes);
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0u8; NxHeader::SIZE];

        let node_offset = out.len();
        for node in &self.nodes {
            out.extend_from_slice(node.as_bytes());
        }

        let string_offset = write_table(&mut out, &self.strings, true);
        let bitmap_offset = write_table(&mut out, &self.bitmaps, true);
        let audio_offset = write_table(&mut out, &self.audio, false);

        let header = NxHeader {
            magic: *NxHeader::MAGIC,
            node_count: U32::new(self.nodes.len() as u32),
            node_offset: I64::new(node_offset as i64),
            string_count: U32::new(self.strings.len() as u32),
            string_offset: I64::new(string_offset as i64),
            bitmap_count: U32::new(self.bitmaps.len() as u32),
            bitmap_offset: I64::new(bitmap_offset as i64),
            audio_count: U32::new(self.audio.len() as u32),
            audio_offset: I64::new(audio_offset as i64),
        };
        out[..NxHeader::SIZE].copy_from_slice(header.as_bytes());

        out
    }
}

/// Append an offset table followed by its blobs; returns the table offset.
fn write_table(out: &mut Vec<u8>, blobs: &[Vec<u8>], length_prefixed: bool) -> usize {
    let table = out.len();
    out.resize(table + blobs.len() * 8, 0);

    for (i, blob) in blobs.iter().enumerate() {
        let offset = out.len() as i64;
        out[table + i * 8..table + i * 8 + 8].copy_from_slice(&offset.to_le_bytes());

        if length_prefixed {
            out.extend_from_slice(&(blob.len() as u16).to_le_bytes());
        }
        out.extend_from_slice(blob);
    }

    table
}

/// A small file exercising every node type.
///
/// ```text
/// root
/// ├── a      integer -7
/// ├── b
/// │   ├── name   string "hello"
/// │   ├── pos    vector (3, -4)
/// │   ├── img    bitmap 0, (10, 20)
/// │   └── snd    audio 0, 256 bytes
/// ├── c      float 1.5
/// └── b      integer 99
/// ```
pub fn sample() -> Vec<u8> {
    let mut builder = NxBuilder::new();
    for s in SAMPLE_STRINGS {
        builder.string(s);
    }

    builder.node(0, 1, 4, NodeType::None.tag(), [0; 8]);
    builder.node(1, 0, 0, NodeType::Integer.tag(), (-7i64).to_le_bytes());
    builder.node(2, 5, 4, NodeType::None.tag(), [0; 8]);
    builder.node(3, 0, 0, NodeType::Float.tag(), 1.5f64.to_le_bytes());
    builder.node(2, 0, 0, NodeType::Integer.tag(), 99i64.to_le_bytes());
    builder.node(4, 0, 0, NodeType::String.tag(), [8, 0, 0, 0, 0, 0, 0, 0]);
    builder.node(5, 0, 0, NodeType::Vector.tag(), [3, 0, 0, 0, 0xFC, 0xFF, 0xFF, 0xFF]);
    builder.node(6, 0, 0, NodeType::Bitmap.tag(), [0, 0, 0, 0, 10, 0, 20, 0]);
    // Audio length is read from payload bytes 3 and 4: 0x0100.
    builder.node(7, 0, 0, NodeType::Audio.tag(), [0, 0, 0, 0, 1, 0, 0, 0]);

    builder.bitmap(SAMPLE_BITMAP.to_vec());
    builder.audio(sample_audio());

    builder.build()
}
