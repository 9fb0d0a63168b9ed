//! Audio table loader.
//!
//! Unlike strings and bitmaps, audio blobs carry no length prefix. The
//! length lives in the payload of each audio node that references the blob,
//! so loading takes two passes: the offset array first, then a scan over the
//! node array.

use std::io::{Read, Seek};

use tracing::{debug, trace};

use crate::decode::{self, Payload};
use crate::header::TableLocation;
use crate::source::Source;
use crate::table::{read_offsets, TableKind};
use crate::{Error, Node, NodeType, Result};

/// Blob length embedded in an audio node's payload.
///
/// Taken from payload bytes 3..8, of which only the low two (bytes 3 and 4)
/// are significant.
#[inline]
pub fn audio_length(payload: &Payload) -> u16 {
    u16::from_le_bytes([payload[3], payload[4]])
}

/// Load the audio table, deriving each blob's length from the nodes that
/// reference it.
///
/// Slots never referenced by a node stay empty. When several nodes reference
/// the same id, the last one in array order decides the blob.
pub(crate) fn load_audio<R: Read + Seek>(
    source: &mut Source<R>,
    location: TableLocation,
    nodes: &[Node],
) -> Result<Vec<Vec<u8>>> {
    if location.count == 0 {
        return Ok(Vec::new());
    }

    let offsets = read_offsets(source, TableKind::Audio, location)?;
    let mut blobs = vec![Vec::new(); offsets.len()];
    let what = TableKind::Audio.entry_name();

    for node in nodes.iter().filter(|n| n.node_type() == NodeType::Audio) {
        let id = decode::to_u32(node.payload());
        let (Some(&offset), Some(slot)) = (offsets.get(id as usize), blobs.get_mut(id as usize))
        else {
            return Err(Error::IdOutOfRange {
                table: TableKind::Audio,
                id,
                len: offsets.len(),
            });
        };

        let len = audio_length(node.payload());
        trace!(id, offset, len, "reading audio blob");

        source.seek_to(what, offset, u64::from(len))?;
        *slot = source.read_blob(what, usize::from(len))?;
    }

    debug!(count = blobs.len(), "loaded audio table");
    Ok(blobs)
}
