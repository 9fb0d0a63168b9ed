//! Path search over the flat node array.
//!
//! Paths are `/`-separated child names resolved from the root (node 0). A
//! single leading `/` is ignored, and a path with an empty segment never
//! resolves. Each segment scans the current node's child range in order and
//! takes the first child whose name matches.

use crate::Node;

/// Resolve `path` to an index into `nodes`.
///
/// Returns `None` when a segment is empty or has no matching child, or when
/// a child range runs past the node array.
pub fn resolve<S: AsRef<str>>(path: &str, nodes: &[Node], strings: &[S]) -> Option<usize> {
    let path = path.strip_prefix('/').unwrap_or(path);

    let mut cursor = 0usize;
    for segment in path.split('/') {
        if segment.is_empty() {
            return None;
        }
        let node = nodes.get(cursor)?;
        cursor = find_child(node, segment, nodes, strings)?;
    }

    Some(cursor)
}

/// Index of the first child of `parent` named `name`.
pub fn find_child<S: AsRef<str>>(
    parent: &Node,
    name: &str,
    nodes: &[Node],
    strings: &[S],
) -> Option<usize> {
    for index in parent.children() {
        let child = nodes.get(index)?;
        let matches = strings
            .get(child.name_id() as usize)
            .is_some_and(|child_name| child_name.as_ref() == name);
        if matches {
            return Some(index);
        }
    }
    None
}

/// Resolve `path` and hand the matched node to `visitor`.
///
/// The visitor runs at most once, and only on success. Returns whether the
/// path resolved.
pub fn search<S, F>(path: &str, nodes: &[Node], strings: &[S], visitor: F) -> bool
where
    S: AsRef<str>,
    F: FnOnce(&Node),
{
    match resolve(path, nodes, strings).and_then(|index| nodes.get(index)) {
        Some(node) => {
            visitor(node);
            true
        }
        None => false,
    }
}
