//! Read-only traversals over a loaded trie.

use super::node::{Node, NodeError, PATH_SEPARATOR};

/// Whether any fork below `node` has a prefix containing the path separator.
///
/// Only loaded forks are visited; the node's own incoming prefix is not
///  part of the scan.
pub fn check_for_separator(node: &Node) -> bool {
    node.forks()
        .into_iter()
        .flat_map(|forks| forks.values())
        .any(|fork| fork.prefix().contains(&PATH_SEPARATOR) || check_for_separator(fork.node()))
}

/// Compare two tries structurally: type, metadata, entry and forks (by key
///  and prefix), recursively.
///
/// An absent entry and an all-zero entry are the same thing once a node has
///  been through the codec, so they compare equal. Likewise for no forks and
///  an empty fork mapping.
pub fn equal_nodes(a: &Node, b: &Node) -> Result<(), NodeError> {
    equal_nodes_at(a, b, &mut Vec::new())
}

fn equal_nodes_at(a: &Node, b: &Node, prefix: &mut Vec<u8>) -> Result<(), NodeError> {
    let mismatch = |prefix: &[u8], reason: String| NodeError::Mismatch {
        prefix: String::from_utf8_lossy(prefix).into_owned(),
        reason,
    };

    let (a_type, b_type) = (a.get_type().ok(), b.get_type().ok());
    if a_type != b_type {
        return Err(mismatch(
            prefix,
            format!("type {:?} != {:?}", a_type, b_type),
        ));
    }

    match (a.metadata(), b.metadata()) {
        (Some(a_meta), Some(b_meta)) if a_meta != b_meta => {
            return Err(mismatch(
                prefix,
                format!("metadata {:?} != {:?}", a_meta, b_meta),
            ));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(mismatch(
                prefix,
                "metadata defined on only one side".to_string(),
            ));
        }
        _ => {}
    }

    let a_entry = a.entry().filter(|entry| !entry.is_zero());
    let b_entry = b.entry().filter(|entry| !entry.is_zero());
    if a_entry != b_entry {
        return Err(mismatch(
            prefix,
            format!("entry {:?} != {:?}", a_entry, b_entry),
        ));
    }

    // a loaded leaf has an empty mapping where a fresh one has none
    let a_forks = a.forks().filter(|forks| !forks.is_empty());
    let b_forks = b.forks().filter(|forks| !forks.is_empty());
    let (a_forks, b_forks) = match (a_forks, b_forks) {
        (None, None) => return Ok(()),
        (Some(a_forks), Some(b_forks)) if a_forks.len() == b_forks.len() => (a_forks, b_forks),
        (a_forks, b_forks) => {
            return Err(mismatch(
                prefix,
                format!(
                    "fork counts differ: {} != {}",
                    a_forks.map_or(0, |forks| forks.len()),
                    b_forks.map_or(0, |forks| forks.len())
                ),
            ))
        }
    };

    for (key, a_fork) in a_forks {
        let b_fork = b_forks.get(key).ok_or_else(|| {
            mismatch(prefix, format!("fork '{}' missing", char::from(*key)))
        })?;
        if a_fork.prefix() != b_fork.prefix() {
            return Err(mismatch(
                prefix,
                format!(
                    "fork prefix '{}' != '{}'",
                    String::from_utf8_lossy(a_fork.prefix()),
                    String::from_utf8_lossy(b_fork.prefix())
                ),
            ));
        }

        let depth = prefix.len();
        prefix.extend_from_slice(a_fork.prefix());
        equal_nodes_at(a_fork.node(), b_fork.node(), prefix)?;
        prefix.truncate(depth);
    }
    Ok(())
}

/// Every value node below `node` with its full path, depth first in
///  ascending key order. Unloaded subtrees are skipped.
pub fn list_entries(node: &Node) -> Vec<(Vec<u8>, &Node)> {
    let mut entries = Vec::new();
    collect_entries(node, &mut Vec::new(), &mut entries);
    entries
}

fn collect_entries<'a>(node: &'a Node, path: &mut Vec<u8>, out: &mut Vec<(Vec<u8>, &'a Node)>) {
    for fork in node.forks().into_iter().flat_map(|forks| forks.values()) {
        let depth = path.len();
        path.extend_from_slice(fork.prefix());
        if fork.node().is_value_type().unwrap_or(false) {
            out.push((path.clone(), fork.node()));
        }
        collect_entries(fork.node(), path, out);
        path.truncate(depth);
    }
}
