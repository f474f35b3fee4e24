use crate::common::{Key, MinirelError, RecordId, Result};

use super::btree::BTreeIndex;
use super::node::NodeId;

/// Forward scan over every entry of a tree in ascending key order.
///
/// The cursor walks the leaf chain and borrows the tree for its lifetime, so
/// the tree cannot change underneath an open scan.
pub struct TreeScan<'a> {
    tree: &'a BTreeIndex,
    pos: Option<(NodeId, usize)>,
}

impl<'a> TreeScan<'a> {
    pub(crate) fn new(tree: &'a BTreeIndex) -> Self {
        Self {
            tree,
            pos: Some((tree.leftmost_leaf(), 0)),
        }
    }

    /// Returns the next record id, or `NoMoreEntries` once the scan has
    /// walked past the greatest key.
    pub fn next_entry(&mut self) -> Result<RecordId> {
        self.advance()
            .map(|(_, rid)| rid)
            .ok_or(MinirelError::NoMoreEntries)
    }

    fn advance(&mut self) -> Option<(Key, RecordId)> {
        while let Some((leaf_id, idx)) = self.pos {
            let leaf = self.tree.node(leaf_id);
            if idx < leaf.keys.len() {
                self.pos = Some((leaf_id, idx + 1));
                return Some((leaf.keys[idx], leaf.rids[idx]));
            }
            self.pos = leaf.next_leaf.map(|next| (next, 0));
        }
        None
    }
}

impl Iterator for TreeScan<'_> {
    type Item = (Key, RecordId);

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
