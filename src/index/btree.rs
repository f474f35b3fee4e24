use std::path::Path;

use crate::common::{Key, KeyType, MinirelError, PageId, RecordId, Result, PAGE_SIZE};
use crate::storage::PageFile;

use super::meta::TreeMeta;
use super::node::{Node, NodeArena, NodeId};
use super::scan::TreeScan;

/// B+Tree index over a single scalar key type, mapping keys to record ids.
///
/// The node graph lives in memory as an arena of nodes with parent
/// back-references; the backing page file holds only the metadata block on
/// page 0. Reopening an index therefore starts from an empty root, with the
/// persisted node and entry counts carried along as hints. The tree assumes
/// one caller at a time; every mutating call completes its split or merge
/// propagation before returning.
pub struct BTreeIndex {
    arena: NodeArena,
    root: NodeId,
    order: usize,
    key_type: KeyType,
    node_count: u32,
    entry_count: u32,
    file: PageFile,
}

impl BTreeIndex {
    /// Creates the backing page file for a new index and writes its
    /// metadata block. The tree starts as a single root that is also a
    /// leaf. `order` is the maximum number of keys a node may hold;
    /// orders below 3 are rejected with `InvalidOrder`.
    pub fn create<P: AsRef<Path>>(path: P, key_type: KeyType, order: usize) -> Result<()> {
        if order < 3 {
            return Err(MinirelError::InvalidOrder(order));
        }

        PageFile::create(&path)?;
        let file = PageFile::open(&path)?;

        let meta = TreeMeta {
            order,
            node_count: 1,
            entry_count: 0,
            key_type,
        };
        let mut page = vec![0u8; PAGE_SIZE];
        meta.encode(&mut page);
        file.write_page(PageId::new(0), &page)
    }

    /// Opens an existing index: reads the metadata block and rebuilds a
    /// fresh single-leaf root. Node-level state does not survive a close.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = PageFile::open(path)?;

        let mut page = vec![0u8; PAGE_SIZE];
        file.read_page(PageId::new(0), &mut page)?;
        let meta = TreeMeta::decode(&page)?;

        let mut arena = NodeArena::new();
        let root = arena.alloc(true);

        Ok(Self {
            arena,
            root,
            order: meta.order,
            key_type: meta.key_type,
            node_count: meta.node_count,
            entry_count: meta.entry_count,
            file,
        })
    }

    /// Writes the metadata block back and releases the node graph.
    pub fn close(self) -> Result<()> {
        self.write_meta()
    }

    /// Removes an index's backing file.
    pub fn delete<P: AsRef<Path>>(path: P) -> Result<()> {
        PageFile::destroy(path)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    pub fn num_nodes(&self) -> u32 {
        self.node_count
    }

    pub fn num_entries(&self) -> u32 {
        self.entry_count
    }

    /// Point lookup: returns the record id stored under `key`.
    pub fn find_key(&self, key: Key) -> Result<RecordId> {
        let leaf_id = self.find_leaf(key);
        let leaf = self.arena.node(leaf_id);
        match leaf.keys.binary_search(&key) {
            Ok(pos) => Ok(leaf.rids[pos]),
            Err(_) => Err(MinirelError::KeyNotFound(key)),
        }
    }

    /// Inserts `key` mapping to `rid`. Duplicate keys are rejected and
    /// leave the tree untouched. A full leaf splits at `order / 2`, pushing
    /// the first key of the new right sibling into the parent; parents
    /// split recursively, growing the tree at the root.
    pub fn insert_key(&mut self, key: Key, rid: RecordId) -> Result<()> {
        let leaf_id = self.find_leaf(key);
        if self.arena.node(leaf_id).keys.binary_search(&key).is_ok() {
            return Err(MinirelError::KeyAlreadyExists(key));
        }

        if self.arena.node(leaf_id).keys.len() < self.order {
            let leaf = self.arena.node_mut(leaf_id);
            let pos = leaf.keys.partition_point(|k| *k < key);
            leaf.keys.insert(pos, key);
            leaf.rids.insert(pos, rid);
            self.entry_count += 1;
            return Ok(());
        }

        self.split_leaf_and_insert(leaf_id, key, rid)
    }

    /// Removes `key` from its leaf. A leaf left below minimum occupancy
    /// borrows from a sibling when one can spare a key, otherwise merges
    /// with one; underflow propagates up, and an internal root reduced to a
    /// single child collapses into it.
    pub fn delete_key(&mut self, key: Key) -> Result<()> {
        let leaf_id = self.find_leaf(key);
        let pos = match self.arena.node(leaf_id).keys.binary_search(&key) {
            Ok(pos) => pos,
            Err(_) => return Err(MinirelError::KeyNotFound(key)),
        };

        {
            let leaf = self.arena.node_mut(leaf_id);
            leaf.keys.remove(pos);
            leaf.rids.remove(pos);
        }
        self.entry_count -= 1;

        // A root leaf may hold any number of keys, including zero
        if leaf_id != self.root && self.arena.node(leaf_id).keys.len() < self.min_keys() {
            self.rebalance(leaf_id);
        }
        Ok(())
    }

    /// Opens a forward scan positioned before the smallest key.
    pub fn open_scan(&self) -> TreeScan<'_> {
        TreeScan::new(self)
    }

    /// Renders the tree shape for debugging, one node per line.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    /// Number of levels from the root down to the leaves.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root;
        while !self.arena.node(current).is_leaf {
            current = self.arena.node(current).children[0];
            height += 1;
        }
        height
    }

    /// Structural self-check: sorted keys, child counts, parent links,
    /// key-range partitioning, and uniform leaf depth.
    pub fn is_consistent(&self) -> bool {
        let mut leaf_depth = None;
        self.check_node(self.root, None, None, 0, &mut leaf_depth)
    }

    // --- internals ---

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.arena.node(id)
    }

    pub(crate) fn leftmost_leaf(&self) -> NodeId {
        let mut current = self.root;
        while !self.arena.node(current).is_leaf {
            current = self.arena.node(current).children[0];
        }
        current
    }

    /// Minimum keys a non-root node must hold: ceil((order + 1) / 2) - 1.
    fn min_keys(&self) -> usize {
        (self.order + 2) / 2 - 1
    }

    /// Descends to the leaf owning `key`. At each internal node the child
    /// taken is the one whose range satisfies keys[i-1] <= key < keys[i];
    /// keys equal to a separator live in the right subtree.
    fn find_leaf(&self, key: Key) -> NodeId {
        let mut current = self.root;
        while !self.arena.node(current).is_leaf {
            let node = self.arena.node(current);
            let idx = node.keys.partition_point(|k| *k <= key);
            current = node.children[idx];
        }
        current
    }

    fn split_leaf_and_insert(&mut self, leaf_id: NodeId, key: Key, rid: RecordId) -> Result<()> {
        let mid = self.order / 2;
        let right_id = self.arena.alloc(true);
        self.node_count += 1;

        // Keys at indices > mid move to the new right sibling
        let (mut right_keys, mut right_rids, old_next) = {
            let left = self.arena.node_mut(leaf_id);
            (
                left.keys.split_off(mid + 1),
                left.rids.split_off(mid + 1),
                left.next_leaf,
            )
        };

        // The incoming pair lands in whichever half it sorts into
        let goes_right = match self.arena.node(leaf_id).keys.last() {
            Some(&last) => key > last,
            None => true,
        };
        if goes_right {
            let pos = right_keys.partition_point(|k| *k < key);
            right_keys.insert(pos, key);
            right_rids.insert(pos, rid);
        } else {
            let left = self.arena.node_mut(leaf_id);
            let pos = left.keys.partition_point(|k| *k < key);
            left.keys.insert(pos, key);
            left.rids.insert(pos, rid);
        }

        let separator = right_keys[0];
        {
            let right = self.arena.node_mut(right_id);
            right.keys = right_keys;
            right.rids = right_rids;
            right.next_leaf = old_next;
        }
        self.arena.node_mut(leaf_id).next_leaf = Some(right_id);
        self.entry_count += 1;

        self.insert_into_parent(leaf_id, separator, right_id);
        Ok(())
    }

    /// Links a freshly split-off right sibling into the tree: either by
    /// growing a new root above the old one, or by inserting the separator
    /// into the existing parent (splitting it too when over capacity).
    fn insert_into_parent(&mut self, left_id: NodeId, separator: Key, right_id: NodeId) {
        match self.arena.node(left_id).parent {
            None => {
                let root_id = self.arena.alloc(false);
                self.node_count += 1;
                {
                    let root = self.arena.node_mut(root_id);
                    root.keys.push(separator);
                    root.children.push(left_id);
                    root.children.push(right_id);
                }
                self.arena.node_mut(left_id).parent = Some(root_id);
                self.arena.node_mut(right_id).parent = Some(root_id);
                self.root = root_id;
            }
            Some(parent_id) => {
                {
                    let parent = self.arena.node_mut(parent_id);
                    let pos = parent.keys.partition_point(|k| *k < separator);
                    parent.keys.insert(pos, separator);
                    parent.children.insert(pos + 1, right_id);
                }
                self.arena.node_mut(right_id).parent = Some(parent_id);

                if self.arena.node(parent_id).keys.len() > self.order {
                    self.split_internal(parent_id);
                }
            }
        }
    }

    /// Splits an over-capacity internal node; the middle key moves up.
    fn split_internal(&mut self, node_id: NodeId) {
        let right_id = self.arena.alloc(false);
        self.node_count += 1;

        let (separator, right_keys, right_children) = {
            let node = self.arena.node_mut(node_id);
            let mid = node.keys.len() / 2;
            let right_keys = node.keys.split_off(mid + 1);
            let right_children = node.children.split_off(mid + 1);
            let separator = node.keys.pop().expect("split node holds keys");
            (separator, right_keys, right_children)
        };

        for &child in &right_children {
            self.arena.node_mut(child).parent = Some(right_id);
        }
        {
            let right = self.arena.node_mut(right_id);
            right.keys = right_keys;
            right.children = right_children;
        }

        self.insert_into_parent(node_id, separator, right_id);
    }

    fn rebalance(&mut self, node_id: NodeId) {
        if node_id == self.root {
            // An internal root with no keys collapses into its only child
            let root = self.arena.node(node_id);
            if !root.is_leaf && root.keys.is_empty() {
                let new_root = root.children[0];
                self.arena.node_mut(new_root).parent = None;
                self.arena.free(node_id);
                self.node_count -= 1;
                self.root = new_root;
            }
            return;
        }

        let parent_id = self
            .arena
            .node(node_id)
            .parent
            .expect("non-root node has a parent");
        let child_idx = self
            .arena
            .node(parent_id)
            .children
            .iter()
            .position(|&c| c == node_id)
            .expect("node is linked from its parent");

        let min = self.min_keys();

        if child_idx > 0 {
            let left_id = self.arena.node(parent_id).children[child_idx - 1];
            if self.arena.node(left_id).keys.len() > min {
                self.borrow_from_left(parent_id, child_idx, left_id, node_id);
                return;
            }
        }

        if child_idx + 1 < self.arena.node(parent_id).children.len() {
            let right_id = self.arena.node(parent_id).children[child_idx + 1];
            if self.arena.node(right_id).keys.len() > min {
                self.borrow_from_right(parent_id, child_idx, node_id, right_id);
                return;
            }
        }

        // Neither sibling can spare a key: merge and drop one separator
        if child_idx > 0 {
            let left_id = self.arena.node(parent_id).children[child_idx - 1];
            self.merge(parent_id, child_idx - 1, left_id, node_id);
        } else {
            let right_id = self.arena.node(parent_id).children[child_idx + 1];
            self.merge(parent_id, child_idx, node_id, right_id);
        }

        if parent_id == self.root || self.arena.node(parent_id).keys.len() < min {
            self.rebalance(parent_id);
        }
    }

    /// Shifts the left sibling's greatest entry into `node_id`. For leaves
    /// the parent separator becomes the moved key; for internal nodes the
    /// move rotates through the separator.
    fn borrow_from_left(
        &mut self,
        parent_id: NodeId,
        child_idx: usize,
        left_id: NodeId,
        node_id: NodeId,
    ) {
        if self.arena.node(node_id).is_leaf {
            let (key, rid) = {
                let left = self.arena.node_mut(left_id);
                let key = left.keys.pop().expect("donor sibling has keys");
                let rid = left.rids.pop().expect("donor sibling has rids");
                (key, rid)
            };
            {
                let node = self.arena.node_mut(node_id);
                node.keys.insert(0, key);
                node.rids.insert(0, rid);
            }
            self.arena.node_mut(parent_id).keys[child_idx - 1] = key;
        } else {
            let (key, child) = {
                let left = self.arena.node_mut(left_id);
                let key = left.keys.pop().expect("donor sibling has keys");
                let child = left.children.pop().expect("donor sibling has children");
                (key, child)
            };
            let separator =
                std::mem::replace(&mut self.arena.node_mut(parent_id).keys[child_idx - 1], key);
            {
                let node = self.arena.node_mut(node_id);
                node.keys.insert(0, separator);
                node.children.insert(0, child);
            }
            self.arena.node_mut(child).parent = Some(node_id);
        }
    }

    /// Mirror of `borrow_from_left` for the right sibling's least entry.
    fn borrow_from_right(
        &mut self,
        parent_id: NodeId,
        child_idx: usize,
        node_id: NodeId,
        right_id: NodeId,
    ) {
        if self.arena.node(node_id).is_leaf {
            let (key, rid) = {
                let right = self.arena.node_mut(right_id);
                (right.keys.remove(0), right.rids.remove(0))
            };
            {
                let node = self.arena.node_mut(node_id);
                node.keys.push(key);
                node.rids.push(rid);
            }
            let new_separator = self.arena.node(right_id).keys[0];
            self.arena.node_mut(parent_id).keys[child_idx] = new_separator;
        } else {
            let (key, child) = {
                let right = self.arena.node_mut(right_id);
                (right.keys.remove(0), right.children.remove(0))
            };
            let separator =
                std::mem::replace(&mut self.arena.node_mut(parent_id).keys[child_idx], key);
            {
                let node = self.arena.node_mut(node_id);
                node.keys.push(separator);
                node.children.push(child);
            }
            self.arena.node_mut(child).parent = Some(node_id);
        }
    }

    /// Merges `right_id` into `left_id` and removes the separator at
    /// `sep_idx` from the parent. Leaf merges discard the separator and
    /// splice the leaf chain; internal merges pull it down between the two
    /// key runs.
    fn merge(&mut self, parent_id: NodeId, sep_idx: usize, left_id: NodeId, right_id: NodeId) {
        let separator = {
            let parent = self.arena.node_mut(parent_id);
            let separator = parent.keys.remove(sep_idx);
            parent.children.remove(sep_idx + 1);
            separator
        };

        let (mut right_keys, mut right_rids, mut right_children, right_next) = {
            let right = self.arena.node_mut(right_id);
            (
                std::mem::take(&mut right.keys),
                std::mem::take(&mut right.rids),
                std::mem::take(&mut right.children),
                right.next_leaf,
            )
        };

        if self.arena.node(left_id).is_leaf {
            let left = self.arena.node_mut(left_id);
            left.keys.append(&mut right_keys);
            left.rids.append(&mut right_rids);
            left.next_leaf = right_next;
        } else {
            for &child in &right_children {
                self.arena.node_mut(child).parent = Some(left_id);
            }
            let left = self.arena.node_mut(left_id);
            left.keys.push(separator);
            left.keys.append(&mut right_keys);
            left.children.append(&mut right_children);
        }

        self.arena.free(right_id);
        self.node_count -= 1;
    }

    fn write_meta(&self) -> Result<()> {
        let meta = TreeMeta {
            order: self.order,
            node_count: self.node_count,
            entry_count: self.entry_count,
            key_type: self.key_type,
        };
        let mut page = vec![0u8; PAGE_SIZE];
        meta.encode(&mut page);
        self.file.write_page(PageId::new(0), &page)
    }

    fn dump_node(&self, id: NodeId, level: usize, out: &mut String) {
        use std::fmt::Write;

        let node = self.arena.node(id);
        let label = if id == self.root {
            "[Root]"
        } else if node.is_leaf {
            "[Leaf]"
        } else {
            "[Internal]"
        };
        let keys: Vec<String> = node.keys.iter().map(|k| k.to_string()).collect();
        let _ = writeln!(out, "{}{} ({})", "  ".repeat(level), label, keys.join(", "));

        for &child in &node.children {
            self.dump_node(child, level + 1, out);
        }
    }

    fn check_node(
        &self,
        id: NodeId,
        lo: Option<Key>,
        hi: Option<Key>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> bool {
        let node = self.arena.node(id);

        if !node.keys.windows(2).all(|w| w[0] < w[1]) {
            return false;
        }
        // Subtree range is [lo, hi)
        if let Some(lo) = lo {
            if node.keys.first().is_some_and(|&k| k < lo) {
                return false;
            }
        }
        if let Some(hi) = hi {
            if node.keys.last().is_some_and(|&k| k >= hi) {
                return false;
            }
        }

        if node.is_leaf {
            if node.rids.len() != node.keys.len() || !node.children.is_empty() {
                return false;
            }
            return match *leaf_depth {
                None => {
                    *leaf_depth = Some(depth);
                    true
                }
                Some(d) => d == depth,
            };
        }

        if node.children.len() != node.keys.len() + 1 {
            return false;
        }
        for (i, &child) in node.children.iter().enumerate() {
            if self.arena.node(child).parent != Some(id) {
                return false;
            }
            let child_lo = if i == 0 { lo } else { Some(node.keys[i - 1]) };
            let child_hi = if i == node.keys.len() {
                hi
            } else {
                Some(node.keys[i])
            };
            if !self.check_node(child, child_lo, child_hi, depth + 1, leaf_depth) {
                return false;
            }
        }
        true
    }
}

impl Drop for BTreeIndex {
    fn drop(&mut self) {
        // Best effort: the metadata block still reaches disk
        let _ = self.write_meta();
    }
}
