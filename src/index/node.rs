use crate::common::{Key, RecordId};

/// Index of a node within the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

/// One B+Tree node. Leaves carry a `RecordId` per key; internal nodes carry
/// `keys.len() + 1` child ids. The parent link is a plain back-reference
/// into the arena and never owns anything.
pub(crate) struct Node {
    pub keys: Vec<Key>,
    /// Leaf payloads, parallel to `keys` (empty for internal nodes)
    pub rids: Vec<RecordId>,
    /// Child node ids (empty for leaves)
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Leaf chain used by scans (leaves only)
    pub next_leaf: Option<NodeId>,
    pub is_leaf: bool,
}

impl Node {
    fn new(is_leaf: bool) -> Self {
        Self {
            keys: Vec::new(),
            rids: Vec::new(),
            children: Vec::new(),
            parent: None,
            next_leaf: None,
            is_leaf,
        }
    }
}

/// Arena holding the live node graph. Node ids stay stable for the lifetime
/// of the tree handle; freed slots are recycled through a free list.
pub(crate) struct NodeArena {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, is_leaf: bool) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Node::new(is_leaf);
                id
            }
            None => {
                self.nodes.push(Node::new(is_leaf));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Returns a node's slot to the free list. The caller is responsible
    /// for having unlinked it from the graph first.
    pub fn free(&mut self, id: NodeId) {
        self.nodes[id.0] = Node::new(true);
        self.free.push(id);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}
