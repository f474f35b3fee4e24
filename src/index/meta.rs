use bytes::{Buf, BufMut};

use crate::common::{KeyType, MinirelError, Result, PAGE_SIZE};

/// Marker written in the root-location slot of the metadata block. Nodes
/// themselves are not paged out, so the slot never names a real page.
const ROOT_UNPAGED: u32 = u32::MAX;

/// Tree metadata persisted to page 0 of the index file.
///
/// Field order on disk: order, node count, entry count, key type tag, root
/// marker; all little-endian u32. This block is the only part of the tree
/// that survives a close; the node graph itself lives in memory for the
/// lifetime of an open handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TreeMeta {
    pub order: usize,
    pub node_count: u32,
    pub entry_count: u32,
    pub key_type: KeyType,
}

impl TreeMeta {
    pub fn encode(&self, page: &mut [u8]) {
        assert_eq!(page.len(), PAGE_SIZE);
        let mut buf = &mut page[..];
        buf.put_u32_le(self.order as u32);
        buf.put_u32_le(self.node_count);
        buf.put_u32_le(self.entry_count);
        buf.put_u32_le(self.key_type.as_tag());
        buf.put_u32_le(ROOT_UNPAGED);
    }

    pub fn decode(page: &[u8]) -> Result<Self> {
        assert_eq!(page.len(), PAGE_SIZE);
        let mut buf = &page[..];

        let order = buf.get_u32_le() as usize;
        let node_count = buf.get_u32_le();
        let entry_count = buf.get_u32_le();
        let tag = buf.get_u32_le();
        let _root_marker = buf.get_u32_le();

        // An order-2 midpoint split would leave an empty right sibling, so
        // anything below 3 cannot name a tree this code produced
        if order < 3 {
            return Err(MinirelError::CorruptMetadata(format!(
                "tree order {} is out of range",
                order
            )));
        }
        let key_type = KeyType::from_tag(tag).ok_or_else(|| {
            MinirelError::CorruptMetadata(format!("unknown key type tag {}", tag))
        })?;

        Ok(Self {
            order,
            node_count,
            entry_count,
            key_type,
        })
    }
}
