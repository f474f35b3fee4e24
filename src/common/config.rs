/// Size of a page in bytes (4 KB)
pub const PAGE_SIZE: usize = 4096;

/// Default buffer pool size (number of frames)
pub const DEFAULT_POOL_SIZE: usize = 10;

/// Default B+ tree order (max keys per node)
pub const DEFAULT_BTREE_ORDER: usize = 128;
