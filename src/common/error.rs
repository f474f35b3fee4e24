use std::path::PathBuf;

use thiserror::Error;

use super::types::{Key, PageId};

/// Storage stack error types
#[derive(Error, Debug)]
pub enum MinirelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Page file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Read of non-existing page {page} (file holds {total} pages)")]
    ReadNonExistingPage { page: PageId, total: u32 },

    #[error("Page {0} is not resident in the buffer pool")]
    PageNotFound(PageId),

    #[error("Page {0} is not pinned")]
    PageNotPinned(PageId),

    #[error("Buffer pool is full, no evictable frames available")]
    BufferPoolFull,

    #[error("Buffer pool has pinned pages outstanding")]
    PinnedPages,

    #[error("Key {0} not found")]
    KeyNotFound(Key),

    #[error("Key {0} already exists")]
    KeyAlreadyExists(Key),

    #[error("No more entries in scan")]
    NoMoreEntries,

    #[error("Tree order {0} is out of range (minimum 3)")]
    InvalidOrder(usize),

    #[error("Index metadata block is corrupt: {0}")]
    CorruptMetadata(String),
}

pub type Result<T> = std::result::Result<T, MinirelError>;
