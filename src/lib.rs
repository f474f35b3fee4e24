//! Minirel - a single-process relational storage stack in Rust
//!
//! This crate provides the lower half of a relational database: a page file
//! store, a buffer pool, and a B+Tree index. Data lives in fixed-size pages
//! on disk; the buffer pool caches a working set of those pages in memory
//! and decides which to evict when space runs out.
//!
//! # Architecture
//!
//! The system is organized into three layers:
//!
//! - **Storage Layer** (`storage`): Handles disk I/O and page organization
//!   - `PageFile`: Reads, writes, and grows a file of fixed-size pages
//!
//! - **Buffer Pool** (`buffer`): Memory management for database pages
//!   - `BufferPool`: Pins pages into frames and caches them in memory
//!   - `Replacer`: FIFO, LRU, and CLOCK replacement strategies
//!   - `Frame`: Per-frame page buffer, pin count, and dirty flag
//!
//! - **Index** (`index`): Ordered key access
//!   - `BTreeIndex`: In-memory B+Tree mapping keys to record ids
//!   - `TreeScan`: Forward iteration over an index in key order
//!
//! # Example
//!
//! ```rust,no_run
//! use minirel::buffer::{BufferPool, ReplacementStrategy};
//! use minirel::storage::PageFile;
//! use minirel::PageId;
//!
//! // Create a page file and open a pool of 10 frames over it
//! PageFile::create("test.pf").unwrap();
//! let mut pool = BufferPool::new("test.pf", 10, ReplacementStrategy::Lru).unwrap();
//!
//! // Pin page 0, mutate it, and write it back
//! let handle = pool.pin_page(PageId::new(0)).unwrap();
//! pool.page_mut(&handle).unwrap()[0] = 42;
//! pool.mark_dirty(&handle).unwrap();
//! pool.unpin_page(&handle).unwrap();
//! pool.force_flush().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used types at the crate root
pub use common::{Key, KeyType, MinirelError, PageId, RecordId, Result, SlotId};
