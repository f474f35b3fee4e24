use std::collections::HashMap;
use std::path::Path;

use crate::common::{MinirelError, PageId, Result};
use crate::storage::PageFile;

use super::{Frame, Replacer, ReplacementStrategy};

/// Handle to a pinned page. Holding one does not by itself keep the page
/// pinned: every pin must be paired with exactly one `unpin_page` call, and
/// the buffer is reachable only through `page`/`page_mut` while pinned.
#[derive(Debug, Clone, Copy)]
pub struct PageHandle {
    page_num: PageId,
}

impl PageHandle {
    pub fn page_num(&self) -> PageId {
        self.page_num
    }
}

/// BufferPool caches pages of one open page file in a fixed set of frames.
/// It maps page numbers to frames, tracks pin counts and dirtiness, evicts
/// unpinned frames according to the configured replacement strategy, and
/// counts the disk I/O it causes.
///
/// The pool is a single-caller structure: all mutation goes through
/// `&mut self` and every operation completes before returning. A full pool
/// with no unpinned frame is a hard error, never a wait.
pub struct BufferPool {
    frames: Vec<Frame>,
    /// Maps resident page numbers to frame indices
    page_table: HashMap<PageId, usize>,
    file: PageFile,
    replacer: Replacer,
    read_count: u32,
    write_count: u32,
}

impl BufferPool {
    /// Opens the backing page file (which must already exist) and allocates
    /// `num_pages` empty frames governed by the given strategy.
    pub fn new<P: AsRef<Path>>(
        path: P,
        num_pages: usize,
        strategy: ReplacementStrategy,
    ) -> Result<Self> {
        let file = PageFile::open(path)?;

        let frames = (0..num_pages).map(|_| Frame::empty()).collect();

        Ok(Self {
            frames,
            page_table: HashMap::new(),
            file,
            replacer: Replacer::new(strategy, num_pages),
            read_count: 0,
            write_count: 0,
        })
    }

    /// Pins a page, reading it from disk if it is not already resident.
    ///
    /// A hit bumps the frame's pin count and strategy metadata without any
    /// disk I/O. A miss picks a victim frame (failing with `BufferPoolFull`
    /// when every frame is pinned), writes the victim out first if dirty,
    /// and loads the requested page in its place. Requests beyond the file's
    /// current extent fail with `ReadNonExistingPage` before any frame is
    /// disturbed; growing the file is the caller's decision, made through
    /// the page store's `ensure_capacity`.
    pub fn pin_page(&mut self, page_num: PageId) -> Result<PageHandle> {
        if let Some(&idx) = self.page_table.get(&page_num) {
            self.frames[idx].pin();
            self.replacer.record_pin(idx);
            return Ok(PageHandle { page_num });
        }

        let total = self.file.total_pages();
        if page_num.as_u32() >= total {
            return Err(MinirelError::ReadNonExistingPage {
                page: page_num,
                total,
            });
        }

        let victim = self.pick_victim()?;
        self.evict(victim)?;

        let mut buf = self.frames[victim].take_buffer();
        self.file.read_page(page_num, buf.as_mut_slice())?;
        self.read_count += 1;

        self.frames[victim].fill(page_num, buf);
        self.page_table.insert(page_num, victim);
        self.replacer.record_pin(victim);

        Ok(PageHandle { page_num })
    }

    /// Returns the pinned page's buffer for reading.
    pub fn page(&self, handle: &PageHandle) -> Result<&[u8]> {
        let idx = self.resident_frame(handle.page_num)?;
        let frame = &self.frames[idx];
        if !frame.is_pinned() {
            return Err(MinirelError::PageNotPinned(handle.page_num));
        }
        frame
            .data()
            .map(|d| d.as_slice())
            .ok_or(MinirelError::PageNotFound(handle.page_num))
    }

    /// Returns the pinned page's buffer for writing. The caller is expected
    /// to `mark_dirty` after mutating it.
    pub fn page_mut(&mut self, handle: &PageHandle) -> Result<&mut [u8]> {
        let idx = self.resident_frame(handle.page_num)?;
        let frame = &mut self.frames[idx];
        if !frame.is_pinned() {
            return Err(MinirelError::PageNotPinned(handle.page_num));
        }
        frame
            .data_mut()
            .map(|d| d.as_mut_slice())
            .ok_or(MinirelError::PageNotFound(handle.page_num))
    }

    /// Drops one pin on the page. Unpinning is the only way a frame becomes
    /// eligible for eviction.
    pub fn unpin_page(&mut self, handle: &PageHandle) -> Result<()> {
        let idx = self.resident_frame(handle.page_num)?;
        if self.frames[idx].unpin().is_none() {
            return Err(MinirelError::PageNotPinned(handle.page_num));
        }
        self.replacer.record_unpin(idx);
        Ok(())
    }

    /// Marks the page's frame dirty. No disk write happens here.
    pub fn mark_dirty(&mut self, handle: &PageHandle) -> Result<()> {
        let idx = self.resident_frame(handle.page_num)?;
        self.frames[idx].set_dirty(true);
        Ok(())
    }

    /// Writes the page's frame to disk if dirty. Idempotent when clean.
    pub fn force_page(&mut self, handle: &PageHandle) -> Result<()> {
        let idx = self.resident_frame(handle.page_num)?;
        self.flush_frame(idx)
    }

    /// Writes every dirty, unpinned frame to disk. Dirty frames that are
    /// still pinned are left alone; a live client may be mutating them.
    pub fn force_flush(&mut self) -> Result<()> {
        for idx in 0..self.frames.len() {
            if self.frames[idx].is_dirty() && !self.frames[idx].is_pinned() {
                self.flush_frame(idx)?;
            }
        }
        Ok(())
    }

    /// Flushes all dirty frames and releases the pool. Refused, returning
    /// the pool intact, while any frame is still pinned.
    pub fn shutdown(mut self) -> std::result::Result<(), (Self, MinirelError)> {
        if self.frames.iter().any(|f| f.is_pinned()) {
            return Err((self, MinirelError::PinnedPages));
        }
        if let Err(e) = self.force_flush() {
            return Err((self, e));
        }
        for frame in &mut self.frames {
            frame.reset();
        }
        self.page_table.clear();
        Ok(())
    }

    // --- statistics interface ---

    /// Page number held by each frame, in frame order; None for empty frames.
    pub fn frame_contents(&self) -> Vec<Option<PageId>> {
        self.frames.iter().map(|f| f.page_num()).collect()
    }

    /// Dirty flag of each frame, in frame order.
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.is_dirty()).collect()
    }

    /// Pin count of each frame, in frame order.
    pub fn fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.pin_count()).collect()
    }

    /// Number of pages read from disk since the pool was initialized.
    pub fn read_io_count(&self) -> u32 {
        self.read_count
    }

    /// Number of pages written to disk since the pool was initialized.
    pub fn write_io_count(&self) -> u32 {
        self.write_count
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        self.replacer.strategy()
    }

    /// Grows the backing file so that pages `0..num_pages` all exist. This
    /// is how a caller reacts to `ReadNonExistingPage` when it wants a fresh
    /// zeroed page materialized.
    pub fn ensure_capacity(&mut self, num_pages: u32) -> Result<()> {
        self.file.ensure_capacity(num_pages)
    }

    // --- internals ---

    fn resident_frame(&self, page_num: PageId) -> Result<usize> {
        self.page_table
            .get(&page_num)
            .copied()
            .ok_or(MinirelError::PageNotFound(page_num))
    }

    fn pick_victim(&mut self) -> Result<usize> {
        let pinned: Vec<bool> = self.frames.iter().map(|f| f.is_pinned()).collect();
        self.replacer
            .pick_victim(&pinned)
            .ok_or(MinirelError::BufferPoolFull)
    }

    /// Writes the victim frame out if dirty and unmaps its old page.
    fn evict(&mut self, idx: usize) -> Result<()> {
        if let Some(old_page) = self.frames[idx].page_num() {
            if self.frames[idx].is_dirty() {
                self.flush_frame(idx)?;
            }
            self.page_table.remove(&old_page);
        }
        Ok(())
    }

    fn flush_frame(&mut self, idx: usize) -> Result<()> {
        let frame = &mut self.frames[idx];
        if !frame.is_dirty() {
            return Ok(());
        }
        let page_num = frame
            .page_num()
            .expect("dirty frame must hold a page");
        let data = frame
            .data()
            .expect("dirty frame must hold a buffer");
        self.file.write_page(page_num, data.as_slice())?;
        self.write_count += 1;
        self.frames[idx].set_dirty(false);
        Ok(())
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        // Best effort: dirty unpinned frames still reach disk
        let _ = self.force_flush();
    }
}
