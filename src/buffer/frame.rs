use crate::common::{PageId, PAGE_SIZE};

/// Frame manages a single buffer slot in the pool: which disk page it holds,
/// the page buffer itself, the dirty flag, and the pin count. An empty frame
/// holds no buffer and is never dirty.
pub struct Frame {
    page_num: Option<PageId>,
    data: Option<Box<[u8; PAGE_SIZE]>>,
    dirty: bool,
    pin_count: u32,
}

impl Frame {
    pub fn empty() -> Self {
        Self {
            page_num: None,
            data: None,
            dirty: false,
            pin_count: 0,
        }
    }

    pub fn page_num(&self) -> Option<PageId> {
        self.page_num
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }

    pub fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrements the pin count. Returns None if the frame is not pinned.
    pub fn unpin(&mut self) -> Option<u32> {
        if self.pin_count == 0 {
            return None;
        }
        self.pin_count -= 1;
        Some(self.pin_count)
    }

    pub fn data(&self) -> Option<&[u8; PAGE_SIZE]> {
        self.data.as_deref()
    }

    pub fn data_mut(&mut self) -> Option<&mut [u8; PAGE_SIZE]> {
        self.data.as_deref_mut()
    }

    /// Takes the frame's buffer (or allocates a fresh one) for reloading.
    /// The frame is left empty until `fill` installs the new page.
    pub fn take_buffer(&mut self) -> Box<[u8; PAGE_SIZE]> {
        self.page_num = None;
        self.dirty = false;
        self.pin_count = 0;
        self.data.take().unwrap_or_else(|| Box::new([0u8; PAGE_SIZE]))
    }

    /// Installs a freshly read page into the frame with a single pin.
    pub fn fill(&mut self, page_num: PageId, data: Box<[u8; PAGE_SIZE]>) {
        self.page_num = Some(page_num);
        self.data = Some(data);
        self.dirty = false;
        self.pin_count = 1;
    }

    /// Releases the frame's buffer and resets all bookkeeping.
    pub fn reset(&mut self) {
        self.page_num = None;
        self.data = None;
        self.dirty = false;
        self.pin_count = 0;
    }
}
