use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::common::{MinirelError, PageId, Result, PAGE_SIZE};

/// PageFile is the raw page store: a single file read and written in
/// fixed-size blocks addressed by page number. It tracks how many pages the
/// file currently holds and tallies block-level reads and writes.
pub struct PageFile {
    file: Mutex<File>,
    path: PathBuf,
    /// Number of pages the file currently holds
    total_pages: AtomicU32,
    read_count: AtomicU32,
    write_count: AtomicU32,
}

impl PageFile {
    /// Creates a new page file containing exactly one zero-filled page.
    /// An existing file at the same path is truncated.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<()> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let zeros = [0u8; PAGE_SIZE];
        file.write_all(&zeros)?;
        file.sync_all()?;
        Ok(())
    }

    /// Opens an existing page file. Fails with `FileNotFound` if the file
    /// does not exist; it is never created here.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();
        if !path_buf.exists() {
            return Err(MinirelError::FileNotFound(path_buf));
        }

        let file = OpenOptions::new().read(true).write(true).open(&path_buf)?;

        let file_size = file.metadata()?.len();
        let total_pages = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file: Mutex::new(file),
            path: path_buf,
            total_pages: AtomicU32::new(total_pages),
            read_count: AtomicU32::new(0),
            write_count: AtomicU32::new(0),
        })
    }

    /// Removes a page file from disk.
    pub fn destroy<P: AsRef<Path>>(path: P) -> Result<()> {
        let path_buf = path.as_ref().to_path_buf();
        if !path_buf.exists() {
            return Err(MinirelError::FileNotFound(path_buf));
        }
        std::fs::remove_file(&path_buf)?;
        Ok(())
    }

    /// Reads one page from disk into the provided buffer.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn read_page(&self, page_num: PageId, data: &mut [u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "Buffer must be PAGE_SIZE bytes");

        let total = self.total_pages.load(Ordering::Acquire);
        if page_num.as_u32() >= total {
            return Err(MinirelError::ReadNonExistingPage {
                page: page_num,
                total,
            });
        }

        let offset = (page_num.as_u32() as u64) * (PAGE_SIZE as u64);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(data)?;

        self.read_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Writes one page to disk from the provided buffer, extending the file
    /// with zero pages first if the target lies beyond the current extent.
    /// The buffer must be exactly PAGE_SIZE bytes.
    pub fn write_page(&self, page_num: PageId, data: &[u8]) -> Result<()> {
        assert_eq!(data.len(), PAGE_SIZE, "Buffer must be PAGE_SIZE bytes");

        if page_num.as_u32() >= self.total_pages.load(Ordering::Acquire) {
            self.ensure_capacity(page_num.as_u32() + 1)?;
        }

        let offset = (page_num.as_u32() as u64) * (PAGE_SIZE as u64);

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;
        file.flush()?;

        self.write_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Extends the file by appending zero pages until it holds at least
    /// `num_pages` pages. A no-op when the file is already large enough.
    pub fn ensure_capacity(&self, num_pages: u32) -> Result<()> {
        let mut file = self.file.lock();

        let current = self.total_pages.load(Ordering::Acquire);
        if num_pages <= current {
            return Ok(());
        }

        file.seek(SeekFrom::End(0))?;
        let zeros = [0u8; PAGE_SIZE];
        for _ in current..num_pages {
            file.write_all(&zeros)?;
        }
        file.flush()?;

        self.total_pages.store(num_pages, Ordering::Release);
        Ok(())
    }

    /// Returns the number of pages the file currently holds.
    pub fn total_pages(&self) -> u32 {
        self.total_pages.load(Ordering::Acquire)
    }

    /// Returns the number of block reads performed through this handle.
    pub fn read_count(&self) -> u32 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Returns the number of block writes performed through this handle.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Returns the path to the page file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PageFile {
    fn drop(&mut self) {
        // Ensure all data reaches disk before the handle goes away
        let file = self.file.get_mut();
        let _ = file.sync_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch(dir: &TempDir, name: &str) -> PathBuf {
        dir.path().join(name)
    }

    #[test]
    fn test_create_makes_one_zero_page() {
        let dir = TempDir::new().unwrap();
        let path = scratch(&dir, "t.pf");

        PageFile::create(&path).unwrap();
        let pf = PageFile::open(&path).unwrap();
        assert_eq!(pf.total_pages(), 1);

        let mut data = [1u8; PAGE_SIZE];
        pf.read_page(PageId::new(0), &mut data).unwrap();
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = scratch(&dir, "missing.pf");

        assert!(matches!(
            PageFile::open(&path),
            Err(MinirelError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_read_beyond_extent_fails() {
        let dir = TempDir::new().unwrap();
        let path = scratch(&dir, "t.pf");

        PageFile::create(&path).unwrap();
        let pf = PageFile::open(&path).unwrap();

        let mut data = [0u8; PAGE_SIZE];
        let err = pf.read_page(PageId::new(1), &mut data).unwrap_err();
        assert!(matches!(
            err,
            MinirelError::ReadNonExistingPage { total: 1, .. }
        ));
    }

    #[test]
    fn test_write_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = scratch(&dir, "t.pf");

        PageFile::create(&path).unwrap();
        let pf = PageFile::open(&path).unwrap();

        let mut data = [0u8; PAGE_SIZE];
        data[0] = 42;
        data[PAGE_SIZE - 1] = 128;
        pf.write_page(PageId::new(0), &data).unwrap();

        let mut read_back = [0u8; PAGE_SIZE];
        pf.read_page(PageId::new(0), &mut read_back).unwrap();
        assert_eq!(read_back[0], 42);
        assert_eq!(read_back[PAGE_SIZE - 1], 128);
    }

    #[test]
    fn test_ensure_capacity_appends_zero_pages() {
        let dir = TempDir::new().unwrap();
        let path = scratch(&dir, "t.pf");

        PageFile::create(&path).unwrap();
        let pf = PageFile::open(&path).unwrap();

        pf.ensure_capacity(4).unwrap();
        assert_eq!(pf.total_pages(), 4);

        // Already large enough: no change
        pf.ensure_capacity(2).unwrap();
        assert_eq!(pf.total_pages(), 4);

        let mut data = [1u8; PAGE_SIZE];
        pf.read_page(PageId::new(3), &mut data).unwrap();
        assert!(data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_destroy_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = scratch(&dir, "t.pf");

        PageFile::create(&path).unwrap();
        PageFile::destroy(&path).unwrap();
        assert!(!path.exists());

        assert!(matches!(
            PageFile::destroy(&path),
            Err(MinirelError::FileNotFound(_))
        ));
    }
}
