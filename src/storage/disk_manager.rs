//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Reserving new pages
//! - Managing the database file's superblock
//!
//! This is the crate's concrete realization of the spec's "storage
//! adapter" contract (`open/create/close/read/write/reserve/size/
//! getPageSize`); the buffer pool never reaches past this contract.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::error::{Error, Result};
use crate::common::PageId;
use crate::storage::page::Page;

const MAGIC: u32 = 0x4255_4650; // "BUFP"
const SUPERBLOCK_SIZE: u64 = 4096;

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// ```text
/// ┌────────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Superblock │ Page 0  │ Page 1  │  ...    │ Page N  │
/// │ (4096 B)   │         │         │         │         │
/// └────────────┴─────────┴─────────┴─────────┴─────────┘
/// ```
/// Page `i` is located at file offset `4096 + i * pageSize`. The superblock
/// records the page size the file was created with, so `open` does not
/// need the page size supplied externally.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**; the buffer pool is responsible for
/// serializing access to it (a single `Mutex<DiskManager>`, matching the
/// spec's "no operation spin-waits, blocking is expected" model).
///
/// # Durability
/// All writes are followed by `fsync()` to ensure durability.
pub struct DiskManager {
    file: File,
    page_size: usize,
    page_count: u64,
}

impl DiskManager {
    /// Create a new database file with the given page size.
    ///
    /// # Errors
    /// Returns an error if the file already exists and `overwrite` is
    /// false, or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, page_size_kb: usize, overwrite: bool) -> Result<Self> {
        let page_size = page_size_kb * 1024;
        let mut opts = OpenOptions::new();
        opts.read(true).write(true);
        if overwrite {
            opts.create(true).truncate(true);
        } else {
            opts.create_new(true);
        }
        let mut file = opts.open(path)?;
        write_superblock(&mut file, page_size)?;
        file.sync_all()?;

        tracing::debug!(page_size, "created database file");
        Ok(Self {
            file,
            page_size,
            page_count: 0,
        })
    }

    /// Open an existing database file, recovering its page size from the
    /// superblock.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSuperblock`] if the file is missing or has
    /// no valid superblock.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = OpenOptions::new().read(true).write(true).open(&path)?;
        let page_size = read_superblock(&mut file)?;

        let file_len = file.metadata()?.len();
        let data_len = file_len.saturating_sub(SUPERBLOCK_SIZE);
        let page_count = data_len / page_size as u64;

        tracing::debug!(page_size, page_count, "opened database file");
        Ok(Self {
            file,
            page_size,
            page_count,
        })
    }

    /// Open an existing database file, or create it with `page_size_kb` if
    /// it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P, page_size_kb: usize) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path, page_size_kb, false)
        }
    }

    /// Close the storage file. There is nothing further to flush here: the
    /// buffer pool calls this only after it has already flushed every
    /// dirty frame and persisted the allocation bitmap.
    pub fn close(self) -> Result<()> {
        Ok(())
    }

    fn offset(&self, page_id: PageId) -> u64 {
        SUPERBLOCK_SIZE + page_id.as_u64() * self.page_size as u64
    }

    /// Read a page from disk.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.as_u64() >= self.page_count {
            return Err(Error::PageNotAllocated(page_id));
        }

        self.file.seek(SeekFrom::Start(self.offset(page_id)))?;
        let mut page = Page::new(self.page_size);
        self.file.read_exact(page.as_mut_slice())?;
        Ok(page)
    }

    /// Write a page to disk, fsyncing for durability.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if page_id.as_u64() >= self.page_count {
            return Err(Error::PageNotAllocated(page_id));
        }

        self.file.seek(SeekFrom::Start(self.offset(page_id)))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;
        Ok(())
    }

    /// Reserve `num_pages` fresh, consecutive, zeroed pages. Returns the id
    /// of the first new page.
    pub fn reserve(&mut self, num_pages: u64) -> Result<PageId> {
        let first = PageId::new(self.page_count);
        let offset = self.offset(first);
        self.file.seek(SeekFrom::Start(offset))?;

        let zeros = vec![0u8; self.page_size];
        for _ in 0..num_pages {
            self.file.write_all(&zeros)?;
        }
        self.file.sync_all()?;

        self.page_count += num_pages;
        tracing::trace!(first = first.as_u64(), num_pages, "reserved pages");
        Ok(first)
    }

    /// Current number of pages in the file.
    #[inline]
    pub fn size(&self) -> u64 {
        self.page_count
    }

    /// The page size this file was created with, in bytes.
    #[inline]
    pub fn get_page_size(&self) -> usize {
        self.page_size
    }
}

fn write_superblock(file: &mut File, page_size: usize) -> Result<()> {
    let mut block = vec![0u8; SUPERBLOCK_SIZE as usize];
    block[0..4].copy_from_slice(&MAGIC.to_le_bytes());
    block[4..8].copy_from_slice(&(page_size as u32).to_le_bytes());
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&block)?;
    Ok(())
}

fn read_superblock(file: &mut File) -> Result<usize> {
    let mut block = [0u8; 8];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut block)
        .map_err(|e| Error::InvalidSuperblock(e.to_string()))?;

    let magic = u32::from_le_bytes(block[0..4].try_into().unwrap());
    if magic != MAGIC {
        return Err(Error::InvalidSuperblock(format!("bad magic: {magic:#x}")));
    }
    let page_size = u32::from_le_bytes(block[4..8].try_into().unwrap()) as usize;
    Ok(page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let dm = DiskManager::create(&path, 4, false).unwrap();
        assert_eq!(dm.size(), 0);
        assert_eq!(dm.get_page_size(), 4096);
    }

    #[test]
    fn test_create_existing_fails_without_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskManager::create(&path, 4, false).unwrap();
        assert!(DiskManager::create(&path, 4, false).is_err());
    }

    #[test]
    fn test_create_existing_succeeds_with_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskManager::create(&path, 4, false).unwrap();
        assert!(DiskManager::create(&path, 4, true).is_ok());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.db");
        assert!(DiskManager::open(&path).is_err());
    }

    #[test]
    fn test_reserve_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut dm = DiskManager::create(&path, 4, false).unwrap();

        let page_id = dm.reserve(1).unwrap();
        assert_eq!(page_id, PageId::new(0));
        assert_eq!(dm.size(), 1);

        let page = dm.read_page(page_id).unwrap();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[4095], 0);
    }

    #[test]
    fn test_reserve_multiple_pages_returns_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut dm = DiskManager::create(&path, 4, false).unwrap();

        let first = dm.reserve(5).unwrap();
        assert_eq!(first, PageId::new(0));
        assert_eq!(dm.size(), 5);

        let next = dm.reserve(1).unwrap();
        assert_eq!(next, PageId::new(5));
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut dm = DiskManager::create(&path, 4, false).unwrap();
        let page_id = dm.reserve(1).unwrap();

        let mut page = Page::new(dm.get_page_size());
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[100] = 0xCD;
        page.as_mut_slice()[4095] = 0xEF;
        dm.write_page(page_id, &page).unwrap();

        let read_page = dm.read_page(page_id).unwrap();
        assert_eq!(read_page.as_slice()[0], 0xAB);
        assert_eq!(read_page.as_slice()[100], 0xCD);
        assert_eq!(read_page.as_slice()[4095], 0xEF);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::create(&path, 4, false).unwrap();
            let page_id = dm.reserve(1).unwrap();
            let mut page = Page::new(dm.get_page_size());
            page.as_mut_slice()[0] = 0x42;
            dm.write_page(page_id, &page).unwrap();
        }

        {
            let mut dm = DiskManager::open(&path).unwrap();
            assert_eq!(dm.size(), 1);
            assert_eq!(dm.get_page_size(), 4096);
            let page = dm.read_page(PageId::new(0)).unwrap();
            assert_eq!(page.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_nonstandard_page_size_roundtrips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::create(&path, 64, false).unwrap();
            assert_eq!(dm.get_page_size(), 65536);
            dm.reserve(1).unwrap();
        }
        {
            let dm = DiskManager::open(&path).unwrap();
            assert_eq!(dm.get_page_size(), 65536);
            assert_eq!(dm.size(), 1);
        }
    }

    #[test]
    fn test_read_unreserved_page_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut dm = DiskManager::create(&path, 4, false).unwrap();
        dm.reserve(1).unwrap();

        assert!(matches!(
            dm.read_page(PageId::new(1)),
            Err(Error::PageNotAllocated(_))
        ));
    }

    #[test]
    fn test_write_unreserved_page_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let mut dm = DiskManager::create(&path, 4, false).unwrap();

        let page = Page::new(dm.get_page_size());
        assert!(matches!(
            dm.write_page(PageId::new(0), &page),
            Err(Error::PageNotAllocated(_))
        ));
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::open_or_create(&path, 4).unwrap();
            assert_eq!(dm.size(), 0);
            dm.reserve(1).unwrap();
        }
        {
            let dm = DiskManager::open_or_create(&path, 4).unwrap();
            assert_eq!(dm.size(), 1);
        }
    }
}
