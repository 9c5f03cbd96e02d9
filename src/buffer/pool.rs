//! The pool façade: `open`/`create`/`close`, `alloc`/`release`,
//! `pin`/`unpin`, `setDirty`, `checkpoint`, statistics, and the
//! consistency checker. Everything else in this crate exists to serve
//! this module.

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::bitmap::Bitmap;
use crate::common::config::{BufferPoolConfig, StorageConfig};
use crate::common::error::{Error, Result};
use crate::common::{FrameId, PageId};
use crate::executor::TaskExecutor;
use crate::storage::page::Page;
use crate::storage::DiskManager;

use super::frame::Frame;
use super::guard::PinGuard;
use super::partition::Partition;
use super::replacer::ClockSweep;
use super::stats::{BufferPoolStats, Statistics};

/// A disk-backed page buffer pool: a fixed-size cache of pages over a
/// single backing file, with partitioned Clock-Sweep eviction and an
/// on-disk allocation bitmap.
///
/// Always held behind an `Arc` (returned by [`BufferPool::open`] /
/// [`BufferPool::create`]) since pinned pages and prefetch tasks both
/// need to outlive the call that created them.
pub struct BufferPool {
    opened: AtomicBool,
    disk: Mutex<DiskManager>,
    page_size: usize,
    num_partitions: u32,
    frames: Vec<Frame>,
    partitions: Vec<Partition>,
    bitmap: Mutex<Bitmap>,
    sweep: ClockSweep,
    prefetching_degree: u16,
    executor: Option<Arc<dyn TaskExecutor>>,
    next_thread: AtomicU64,
    ops_stats: BufferPoolStats,
}

impl BufferPool {
    /// Open an existing backing file, recovering the allocation bitmap
    /// from disk.
    pub fn open<P: AsRef<Path>>(
        config: BufferPoolConfig,
        path: P,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<Arc<Self>> {
        let disk = DiskManager::open(path)?;
        Self::build(config, disk, executor, true)
    }

    /// Create a fresh backing file through the storage adapter; the
    /// allocation bitmap starts empty.
    pub fn create<P: AsRef<Path>>(
        config: BufferPoolConfig,
        path: P,
        storage_config: StorageConfig,
        overwrite: bool,
        executor: Arc<dyn TaskExecutor>,
    ) -> Result<Arc<Self>> {
        let disk = DiskManager::create(path, storage_config.page_size_kb, overwrite)?;
        Self::build(config, disk, executor, false)
    }

    fn build(
        config: BufferPoolConfig,
        mut disk: DiskManager,
        executor: Arc<dyn TaskExecutor>,
        load_existing_bitmap: bool,
    ) -> Result<Arc<Self>> {
        let page_size = disk.get_page_size();
        let page_size_kb = page_size / 1024;
        if config.pool_size_kb % page_size_kb != 0 {
            return Err(Error::PoolSizeNotMultipleOfPageSize {
                pool_size_kb: config.pool_size_kb,
                page_size_kb,
            });
        }
        if config.prefetching_degree > 0 && executor.num_threads() == 0 {
            return Err(Error::NoThreadsAvailableForPrefetching);
        }

        let num_frames = config.num_frames(page_size_kb);
        let num_partitions = config.num_partitions.max(1);

        let frames: Vec<Frame> = (0..num_frames).map(|_| Frame::new(page_size)).collect();
        let partitions: Vec<Partition> = (0..num_partitions).map(|_| Partition::new()).collect();
        for fid in 0..num_frames as u64 {
            let owner = (fid % num_partitions as u64) as usize;
            partitions[owner]
                .lock()
                .free_frames
                .push_back(FrameId::new(fid));
        }

        let bitmap = if load_existing_bitmap {
            load_allocation_table(&mut disk, page_size)?
        } else {
            Bitmap::new()
        };

        let pool = Arc::new(Self {
            opened: AtomicBool::new(true),
            disk: Mutex::new(disk),
            page_size,
            num_partitions,
            frames,
            partitions,
            bitmap: Mutex::new(bitmap),
            sweep: ClockSweep::new(),
            prefetching_degree: config.prefetching_degree,
            executor: if config.prefetching_degree > 0 {
                Some(executor)
            } else {
                None
            },
            next_thread: AtomicU64::new(0),
            ops_stats: BufferPoolStats::new(),
        });

        {
            let bm = pool.bitmap.lock();
            for bit in 0..bm.len() as u64 {
                let pid = PageId::new(bit);
                if !bm.test(bit) && !pool.is_protected(pid) {
                    let owner = pool.partition_index(pid);
                    pool.partitions[owner].lock().free_pages.push_back(pid);
                }
            }
        }

        tracing::info!(
            num_frames,
            num_partitions,
            page_size,
            "buffer pool opened"
        );
        Ok(pool)
    }

    /// True iff `pid` is reserved for the allocation bitmap and must
    /// never be handed to a client.
    #[inline]
    pub fn is_protected(&self, pid: PageId) -> bool {
        pid.as_u64() % (self.page_size as u64 * 8) == 0
    }

    #[inline]
    fn partition_index(&self, pid: PageId) -> usize {
        pid.partition(self.num_partitions) as usize
    }

    fn check_opened(&self) -> Result<()> {
        if self.opened.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::PoolNotOpen)
        }
    }

    fn validate_accessible(&self, pid: PageId) -> Result<()> {
        if self.is_protected(pid) {
            return Err(Error::UnableToAccessProtectedPage(pid));
        }
        if pid.as_u64() >= self.disk.lock().size() {
            return Err(Error::PageNotAllocated(pid));
        }
        Ok(())
    }

    fn write_back(&self, pid: PageId, page: &Page) -> Result<()> {
        let mut disk = self.disk.lock();
        disk.write_page(pid, page)?;
        self.ops_stats.pages_written.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(page = pid.0, "wrote back dirty frame");
        Ok(())
    }

    /// Reserve `n` fresh consecutive pages, growing the bitmap and
    /// distributing the non-protected ones to their partitions' free
    /// lists. Returns the first page id the caller may use — if the
    /// storage adapter's first new id happens to be protected, one
    /// additional page is reserved and its id is returned instead.
    fn reserve_pages(&self, n: u64) -> Result<PageId> {
        let first = {
            let mut disk = self.disk.lock();
            let first = disk.reserve(n)?;
            let mut bm = self.bitmap.lock();
            for _ in 0..n {
                bm.push(false);
            }
            first
        };
        self.distribute_reserved(first, n);

        if self.is_protected(first) {
            let extra = {
                let mut disk = self.disk.lock();
                let extra = disk.reserve(1)?;
                let mut bm = self.bitmap.lock();
                bm.push(false);
                extra
            };
            self.distribute_reserved(extra, 1);
            let second = if n > 1 {
                PageId::new(first.as_u64() + 1)
            } else {
                extra
            };
            Ok(second)
        } else {
            Ok(first)
        }
    }

    fn distribute_reserved(&self, first: PageId, n: u64) {
        for i in 0..n {
            let pid = PageId::new(first.as_u64() + i);
            if !self.is_protected(pid) {
                let owner = self.partition_index(pid);
                self.partitions[owner].lock().free_pages.push_back(pid);
            }
        }
    }

    /// Pop a free page from some partition and obtain a frame for it in
    /// the same partition, never releasing that partition's lock between
    /// the pop and the bitmap update: otherwise a concurrent
    /// `checkConsistency` could observe `pid` missing from both the free
    /// list and the bitmap. Reserves more storage and retries if every
    /// partition's free list is currently empty.
    fn take_free_page_and_slot(&self) -> Result<(PageId, FrameId)> {
        loop {
            for (idx, partition) in self.partitions.iter().enumerate() {
                let mut pstate = partition.lock();
                if let Some(pid) = pstate.free_pages.pop_front() {
                    {
                        let mut bm = self.bitmap.lock();
                        bm.set(pid.as_u64(), true);
                    }
                    let fid = self.sweep.get_empty_slot(
                        &self.frames,
                        self.num_partitions,
                        idx as u32,
                        &mut pstate,
                        |wpid, page| self.write_back(wpid, page),
                    )?;
                    pstate.page_to_frame.insert(pid, fid);
                    return Ok((pid, fid));
                }
            }
            self.reserve_pages(1)?;
        }
    }

    /// Select a free page to hand to the caller, load it into a frame,
    /// and pin it with `refCount = 1`.
    pub fn alloc(self: &Arc<Self>) -> Result<PinGuard> {
        self.check_opened()?;
        let (pid, fid) = self.take_free_page_and_slot()?;

        {
            let mut content = self.frames[fid.index()].write();
            content.ref_count = 1;
            content.usage_count = 1;
            content.dirty = false;
            content.page_id = pid;
            content.in_use = true;
        }

        tracing::debug!(page = pid.0, frame = fid.0, "allocated page");
        Ok(PinGuard::new(Arc::clone(self), fid, pid))
    }

    /// Release a page: evict any resident copy (writing it back if
    /// dirty), mark it unallocated, and return it to its partition's
    /// free-page list.
    pub fn release(&self, pid: PageId) -> Result<()> {
        self.check_opened()?;
        self.validate_accessible(pid)?;

        let p = self.partition_index(pid);
        let mut write_err = None;
        {
            let mut pstate = self.partitions[p].lock();
            if let Some(fid) = pstate.page_to_frame.remove(&pid) {
                pstate.free_frames.push_back(fid);
                let mut content = self.frames[fid.index()].write();
                if content.dirty {
                    if let Err(e) = self.write_back(pid, &content.buffer) {
                        write_err = Some(e);
                    }
                }
                content.reset();
            }
            {
                let mut bm = self.bitmap.lock();
                bm.set(pid.as_u64(), false);
            }
            pstate.free_pages.push_back(pid);
        }

        tracing::debug!(page = pid.0, "released page");
        match write_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn load_into_frame(&self, fid: FrameId, pid: PageId, ref_count: u64, usage_count: u64) -> Result<()> {
        let page = {
            let mut disk = self.disk.lock();
            disk.read_page(pid)?
        };
        self.ops_stats.pages_read.fetch_add(1, Ordering::Relaxed);
        let mut content = self.frames[fid.index()].write();
        content.buffer = page;
        content.ref_count = ref_count;
        content.usage_count = usage_count;
        content.dirty = false;
        content.page_id = pid;
        content.in_use = true;
        Ok(())
    }

    /// Pin `pid`, returning a guard valid until it is dropped. On a
    /// cache hit this only bumps bookkeeping counters; on a miss it
    /// loads the page from disk into a freshly obtained frame.
    pub fn pin(self: &Arc<Self>, pid: PageId, enable_prefetch: bool) -> Result<PinGuard> {
        self.check_opened()?;
        self.validate_accessible(pid)?;

        let p = self.partition_index(pid);
        let fid;
        {
            let mut pstate = self.partitions[p].lock();
            if let Some(&existing) = pstate.page_to_frame.get(&pid) {
                fid = existing;
                drop(pstate);
                let mut content = self.frames[fid.index()].write();
                content.ref_count += 1;
                content.usage_count += 1;
                self.ops_stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            } else {
                let new_fid = self.sweep.get_empty_slot(
                    &self.frames,
                    self.num_partitions,
                    p as u32,
                    &mut pstate,
                    |wpid, page| self.write_back(wpid, page),
                )?;
                pstate.page_to_frame.insert(pid, new_fid);
                drop(pstate);
                self.load_into_frame(new_fid, pid, 1, 1)?;
                fid = new_fid;
                self.ops_stats.cache_misses.fetch_add(1, Ordering::Relaxed);
            }
        }

        if enable_prefetch && self.prefetching_degree > 0 {
            if let Some(executor) = &self.executor {
                crate::prefetch::submit_prefetch(
                    Arc::clone(self),
                    executor,
                    &self.next_thread,
                    pid,
                    self.prefetching_degree,
                );
            }
        }

        Ok(PinGuard::new(Arc::clone(self), fid, pid))
    }

    /// Pin `pid` purely to warm the cache: loads the page if not
    /// already resident, but does not touch `refCount`/`usageCount`, so
    /// the warmed frame remains an immediate eviction candidate. Used
    /// only by the prefetch launcher. Best-effort: out-of-memory or I/O
    /// failures are swallowed since prefetch failures must never be
    /// observable to the caller that triggered them.
    pub(crate) fn pin_for_prefetch(&self, pid: PageId) {
        if self.is_protected(pid) {
            return;
        }
        if pid.as_u64() >= self.disk.lock().size() {
            return;
        }
        let p = self.partition_index(pid);
        let mut pstate = self.partitions[p].lock();
        if pstate.page_to_frame.contains_key(&pid) {
            return;
        }
        let fid = match self.sweep.get_empty_slot(
            &self.frames,
            self.num_partitions,
            p as u32,
            &mut pstate,
            |wpid, page| self.write_back(wpid, page),
        ) {
            Ok(fid) => fid,
            Err(_) => return,
        };
        pstate.page_to_frame.insert(pid, fid);
        drop(pstate);
        if let Err(e) = self.load_into_frame(fid, pid, 0, 0) {
            tracing::warn!(error = %e, page = pid.0, "prefetch load failed");
        }
    }

    pub(crate) fn frame(&self, fid: FrameId) -> &Frame {
        &self.frames[fid.index()]
    }

    pub(crate) fn unpin_by_frame(&self, fid: FrameId) {
        let mut content = self.frames[fid.index()].write();
        if content.ref_count > 0 {
            content.ref_count -= 1;
        }
    }

    /// Decrement `pid`'s pin count directly, without holding a
    /// [`PinGuard`]. Fails with [`Error::PageNotPresent`] if `pid` is
    /// not currently resident.
    pub fn unpin(&self, pid: PageId) -> Result<()> {
        self.check_opened()?;
        self.validate_accessible(pid)?;
        let p = self.partition_index(pid);
        let fid = {
            let pstate = self.partitions[p].lock();
            pstate.page_to_frame.get(&pid).copied()
        };
        match fid {
            Some(fid) => {
                self.unpin_by_frame(fid);
                Ok(())
            }
            None => Err(Error::PageNotPresent(pid)),
        }
    }

    /// Mark `pid`'s frame dirty. Fails with [`Error::PageNotPresent`]
    /// if `pid` is not currently resident.
    pub fn set_dirty(&self, pid: PageId) -> Result<()> {
        self.check_opened()?;
        self.validate_accessible(pid)?;
        let p = self.partition_index(pid);
        let fid = {
            let pstate = self.partitions[p].lock();
            pstate.page_to_frame.get(&pid).copied()
        };
        match fid {
            Some(fid) => {
                self.frames[fid.index()].write().dirty = true;
                Ok(())
            }
            None => Err(Error::PageNotPresent(pid)),
        }
    }

    fn store_allocation_table(&self) -> Result<()> {
        let (bytes, bit_len) = {
            let bm = self.bitmap.lock();
            (bm.to_bytes(), bm.len())
        };
        let bits_per_page = self.page_size * 8;
        let num_bitmap_pages = (bit_len + bits_per_page - 1) / bits_per_page.max(1);

        let mut disk = self.disk.lock();
        for k in 0..num_bitmap_pages {
            let page_id = PageId::new((k * bits_per_page) as u64);
            let start = k * self.page_size;
            let end = ((k + 1) * self.page_size).min(bytes.len());
            let mut page = Page::new(self.page_size);
            if start < bytes.len() {
                page.as_mut_slice()[..end - start].copy_from_slice(&bytes[start..end]);
            }
            disk.write_page(page_id, &page)?;
        }
        Ok(())
    }

    fn flush_and_persist(&self) -> Result<()> {
        let _guards: Vec<_> = self.partitions.iter().map(|p| p.lock()).collect();
        for frame in &self.frames {
            let mut content = frame.write();
            if content.in_use && content.dirty {
                self.write_back(content.page_id, &content.buffer)?;
                content.dirty = false;
            }
        }
        self.store_allocation_table()
    }

    /// Flush every dirty frame and persist the allocation bitmap.
    pub fn checkpoint(&self) -> Result<()> {
        self.check_opened()?;
        self.flush_and_persist()?;
        tracing::info!("checkpoint complete");
        Ok(())
    }

    /// Flush all dirty frames, persist the bitmap, and close the
    /// backing file. Fails with [`Error::PoolNotOpen`] if the pool was
    /// already closed.
    pub fn close(&self) -> Result<()> {
        if !self.opened.swap(false, Ordering::SeqCst) {
            return Err(Error::PoolNotOpen);
        }
        let result = self.flush_and_persist();
        tracing::info!("buffer pool closed");
        result
    }

    /// `{ numAllocatedPages, numReservedPages, pageSize }`.
    pub fn get_statistics(&self) -> Result<Statistics> {
        self.check_opened()?;
        let num_allocated_pages = self.frames.iter().filter(|f| f.read().in_use).count() as u64;
        let num_reserved_pages = self.disk.lock().size();
        Ok(Statistics {
            num_allocated_pages,
            num_reserved_pages,
            page_size: self.page_size,
        })
    }

    /// Operational telemetry (hit rate, eviction count, …) with no
    /// counterpart in [`BufferPool::get_statistics`].
    pub fn ops_stats(&self) -> &BufferPoolStats {
        &self.ops_stats
    }

    /// Walk the bitmap under every partition lock and verify invariants
    /// 1–5 for every page id.
    pub fn check_consistency(&self) -> Result<()> {
        self.check_opened()?;
        let guards: Vec<_> = self.partitions.iter().map(|p| p.lock()).collect();
        let bm = self.bitmap.lock();

        let free_sets: Vec<HashSet<PageId>> = guards
            .iter()
            .map(|g| g.free_pages.iter().copied().collect())
            .collect();

        for bit in 0..bm.len() as u64 {
            let pid = PageId::new(bit);
            let protected = self.is_protected(pid);
            let allocated = bm.test(bit);
            let free_count = free_sets.iter().filter(|s| s.contains(&pid)).count();

            if protected {
                if free_count > 0 {
                    return Err(Error::ProtectedPageInFreelist(pid));
                }
                for g in &guards {
                    if let Some(&fid) = g.page_to_frame.get(&pid) {
                        return Err(Error::BufferDescriptorIncorrectData(fid));
                    }
                }
                continue;
            }

            if allocated {
                if free_count > 0 {
                    return Err(Error::AllocatedPageInFreelist(pid));
                }
            } else {
                if free_count != 1 {
                    return Err(Error::FreePageNotInFreelist(pid));
                }
                for g in &guards {
                    if let Some(&fid) = g.page_to_frame.get(&pid) {
                        return Err(Error::FreePageMappedToBuffer(pid, fid));
                    }
                }
            }
        }

        for (owner, g) in guards.iter().enumerate() {
            for (&pid, &fid) in g.page_to_frame.iter() {
                let content = self.frames[fid.index()].read();
                let belongs_here = fid.index() % self.num_partitions as usize == owner;
                if !content.in_use || content.page_id != pid || !belongs_here {
                    return Err(Error::BufferDescriptorIncorrectData(fid));
                }
            }
        }

        Ok(())
    }
}

impl Drop for BufferPool {
    fn drop(&mut self) {
        if self.opened.load(Ordering::SeqCst) {
            tracing::warn!("buffer pool dropped without close(); dirty pages may be lost");
        }
    }
}

/// Compute `numBitmapPages = ceil(storageSize / (pageSize*8))`, read each
/// bitmap page, and resize the result to exactly `storage.size()` bits.
fn load_allocation_table(disk: &mut DiskManager, page_size: usize) -> Result<Bitmap> {
    let storage_size = disk.size() as usize;
    let bits_per_page = page_size * 8;
    let num_bitmap_pages = (storage_size + bits_per_page - 1) / bits_per_page.max(1);

    let mut bytes = Vec::with_capacity(num_bitmap_pages * page_size);
    for k in 0..num_bitmap_pages {
        let page_id = PageId::new((k * bits_per_page) as u64);
        let page = disk.read_page(page_id)?;
        bytes.extend_from_slice(page.as_slice());
    }
    Ok(Bitmap::from_bytes(&bytes, storage_size))
}
