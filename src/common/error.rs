//! The closed error taxonomy for the buffer pool.
//!
//! Every fallible operation returns [`Result<T>`]. Success is `Ok(())` (or
//! `Ok(value)`); there is no `NoError` variant. The five
//! `checkConsistency`-only variants are never returned by any other
//! operation.

use crate::common::{FrameId, PageId};

/// Errors produced by the buffer pool and its storage adapter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `poolSizeKB` is not an exact multiple of `pageSizeKB`.
    #[error("pool size ({pool_size_kb} KB) is not a multiple of page size ({page_size_kb} KB)")]
    PoolSizeNotMultipleOfPageSize {
        pool_size_kb: usize,
        page_size_kb: usize,
    },

    /// Prefetching was requested but the supplied executor reports zero
    /// worker threads.
    #[error("prefetching degree > 0 but the executor has no threads available")]
    NoThreadsAvailableForPrefetching,

    /// Operation on a page id beyond the storage adapter's current size.
    #[error("page {0} has not been allocated")]
    PageNotAllocated(PageId),

    /// Operation on a page id reserved for the allocation bitmap.
    #[error("page {0} is protected and cannot be accessed by clients")]
    UnableToAccessProtectedPage(PageId),

    /// `unpin`/`setDirty` on a page id that is not currently resident.
    #[error("page {0} is not present in the buffer pool")]
    PageNotPresent(PageId),

    /// The Clock-Sweep victim picker found no evictable frame.
    #[error("out of memory: every frame in partition {0} is pinned")]
    OutOfMemory(u32),

    /// `close`/`checkpoint` (or any other op) called on a pool that has not
    /// been successfully `open`ed or `create`d.
    #[error("the buffer pool has not been opened")]
    PoolNotOpen,

    /// `checkConsistency`: an allocated page id also appears in a
    /// partition's `freePages`.
    #[error("allocated page {0} found in a partition's free list")]
    AllocatedPageInFreelist(PageId),

    /// `checkConsistency`: a protected page id appears in a partition's
    /// `freePages`.
    #[error("protected page {0} found in a partition's free list")]
    ProtectedPageInFreelist(PageId),

    /// `checkConsistency`: an unallocated, unprotected page id is missing
    /// from every partition's `freePages`.
    #[error("free page {0} not found in any partition's free list")]
    FreePageNotInFreelist(PageId),

    /// `checkConsistency`: an unallocated page id is still mapped to a
    /// frame in some partition's `pageToFrame`.
    #[error("free page {0} is still mapped to frame {1}")]
    FreePageMappedToBuffer(PageId, FrameId),

    /// `checkConsistency`: a frame descriptor's `inUse`/`pageId` fields are
    /// inconsistent with the partition map that references it.
    #[error("buffer descriptor for frame {0} holds incorrect data")]
    BufferDescriptorIncorrectData(FrameId),

    /// Forwarded unchanged from the storage adapter or its underlying file.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage adapter's on-disk superblock is missing or unreadable.
    #[error("storage file has no valid superblock: {0}")]
    InvalidSuperblock(String),
}

pub type Result<T> = std::result::Result<T, Error>;
