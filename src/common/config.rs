//! Runtime configuration for the buffer pool and its storage adapter.
//!
//! Unlike the fixed `PAGE_SIZE` constant of earlier revisions of this crate,
//! page size is a run-time property of the database file: it is fixed when
//! a file is created and recovered from the file's superblock when it is
//! reopened (see [`crate::storage::disk_manager`]).

/// Default page size used when creating a new database, in KiB.
pub const DEFAULT_PAGE_SIZE_KB: usize = 4;

/// Default number of partitions, matching the source's default.
pub const DEFAULT_NUM_PARTITIONS: u32 = 16;

/// Configuration consumed by [`crate::buffer::BufferPool::open`] and
/// [`crate::buffer::BufferPool::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferPoolConfig {
    /// Total size of the in-memory cache, in KiB. Must be an exact multiple
    /// of `pageSizeKB`.
    pub pool_size_kb: usize,

    /// Number of consecutive pages to prefetch after a pin. Zero disables
    /// prefetching regardless of whether an executor was supplied.
    pub prefetching_degree: u16,

    /// Number of partitions sharding the pool's metadata. Must be non-zero.
    pub num_partitions: u32,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size_kb: 1024 * 1024,
            prefetching_degree: 0,
            num_partitions: DEFAULT_NUM_PARTITIONS,
        }
    }
}

impl BufferPoolConfig {
    /// Number of frames the pool will hold, given a page size.
    pub fn num_frames(&self, page_size_kb: usize) -> usize {
        self.pool_size_kb / page_size_kb
    }
}

/// Configuration consumed only by
/// [`crate::buffer::BufferPool::create`], describing the storage file
/// to create. `open` recovers page size from the existing file instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageConfig {
    /// Page size of the database being created, in KiB.
    pub page_size_kb: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            page_size_kb: DEFAULT_PAGE_SIZE_KB,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_frames() {
        let cfg = BufferPoolConfig {
            pool_size_kb: 256,
            prefetching_degree: 0,
            num_partitions: 4,
        };
        assert_eq!(cfg.num_frames(4), 64);
    }

    #[test]
    fn test_defaults() {
        let cfg = BufferPoolConfig::default();
        assert_eq!(cfg.num_partitions, DEFAULT_NUM_PARTITIONS);
        assert_eq!(StorageConfig::default().page_size_kb, DEFAULT_PAGE_SIZE_KB);
    }
}
