//! Partitions: the sharded metadata that lets disjoint pages be allocated,
//! pinned, and evicted concurrently without a single global lock.
//!
//! `partitionId = pageId mod numPartitions`. Each partition owns its own
//! free-page list, free-frame queue, and page-to-frame map behind a single
//! mutex, per the spec's data model. A frame belongs to exactly one
//! partition for its whole life (`frameId mod numPartitions`), so eviction
//! never has to cross partition boundaries.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::common::{FrameId, PageId};

/// One shard of the pool's allocation metadata.
#[derive(Default)]
pub struct PartitionState {
    /// Pages allocated on disk but not logically in use; candidates for
    /// the next `alloc`.
    pub free_pages: VecDeque<PageId>,
    /// Frames with `in_use = false` belonging to this partition.
    pub free_frames: VecDeque<FrameId>,
    /// Pages currently resident in one of this partition's frames.
    pub page_to_frame: HashMap<PageId, FrameId>,
}

pub struct Partition {
    state: Mutex<PartitionState>,
}

impl Partition {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PartitionState::default()),
        }
    }

    #[inline]
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, PartitionState> {
        self.state.lock()
    }
}

impl Default for Partition {
    fn default() -> Self {
        Self::new()
    }
}
