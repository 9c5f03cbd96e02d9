//! The Clock-Sweep victim picker (`getEmptySlot`).
//!
//! A two-pass second-chance scan over the global frame table, filtered to
//! one partition's residence set, driven by a single shared round-robin
//! cursor. The cursor is shared across every partition because the spec
//! models it as one clock hand sweeping the whole frame table; each
//! partition simply ignores frames that don't belong to it.
//!
//! The per-partition filter means a sweep triggered while holding
//! partition `p`'s lock only ever mutates partition `p`'s `page_to_frame`
//! (a victim frame always belongs to `p`), so no cross-partition lock is
//! ever acquired here.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::common::error::{Error, Result};
use crate::common::FrameId;
use crate::storage::page::Page;

use super::super::frame::Frame;
use super::super::partition::PartitionState;

/// Shared clock-sweep state: just the rotating cursor.
pub struct ClockSweep {
    cursor: AtomicU64,
}

impl ClockSweep {
    pub fn new() -> Self {
        Self {
            cursor: AtomicU64::new(0),
        }
    }

    /// Obtain a frame id belonging to `partition_id`, either from the
    /// partition's free-frame queue or by evicting an unpinned frame of
    /// that partition via the clock sweep.
    ///
    /// `write_back` is invoked with the victim's current page id and
    /// buffer if it is dirty, while the frame's write lock is held; it
    /// must write the buffer to disk.
    pub fn get_empty_slot<F>(
        &self,
        frames: &[Frame],
        num_partitions: u32,
        partition_id: u32,
        partition_state: &mut PartitionState,
        mut write_back: F,
    ) -> Result<FrameId>
    where
        F: FnMut(crate::common::PageId, &Page) -> Result<()>,
    {
        if let Some(fid) = partition_state.free_frames.pop_front() {
            frames[fid.index()].write().in_use = true;
            return Ok(fid);
        }

        let frame_count = frames.len() as u64;
        if frame_count == 0 {
            return Err(Error::OutOfMemory(partition_id));
        }

        let mut seen_unpinned = false;
        let mut steps: u64 = 0;

        loop {
            if steps >= frame_count && !seen_unpinned {
                return Err(Error::OutOfMemory(partition_id));
            }

            let idx = self.cursor.fetch_add(1, Ordering::SeqCst) % frame_count;
            let fid = FrameId::new(idx);
            steps += 1;

            if (idx % num_partitions as u64) as u32 != partition_id {
                continue;
            }

            let mut content = frames[fid.index()].write();
            if content.ref_count > 0 {
                continue;
            }
            seen_unpinned = true;

            if content.usage_count == 0 {
                if content.dirty {
                    write_back(content.page_id, &content.buffer)?;
                    content.dirty = false;
                }
                partition_state.page_to_frame.remove(&content.page_id);
                tracing::trace!(frame = fid.0, "clock sweep selected victim");
                return Ok(fid);
            }
            content.usage_count -= 1;
        }
    }
}

impl Default for ClockSweep {
    fn default() -> Self {
        Self::new()
    }
}
