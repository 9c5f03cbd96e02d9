//! Frame descriptors: the in-memory slots that cache pages.

use parking_lot::RwLock;

use crate::common::PageId;
use crate::storage::page::Page;

/// The mutable state of a frame: pin/usage bookkeeping, which page
/// currently occupies it, and its buffer. A single reader/writer lock
/// guards all of it together, per the spec's data model ("contentLock — a
/// reader/writer lock guarding the mutable fields above and the buffer
/// bytes").
pub struct FrameContent {
    /// How many live pin handles reference this frame.
    pub ref_count: u64,
    /// Clock-sweep second-chance counter.
    pub usage_count: u64,
    /// Which page currently occupies the frame.
    pub page_id: PageId,
    /// Buffer content differs from disk.
    pub dirty: bool,
    /// The frame currently holds a page (even if unpinned).
    pub in_use: bool,
    /// The frame's page-sized memory region.
    pub buffer: Page,
}

impl FrameContent {
    fn new(page_size: usize) -> Self {
        Self {
            ref_count: 0,
            usage_count: 0,
            page_id: PageId::new(0),
            dirty: false,
            in_use: false,
            buffer: Page::new(page_size),
        }
    }

    /// Clear everything except the buffer's backing memory, which is
    /// reused for whatever page occupies the frame next.
    pub fn reset(&mut self) {
        self.ref_count = 0;
        self.usage_count = 0;
        self.page_id = PageId::new(0);
        self.dirty = false;
        self.in_use = false;
        self.buffer.reset();
    }
}

/// One frame of the pool's frame table. Frames are stored in a fixed
/// `Vec<Frame>`, indexed by [`crate::common::FrameId`]; they are never
/// moved or resized after the pool opens.
pub struct Frame {
    content: RwLock<FrameContent>,
}

impl Frame {
    pub fn new(page_size: usize) -> Self {
        Self {
            content: RwLock::new(FrameContent::new(page_size)),
        }
    }

    #[inline]
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, FrameContent> {
        self.content.read()
    }

    #[inline]
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, FrameContent> {
        self.content.write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frame_is_empty() {
        let frame = Frame::new(4096);
        let content = frame.read();
        assert!(!content.in_use);
        assert_eq!(content.ref_count, 0);
        assert_eq!(content.buffer.size(), 4096);
    }

    #[test]
    fn test_reset_clears_metadata_but_keeps_buffer_size() {
        let frame = Frame::new(4096);
        {
            let mut content = frame.write();
            content.ref_count = 3;
            content.usage_count = 2;
            content.dirty = true;
            content.in_use = true;
            content.buffer.as_mut_slice()[0] = 0xFF;
        }
        {
            let mut content = frame.write();
            content.reset();
            assert_eq!(content.ref_count, 0);
            assert_eq!(content.usage_count, 0);
            assert!(!content.dirty);
            assert!(!content.in_use);
            assert_eq!(content.buffer.as_slice()[0], 0);
            assert_eq!(content.buffer.size(), 4096);
        }
    }
}
