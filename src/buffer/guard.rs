//! The RAII pin handle returned by `BufferPool::pin`.
//!
//! The spec's `BufferHandler` is `{ buffer: pointer, pageId, frameId }`,
//! valid only while the page is pinned, with an explicit `unpin` call.
//! Per the spec's design note ("Implementations in a strong-ownership
//! language should express the handler as a guard type whose destructor
//! calls unpin"), this crate expresses it as [`PinGuard`]: a guard whose
//! `Drop` impl calls `unpin`, so a pin can never outlive its matching
//! unpin by programmer error.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};

use super::frame::FrameContent;
use super::pool::BufferPool;

/// A pinned page. Dereferences to the page's bytes; dropping it unpins
/// the page.
pub struct PinGuard {
    pool: Arc<BufferPool>,
    frame_id: FrameId,
    page_id: PageId,
}

impl PinGuard {
    pub(crate) fn new(pool: Arc<BufferPool>, frame_id: FrameId, page_id: PageId) -> Self {
        Self {
            pool,
            frame_id,
            page_id,
        }
    }

    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Shared access to the page's bytes.
    pub fn read(&self) -> PageBytesRead<'_> {
        PageBytesRead {
            guard: self.pool.frame(self.frame_id).read(),
        }
    }

    /// Exclusive access to the page's bytes. Marks the frame dirty: any
    /// write through this guard is assumed to need persisting, matching
    /// the spec's "clients must call setDirty before or during mutating
    /// the buffer" requirement.
    pub fn write(&self) -> PageBytesWrite<'_> {
        let mut guard = self.pool.frame(self.frame_id).write();
        guard.dirty = true;
        PageBytesWrite { guard }
    }
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.pool.unpin_by_frame(self.frame_id);
    }
}

/// Shared view of a pinned page's bytes.
pub struct PageBytesRead<'a> {
    guard: RwLockReadGuard<'a, FrameContent>,
}

impl Deref for PageBytesRead<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.guard.buffer.as_slice()
    }
}

/// Exclusive view of a pinned page's bytes.
pub struct PageBytesWrite<'a> {
    guard: RwLockWriteGuard<'a, FrameContent>,
}

impl Deref for PageBytesWrite<'_> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.guard.buffer.as_slice()
    }
}

impl DerefMut for PageBytesWrite<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        self.guard.buffer.as_mut_slice()
    }
}
