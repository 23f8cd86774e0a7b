use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::types::{FrameId, Lsn, PageId, INVALID_LSN, INVALID_PAGE_ID, PAGE_SIZE};

/// Page-sized byte buffer held by a frame.
pub type PageData = [u8; PAGE_SIZE];

/// An in-memory slot holding at most one page of data.
///
/// The reader-writer latch protects the byte buffer only. Frame metadata
/// (`FrameMeta`) is owned by the buffer pool manager and guarded by its
/// bookkeeping mutex, so the latch is never needed to pin or unpin.
pub struct Frame {
    frame_id: FrameId,
    data: RwLock<Box<PageData>>,
}

impl Frame {
    pub(crate) fn new(frame_id: FrameId) -> Self {
        Self {
            frame_id,
            data: RwLock::new(Box::new([0; PAGE_SIZE])),
        }
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Latch the buffer for shared access.
    pub fn data(&self) -> RwLockReadGuard<'_, Box<PageData>> {
        self.data.read()
    }

    /// Latch the buffer for exclusive access.
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Box<PageData>> {
        self.data.write()
    }

    /// Zero the buffer.
    pub(crate) fn reset(&self) {
        self.data.write().fill(0);
    }
}

/// Bookkeeping for one frame. Lives inside the manager's mutex; a frame is
/// free exactly when `page_id == INVALID_PAGE_ID`.
#[derive(Debug)]
pub(crate) struct FrameMeta {
    pub page_id: PageId,
    pub pin_count: u32,
    pub is_dirty: bool,
    /// LSN of the last log record covering this page's contents, or
    /// `INVALID_LSN` when nothing was logged for it.
    pub page_lsn: Lsn,
}

impl FrameMeta {
    pub(crate) fn free() -> Self {
        Self {
            page_id: INVALID_PAGE_ID,
            pin_count: 0,
            is_dirty: false,
            page_lsn: INVALID_LSN,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::free();
    }
}
