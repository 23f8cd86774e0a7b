use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::types::{Lsn, PageId};
use crate::storage::buffer::frame::{Frame, PageData};
use crate::storage::buffer::manager::BufferPoolManager;

/// Scoped pin on a page, without a latch.
///
/// Accessors latch the frame per call. Dropping the guard releases the pin
/// and reports whether any mutable access happened.
pub struct PageGuard<'a> {
    bpm: &'a BufferPoolManager,
    frame: &'a Frame,
    page_id: PageId,
    dirty: bool,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame: &'a Frame, page_id: PageId) -> Self {
        Self {
            bpm,
            frame,
            page_id,
            dirty: false,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Latch the page for shared access.
    pub fn data(&self) -> RwLockReadGuard<'a, Box<PageData>> {
        self.frame.data()
    }

    /// Latch the page for exclusive access and mark it dirty.
    pub fn data_mut(&mut self) -> RwLockWriteGuard<'a, Box<PageData>> {
        self.dirty = true;
        self.frame.data_mut()
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        self.bpm.unpin_from_guard(self.page_id, self.dirty, None);
    }
}

/// Scoped pin plus shared latch, held for the guard's lifetime.
pub struct ReadPageGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    latch: Option<RwLockReadGuard<'a, Box<PageData>>>,
}

impl<'a> ReadPageGuard<'a> {
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame: &'a Frame, page_id: PageId) -> Self {
        Self {
            bpm,
            page_id,
            latch: Some(frame.data()),
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> &PageData {
        self.latch.as_ref().expect("read latch released only on drop")
    }
}

impl Drop for ReadPageGuard<'_> {
    fn drop(&mut self) {
        // Latch release strictly precedes re-entering the manager.
        self.latch.take();
        self.bpm.unpin_from_guard(self.page_id, false, None);
    }
}

/// Scoped pin plus exclusive latch.
///
/// Mutable access marks the page dirty; `set_lsn` records the log position
/// the contents are covered by, handed to the manager on drop.
pub struct WritePageGuard<'a> {
    bpm: &'a BufferPoolManager,
    page_id: PageId,
    latch: Option<RwLockWriteGuard<'a, Box<PageData>>>,
    dirty: bool,
    lsn: Option<Lsn>,
}

impl<'a> WritePageGuard<'a> {
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame: &'a Frame, page_id: PageId) -> Self {
        Self {
            bpm,
            page_id,
            latch: Some(frame.data_mut()),
            dirty: false,
            lsn: None,
        }
    }

    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    pub fn data(&self) -> &PageData {
        self.latch.as_ref().expect("write latch released only on drop")
    }

    pub fn data_mut(&mut self) -> &mut PageData {
        self.dirty = true;
        self.latch.as_mut().expect("write latch released only on drop")
    }

    /// Record the LSN of the last log record covering this guard's writes.
    /// The write-ahead log is flushed up to it before the page goes to disk.
    pub fn set_lsn(&mut self, lsn: Lsn) {
        self.lsn = Some(lsn);
    }
}

impl Drop for WritePageGuard<'_> {
    fn drop(&mut self) {
        self.latch.take();
        self.bpm.unpin_from_guard(self.page_id, self.dirty, self.lsn);
    }
}
