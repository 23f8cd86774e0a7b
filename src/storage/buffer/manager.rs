use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::common::types::{AccessType, FrameId, Lsn, PageId, INVALID_LSN, INVALID_PAGE_ID};
use crate::storage::buffer::error::BufferPoolError;
use crate::storage::buffer::frame::{Frame, FrameMeta};
use crate::storage::buffer::guard::{PageGuard, ReadPageGuard, WritePageGuard};
use crate::storage::buffer::replacer::LruKReplacer;
use crate::storage::disk::DiskManager;
use crate::storage::log::LogManager;

/// Bookkeeping guarded by the manager mutex: the page table, the free
/// list, every frame's metadata, and the page id counter. Replacer calls
/// made by the manager always happen while this lock is held.
struct PoolState {
    page_table: HashMap<PageId, FrameId>,
    free_list: VecDeque<FrameId>,
    meta: Vec<FrameMeta>,
    next_page_id: PageId,
}

/// In-memory cache of fixed-size pages backed by the disk manager.
///
/// Every access to persistent data goes through here: callers fetch or
/// create pages, receive pinned frames (or scoped guards), and the LRU-K
/// replacer decides which resident page gives up its frame under pressure.
/// Dirty pages are written back on eviction and on explicit flush.
///
/// Disk reads on a fetch miss happen with the bookkeeping mutex held; the
/// per-frame latches only ever protect page bytes, never bookkeeping, so
/// the lock order is always manager mutex before frame latch.
pub struct BufferPoolManager {
    pool_size: usize,
    frames: Vec<Frame>,
    state: Mutex<PoolState>,
    replacer: LruKReplacer,
    disk_manager: Arc<DiskManager>,
    log_manager: Option<Arc<LogManager>>,
}

impl BufferPoolManager {
    pub fn new(
        pool_size: usize,
        replacer_k: usize,
        disk_manager: Arc<DiskManager>,
        log_manager: Option<Arc<LogManager>>,
    ) -> Self {
        assert!(pool_size >= 1, "pool size must be at least 1");
        assert!(replacer_k >= 1, "replacer k must be at least 1");

        let frames = (0..pool_size).map(Frame::new).collect();
        let meta = (0..pool_size).map(|_| FrameMeta::free()).collect();
        let free_list = (0..pool_size).collect();

        Self {
            pool_size,
            frames,
            state: Mutex::new(PoolState {
                page_table: HashMap::new(),
                free_list,
                meta,
                next_page_id: 0,
            }),
            replacer: LruKReplacer::new(pool_size, replacer_k),
            disk_manager,
            log_manager,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Allocate a brand-new page, pin it, and return it with its frame.
    pub fn new_page(&self) -> Result<(PageId, &Frame), BufferPoolError> {
        let mut state = self.state.lock();
        if state.free_list.is_empty() && self.replacer.size() == 0 {
            return Err(BufferPoolError::PoolExhausted);
        }
        let frame_id = self.get_free_frame(&mut state)?;

        let page_id = state.next_page_id;
        state.next_page_id += 1;

        self.frames[frame_id].reset();
        let meta = &mut state.meta[frame_id];
        meta.page_id = page_id;
        meta.pin_count = 1;
        meta.is_dirty = false;
        meta.page_lsn = INVALID_LSN;
        state.page_table.insert(page_id, frame_id);

        self.replacer.record_access(frame_id, AccessType::Unknown);
        self.replacer.set_evictable(frame_id, false);

        Ok((page_id, &self.frames[frame_id]))
    }

    /// Fetch a page, reading it from disk if it is not resident. The
    /// returned frame is pinned; release with `unpin_page`.
    pub fn fetch_page(
        &self,
        page_id: PageId,
        access_type: AccessType,
    ) -> Result<&Frame, BufferPoolError> {
        let mut state = self.state.lock();

        if let Some(&frame_id) = state.page_table.get(&page_id) {
            state.meta[frame_id].pin_count += 1;
            self.replacer.record_access(frame_id, access_type);
            self.replacer.set_evictable(frame_id, false);
            return Ok(&self.frames[frame_id]);
        }

        if state.free_list.is_empty() && self.replacer.size() == 0 {
            return Err(BufferPoolError::PoolExhausted);
        }
        let frame_id = self.get_free_frame(&mut state)?;

        // Read the page contents into the frame. The bookkeeping mutex
        // stays held across the read, so nobody can observe the frame
        // half-materialized.
        {
            let mut data = self.frames[frame_id].data_mut();
            if let Err(e) = self.disk_manager.read_page(page_id, &mut data) {
                drop(data);
                // The frame was carved out but never installed; hand it
                // back so no state change survives the failure.
                self.frames[frame_id].reset();
                state.meta[frame_id].reset();
                state.free_list.push_back(frame_id);
                return Err(e.into());
            }
        }

        let meta = &mut state.meta[frame_id];
        meta.page_id = page_id;
        meta.pin_count = 1;
        meta.is_dirty = false;
        meta.page_lsn = INVALID_LSN;
        state.page_table.insert(page_id, frame_id);

        self.replacer.record_access(frame_id, access_type);
        self.replacer.set_evictable(frame_id, false);

        Ok(&self.frames[frame_id])
    }

    /// Drop one pin on `page_id`, OR-ing in the dirty flag. Returns false
    /// when the page is not resident or its pin count is already zero.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool, _access_type: AccessType) -> bool {
        self.unpin_page_with_lsn(page_id, is_dirty, None)
    }

    /// Unpin, additionally recording the LSN of the last log record that
    /// covered the caller's writes. The WAL is flushed up to a page's
    /// recorded LSN before the page itself is ever written out.
    pub fn unpin_page_with_lsn(&self, page_id: PageId, is_dirty: bool, lsn: Option<Lsn>) -> bool {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return false;
        };
        let meta = &mut state.meta[frame_id];
        if meta.pin_count == 0 {
            return false;
        }
        meta.pin_count -= 1;
        meta.is_dirty |= is_dirty;
        if let Some(lsn) = lsn {
            meta.page_lsn = meta.page_lsn.max(lsn);
        }
        if meta.pin_count == 0 {
            self.replacer.set_evictable(frame_id, true);
        }
        true
    }

    /// Write `page_id`'s buffer to disk and clear its dirty flag. Returns
    /// `Ok(false)` when the page is not resident.
    ///
    /// Panics on `INVALID_PAGE_ID`.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool, BufferPoolError> {
        assert!(page_id != INVALID_PAGE_ID, "flush of the invalid page id");
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return Ok(false);
        };
        self.flush_frame(&mut state, frame_id)?;
        Ok(true)
    }

    /// Write every resident page to disk and clear all dirty flags.
    pub fn flush_all_pages(&self) -> Result<(), BufferPoolError> {
        let mut state = self.state.lock();
        let frame_ids: Vec<FrameId> = state.page_table.values().copied().collect();
        for frame_id in frame_ids {
            self.flush_frame(&mut state, frame_id)?;
        }
        Ok(())
    }

    /// Drop `page_id` from the pool. Returns true when the page is absent
    /// (vacuously deleted) or successfully removed, false when pinned.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut state = self.state.lock();
        let Some(&frame_id) = state.page_table.get(&page_id) else {
            return true;
        };
        if state.meta[frame_id].pin_count > 0 {
            return false;
        }
        state.page_table.remove(&page_id);
        self.replacer.remove(frame_id);
        state.free_list.push_back(frame_id);
        state.meta[frame_id].reset();
        self.frames[frame_id].reset();
        self.disk_manager.deallocate_page(page_id);
        true
    }

    /// Allocate a new page behind a basic guard.
    pub fn new_page_guarded(&self) -> Result<(PageId, PageGuard<'_>), BufferPoolError> {
        let (page_id, frame) = self.new_page()?;
        Ok((page_id, PageGuard::new(self, frame, page_id)))
    }

    /// Fetch behind a basic guard: pinned, unlatched.
    pub fn fetch_page_basic(&self, page_id: PageId) -> Result<PageGuard<'_>, BufferPoolError> {
        let frame = self.fetch_page(page_id, AccessType::Unknown)?;
        Ok(PageGuard::new(self, frame, page_id))
    }

    /// Fetch behind a read guard: pinned, shared latch held until drop.
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<ReadPageGuard<'_>, BufferPoolError> {
        let frame = self.fetch_page(page_id, AccessType::Unknown)?;
        Ok(ReadPageGuard::new(self, frame, page_id))
    }

    /// Fetch behind a write guard: pinned, exclusive latch held until drop.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<WritePageGuard<'_>, BufferPoolError> {
        let frame = self.fetch_page(page_id, AccessType::Unknown)?;
        Ok(WritePageGuard::new(self, frame, page_id))
    }

    /// Whether `page_id` currently occupies a frame.
    pub fn is_resident(&self, page_id: PageId) -> bool {
        self.state.lock().page_table.contains_key(&page_id)
    }

    /// Pin count of a resident page, or `None` when not resident.
    pub fn pin_count(&self, page_id: PageId) -> Option<u32> {
        let state = self.state.lock();
        let &frame_id = state.page_table.get(&page_id)?;
        Some(state.meta[frame_id].pin_count)
    }

    /// Number of frames on the free list.
    pub fn free_frame_count(&self) -> usize {
        self.state.lock().free_list.len()
    }

    /// Number of resident, unpinned frames the replacer could evict.
    pub fn evictable_count(&self) -> usize {
        self.replacer.size()
    }

    /// Pin release driven by guard drop. Infallible: a live guard implies
    /// a resident, pinned page.
    pub(crate) fn unpin_from_guard(&self, page_id: PageId, is_dirty: bool, lsn: Option<Lsn>) {
        let released = self.unpin_page_with_lsn(page_id, is_dirty, lsn);
        debug_assert!(released, "guard dropped for page {} with no pin", page_id);
    }

    /// Pick a frame for a new resident page: free list first, then an
    /// eviction victim. Callers have already verified one is obtainable.
    fn get_free_frame(&self, state: &mut PoolState) -> Result<FrameId, BufferPoolError> {
        if let Some(frame_id) = state.free_list.pop_front() {
            return Ok(frame_id);
        }

        let frame_id = self
            .replacer
            .evict()
            .expect("eviction requested with no evictable frame");
        let old_page_id = state.meta[frame_id].page_id;

        if state.meta[frame_id].is_dirty {
            debug!("evicting dirty page {} from frame {}", old_page_id, frame_id);
            if let Err(e) = self.flush_frame(state, frame_id) {
                // Re-register the victim so the pool stays consistent; its
                // access history is gone but the frame remains tracked.
                self.replacer.record_access(frame_id, AccessType::Unknown);
                self.replacer.set_evictable(frame_id, true);
                return Err(e);
            }
        }
        state.page_table.remove(&old_page_id);
        Ok(frame_id)
    }

    /// Write a resident frame's buffer to disk and clear its dirty flag,
    /// flushing the WAL up to the page's LSN first.
    ///
    /// Runs with the bookkeeping mutex already held, which is what lets
    /// the eviction path call it mid-selection; `flush_page` is the locked
    /// public entry point.
    fn flush_frame(&self, state: &mut PoolState, frame_id: FrameId) -> Result<(), BufferPoolError> {
        let meta = &mut state.meta[frame_id];
        if let Some(log_manager) = &self.log_manager {
            if meta.page_lsn != INVALID_LSN {
                log_manager.flush_till_lsn(meta.page_lsn)?;
            }
        }
        let data = self.frames[frame_id].data();
        self.disk_manager.write_page(meta.page_id, &data)?;
        drop(data);
        meta.is_dirty = false;
        Ok(())
    }
}
