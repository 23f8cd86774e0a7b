use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::common::types::{AccessType, FrameId};

/// Access history tracked for a single frame.
struct LruKNode {
    /// Up to the `k` most recent access timestamps, oldest first.
    history: VecDeque<u64>,
    is_evictable: bool,
}

struct ReplacerState {
    node_store: HashMap<FrameId, LruKNode>,
    /// Frames with fewer than `k` recorded accesses, in order of first
    /// access. These have infinite backward k-distance and are victimized
    /// first, FIFO.
    cold: VecDeque<FrameId>,
    /// Frames with at least `k` accesses, ascending by the timestamp of
    /// their k-th most recent access (the front of the node's history).
    warm: Vec<FrameId>,
    current_timestamp: u64,
    /// Number of tracked frames currently marked evictable.
    curr_size: usize,
}

impl ReplacerState {
    /// Drop `frame_id` from whichever pool currently holds it.
    fn detach(&mut self, frame_id: FrameId) {
        if let Some(pos) = self.cold.iter().position(|&f| f == frame_id) {
            self.cold.remove(pos);
        } else if let Some(pos) = self.warm.iter().position(|&f| f == frame_id) {
            self.warm.remove(pos);
        }
    }

    /// Insert `frame_id` into the warm pool, keeping it sorted by the
    /// front-of-history timestamp.
    fn insert_warm(&mut self, frame_id: FrameId, kth_timestamp: u64) {
        let pos = self
            .warm
            .iter()
            .position(|f| {
                let front = *self.node_store[f]
                    .history
                    .front()
                    .expect("warm node has history");
                front > kth_timestamp
            })
            .unwrap_or(self.warm.len());
        self.warm.insert(pos, frame_id);
    }
}

/// LRU-K replacement policy over buffer pool frames.
///
/// The victim is the evictable frame whose k-th most recent access is
/// oldest. Frames with fewer than `k` recorded accesses count as having
/// infinite backward k-distance, so they go first, ordered by earliest
/// first access.
pub struct LruKReplacer {
    state: Mutex<ReplacerState>,
    num_frames: usize,
    k: usize,
}

impl LruKReplacer {
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k >= 1, "replacer k must be at least 1");
        Self {
            state: Mutex::new(ReplacerState {
                node_store: HashMap::with_capacity(num_frames),
                cold: VecDeque::new(),
                warm: Vec::new(),
                current_timestamp: 0,
                curr_size: 0,
            }),
            num_frames,
            k,
        }
    }

    /// Record an access to `frame_id` at the next logical timestamp.
    ///
    /// New frames start in the cold pool and non-evictable. A frame moves
    /// to the warm pool on its k-th access and is re-positioned on every
    /// access after that.
    ///
    /// Panics if `frame_id` is not in `[0, num_frames)`.
    pub fn record_access(&self, frame_id: FrameId, _access_type: AccessType) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();
        state.current_timestamp += 1;
        let ts = state.current_timestamp;

        if !state.node_store.contains_key(&frame_id) {
            let mut history = VecDeque::with_capacity(self.k);
            history.push_back(ts);
            state.node_store.insert(
                frame_id,
                LruKNode {
                    history,
                    is_evictable: false,
                },
            );
            state.cold.push_back(frame_id);
            return;
        }

        let k = self.k;
        let kth_timestamp = {
            let node = state
                .node_store
                .get_mut(&frame_id)
                .expect("node checked present");
            node.history.push_back(ts);
            if node.history.len() < k {
                // Still short of k accesses; FIFO position is unchanged.
                return;
            }
            if node.history.len() > k {
                node.history.pop_front();
            }
            *node.history.front().expect("history is non-empty")
        };

        state.detach(frame_id);
        state.insert_warm(frame_id, kth_timestamp);
    }

    /// Toggle whether `frame_id` may be chosen as a victim. Idempotent;
    /// no-op for untracked frames.
    ///
    /// Panics if `frame_id` is not in `[0, num_frames)`.
    pub fn set_evictable(&self, frame_id: FrameId, evictable: bool) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();
        let Some(node) = state.node_store.get_mut(&frame_id) else {
            return;
        };
        if node.is_evictable == evictable {
            return;
        }
        node.is_evictable = evictable;
        if evictable {
            state.curr_size += 1;
        } else {
            state.curr_size -= 1;
        }
    }

    /// Select and untrack the eviction victim, if any frame is evictable.
    pub fn evict(&self) -> Option<FrameId> {
        let mut state = self.state.lock();
        let victim = state
            .cold
            .iter()
            .copied()
            .find(|f| state.node_store[f].is_evictable)
            .or_else(|| {
                state
                    .warm
                    .iter()
                    .copied()
                    .find(|f| state.node_store[f].is_evictable)
            })?;
        state.detach(victim);
        state.node_store.remove(&victim);
        state.curr_size -= 1;
        Some(victim)
    }

    /// Forcibly stop tracking `frame_id`, dropping its access history.
    /// No-op when untracked.
    ///
    /// Panics if the frame is tracked but not evictable, or if `frame_id`
    /// is not in `[0, num_frames)`.
    pub fn remove(&self, frame_id: FrameId) {
        self.check_frame_id(frame_id);
        let mut state = self.state.lock();
        let Some(node) = state.node_store.get(&frame_id) else {
            return;
        };
        assert!(
            node.is_evictable,
            "remove called on non-evictable frame {}",
            frame_id
        );
        state.detach(frame_id);
        state.node_store.remove(&frame_id);
        state.curr_size -= 1;
    }

    /// Number of frames currently marked evictable.
    pub fn size(&self) -> usize {
        self.state.lock().curr_size
    }

    fn check_frame_id(&self, frame_id: FrameId) {
        assert!(
            frame_id < self.num_frames,
            "frame id {} out of range for replacer over {} frames",
            frame_id,
            self.num_frames
        );
    }
}
