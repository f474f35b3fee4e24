use std::collections::VecDeque;

use crate::common::Timestamp;

/// Page replacement strategy selected when a buffer pool is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    Fifo,
    Lru,
    Clock,
}

/// Replacer answers one question for the pool: which frame gets reused next.
/// Each variant keeps its own per-frame metadata; the pool reports every pin
/// and unpin so that metadata stays current. Victim selection never picks a
/// pinned frame.
pub enum Replacer {
    Fifo(FifoState),
    Lru(LruState),
    Clock(ClockState),
}

impl Replacer {
    pub fn new(strategy: ReplacementStrategy, num_frames: usize) -> Self {
        match strategy {
            ReplacementStrategy::Fifo => Replacer::Fifo(FifoState::new(num_frames)),
            ReplacementStrategy::Lru => Replacer::Lru(LruState::new(num_frames)),
            ReplacementStrategy::Clock => Replacer::Clock(ClockState::new(num_frames)),
        }
    }

    pub fn strategy(&self) -> ReplacementStrategy {
        match self {
            Replacer::Fifo(_) => ReplacementStrategy::Fifo,
            Replacer::Lru(_) => ReplacementStrategy::Lru,
            Replacer::Clock(_) => ReplacementStrategy::Clock,
        }
    }

    /// Records a pin of the given frame (both cache hits and fresh loads).
    pub fn record_pin(&mut self, frame_idx: usize) {
        match self {
            // FIFO ordering is arrival order; pins do not reorder the queue
            Replacer::Fifo(_) => {}
            Replacer::Lru(state) => state.touch(frame_idx),
            Replacer::Clock(state) => state.reference(frame_idx),
        }
    }

    /// Records an unpin of the given frame.
    pub fn record_unpin(&mut self, frame_idx: usize) {
        match self {
            Replacer::Fifo(_) => {}
            // Recency covers the whole pinned interval: bump on release too
            Replacer::Lru(state) => state.touch(frame_idx),
            Replacer::Clock(_) => {}
        }
    }

    /// Picks the frame to evict, given which frames are currently pinned.
    /// Returns None when every frame is pinned.
    pub fn pick_victim(&mut self, pinned: &[bool]) -> Option<usize> {
        match self {
            Replacer::Fifo(state) => state.pick_victim(pinned),
            Replacer::Lru(state) => state.pick_victim(pinned),
            Replacer::Clock(state) => state.pick_victim(pinned),
        }
    }
}

/// FIFO: frames are reused in arrival order. The queue starts as 0..n so the
/// initial misses fill the pool left to right; whichever index is chosen
/// moves to the tail, making it the newest arrival.
pub struct FifoState {
    queue: VecDeque<usize>,
}

impl FifoState {
    fn new(num_frames: usize) -> Self {
        Self {
            queue: (0..num_frames).collect(),
        }
    }

    fn pick_victim(&mut self, pinned: &[bool]) -> Option<usize> {
        let pos = self.queue.iter().position(|&idx| !pinned[idx])?;
        let victim = self.queue.remove(pos)?;
        self.queue.push_back(victim);
        Some(victim)
    }
}

/// LRU: every pin and unpin stamps the frame with a monotonically increasing
/// counter; the unpinned frame with the smallest stamp is the victim, ties
/// broken by lowest frame index.
pub struct LruState {
    stamps: Vec<Timestamp>,
    clock: Timestamp,
}

impl LruState {
    fn new(num_frames: usize) -> Self {
        Self {
            stamps: vec![0; num_frames],
            clock: 0,
        }
    }

    fn touch(&mut self, frame_idx: usize) {
        self.clock += 1;
        self.stamps[frame_idx] = self.clock;
    }

    fn pick_victim(&mut self, pinned: &[bool]) -> Option<usize> {
        let mut victim: Option<usize> = None;
        for idx in 0..self.stamps.len() {
            if pinned[idx] {
                continue;
            }
            match victim {
                // Strict < keeps the lowest index on ties
                Some(v) if self.stamps[idx] >= self.stamps[v] => {}
                _ => victim = Some(idx),
            }
        }
        if let Some(v) = victim {
            self.touch(v);
        }
        victim
    }
}

/// CLOCK: one reference bit per frame, set on pin. The hand sweeps the
/// frames, clearing set bits as it passes, and evicts the first unpinned
/// frame whose bit is already clear; it then resumes from the victim's
/// successor. Two full sweeps with no victim means every frame is pinned.
pub struct ClockState {
    ref_bits: Vec<bool>,
    hand: usize,
}

impl ClockState {
    fn new(num_frames: usize) -> Self {
        Self {
            ref_bits: vec![false; num_frames],
            hand: 0,
        }
    }

    fn reference(&mut self, frame_idx: usize) {
        self.ref_bits[frame_idx] = true;
    }

    fn pick_victim(&mut self, pinned: &[bool]) -> Option<usize> {
        let n = self.ref_bits.len();
        for _ in 0..2 * n {
            let idx = self.hand;
            self.hand = (self.hand + 1) % n;

            if pinned[idx] {
                continue;
            }
            if self.ref_bits[idx] {
                self.ref_bits[idx] = false;
                continue;
            }
            return Some(idx);
        }
        None
    }
}
