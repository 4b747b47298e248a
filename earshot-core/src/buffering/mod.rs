//! Bounded frame ring with a logical index space.
//!
//! `FrameRing` stores the most recent `capacity` frames. Positions are
//! logical frame counts relative to the current origin: evicting the head
//! shifts the origin forward by one, so every outstanding logical pointer
//! (windower cursor, segment start, pending segment end) must be rewound by
//! the eviction count returned from [`FrameRing::append`]. A pointer that
//! would go negative clamps to zero — the frames it referenced are gone,
//! which is the bounded-history trade-off, not an error.

pub mod frame;

use std::collections::VecDeque;

use crate::buffering::frame::AudioFrame;

/// Fixed-logical-capacity store of resampled frames.
#[derive(Debug)]
pub struct FrameRing {
    frames: VecDeque<AudioFrame>,
    capacity: usize,
    evicted: u64,
}

impl FrameRing {
    /// Create an empty ring holding at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            evicted: 0,
        }
    }

    /// Append a frame to the tail, evicting the head if the bound would be
    /// exceeded. Returns the number of frames evicted (0 or 1); the caller
    /// rewinds its logical pointers by that amount.
    pub fn append(&mut self, frame: AudioFrame) -> usize {
        self.frames.push_back(frame);
        if self.frames.len() > self.capacity {
            self.frames.pop_front();
            self.evicted += 1;
            1
        } else {
            0
        }
    }

    /// Frames in `[start, end)` relative to the current logical origin.
    ///
    /// # Panics
    /// Panics when `start > end` or `end > len()` — callers derive both
    /// bounds from pointers kept valid via [`FrameRing::append`]'s return.
    pub fn slice(&self, start: usize, end: usize) -> impl Iterator<Item = &AudioFrame> {
        assert!(
            start <= end && end <= self.frames.len(),
            "slice [{start}, {end}) out of bounds for ring of len {}",
            self.frames.len()
        );
        self.frames.range(start..end)
    }

    /// Number of frames currently held. Always `<= capacity`.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Maximum number of frames the ring retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total frames evicted since construction. Logical index `i` observed
    /// before `k` further evictions refers to `i - k` now (clamped at 0).
    pub fn evicted_count(&self) -> u64 {
        self.evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: i16) -> AudioFrame {
        AudioFrame::new(vec![tag; 4], 16_000)
    }

    #[test]
    fn append_below_capacity_evicts_nothing() {
        let mut ring = FrameRing::new(3);
        assert_eq!(ring.append(frame(0)), 0);
        assert_eq!(ring.append(frame(1)), 0);
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.evicted_count(), 0);
    }

    #[test]
    fn append_beyond_capacity_evicts_oldest() {
        let mut ring = FrameRing::new(2);
        ring.append(frame(0));
        ring.append(frame(1));
        assert_eq!(ring.append(frame(2)), 1);

        assert_eq!(ring.len(), 2);
        assert_eq!(ring.evicted_count(), 1);
        let heads: Vec<i16> = ring.slice(0, 2).map(|f| f.samples[0]).collect();
        assert_eq!(heads, vec![1, 2]);
    }

    #[test]
    fn len_stays_bounded_over_long_append_runs() {
        let mut ring = FrameRing::new(4);
        for i in 0..100 {
            ring.append(frame(i));
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.evicted_count(), 96);
        let heads: Vec<i16> = ring.slice(0, 4).map(|f| f.samples[0]).collect();
        assert_eq!(heads, vec![96, 97, 98, 99]);
    }

    #[test]
    fn slice_returns_half_open_range() {
        let mut ring = FrameRing::new(8);
        for i in 0..5 {
            ring.append(frame(i));
        }
        let heads: Vec<i16> = ring.slice(1, 4).map(|f| f.samples[0]).collect();
        assert_eq!(heads, vec![1, 2, 3]);
        assert_eq!(ring.slice(2, 2).count(), 0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn slice_past_len_panics() {
        let mut ring = FrameRing::new(4);
        ring.append(frame(0));
        let _ = ring.slice(0, 2).count();
    }
}
