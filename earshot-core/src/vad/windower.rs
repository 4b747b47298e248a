//! Overlapping analysis windows over the frame ring.
//!
//! The windower owns the confidence pointer: the logical index of the next
//! window's first frame. After every append it answers "is a full window
//! buffered past the pointer?", extracts and normalizes that window, and
//! advances by the stride (`detection_window - overlap`). Consecutive
//! windows deliberately overlap so a speech onset falling on a window
//! boundary is still seen whole by the scorer.

use crate::buffering::{frame::AudioFrame, FrameRing};

/// Extracts fixed-length, overlapping windows from the ring.
#[derive(Debug)]
pub struct Windower {
    /// Window length in frames.
    window: usize,
    /// Pointer advance per evaluated window, in frames. Always > 0.
    stride: usize,
    /// Logical index of the next window's start.
    pointer: usize,
}

impl Windower {
    /// Build a windower. `overlap < detection_window` is enforced by config
    /// validation before this is reached.
    pub fn new(detection_window: usize, overlap: usize) -> Self {
        debug_assert!(overlap < detection_window);
        Self {
            window: detection_window,
            stride: detection_window - overlap,
            pointer: 0,
        }
    }

    /// True when a full window is buffered at the current pointer.
    pub fn ready(&self, ring: &FrameRing) -> bool {
        ring.len() >= self.pointer + self.window
    }

    /// Logical start index of the next window (the value hysteresis records
    /// as a segment boundary).
    pub fn start(&self) -> usize {
        self.pointer
    }

    /// Extract and normalize the window at the current pointer.
    ///
    /// Call only when [`Windower::ready`] returned true.
    pub fn extract(&self, ring: &FrameRing) -> Vec<f32> {
        normalize(ring.slice(self.pointer, self.pointer + self.window))
    }

    /// Advance the pointer by one stride after an evaluation.
    pub fn advance(&mut self) {
        self.pointer += self.stride;
    }

    /// Correct the pointer after `evicted` frames left the ring, clamping
    /// at the new origin.
    pub fn rewind(&mut self, evicted: usize) {
        self.pointer = self.pointer.saturating_sub(evicted);
    }
}

/// Concatenate frames into normalized f32 mono samples (i16 / 32768).
/// An all-zero span skips the divide and yields zeros directly.
pub fn normalize<'a>(frames: impl Iterator<Item = &'a AudioFrame>) -> Vec<f32> {
    let frames: Vec<&AudioFrame> = frames.collect();
    let total: usize = frames.iter().map(|f| f.len()).sum();

    if frames.iter().all(|f| f.samples.iter().all(|&s| s == 0)) {
        return vec![0.0; total];
    }

    let mut out = Vec::with_capacity(total);
    for frame in frames {
        out.extend(frame.samples.iter().map(|&s| s as f32 / 32768.0));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ring_with(frames: &[&[i16]]) -> FrameRing {
        let mut ring = FrameRing::new(64);
        for f in frames {
            ring.append(AudioFrame::new(f.to_vec(), 16_000));
        }
        ring
    }

    #[test]
    fn not_ready_until_full_window_buffered() {
        let ring = ring_with(&[&[1], &[2]]);
        let windower = Windower::new(3, 1);
        assert!(!windower.ready(&ring));

        let ring = ring_with(&[&[1], &[2], &[3]]);
        assert!(windower.ready(&ring));
    }

    #[test]
    fn advance_moves_by_stride() {
        let mut windower = Windower::new(8, 4);
        assert_eq!(windower.start(), 0);
        windower.advance();
        assert_eq!(windower.start(), 4);
        windower.advance();
        assert_eq!(windower.start(), 8);
    }

    #[test]
    fn rewind_clamps_at_zero() {
        let mut windower = Windower::new(8, 4);
        windower.advance();
        windower.rewind(2);
        assert_eq!(windower.start(), 2);
        windower.rewind(10);
        assert_eq!(windower.start(), 0);
    }

    #[test]
    fn extract_concatenates_and_normalizes() {
        let ring = ring_with(&[&[16384, -16384], &[32767]]);
        let windower = Windower::new(2, 0);
        let samples = windower.extract(&ring);
        assert_eq!(samples.len(), 3);
        assert_relative_eq!(samples[0], 0.5);
        assert_relative_eq!(samples[1], -0.5);
        assert_relative_eq!(samples[2], 32767.0 / 32768.0);
    }

    #[test]
    fn all_zero_window_normalizes_to_zeros() {
        let ring = ring_with(&[&[0, 0], &[0]]);
        let windower = Windower::new(2, 0);
        assert_eq!(windower.extract(&ring), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn extract_respects_pointer_after_advance() {
        let ring = ring_with(&[&[1], &[2], &[3], &[4]]);
        let mut windower = Windower::new(2, 1);
        windower.advance();
        let samples = windower.extract(&ring);
        assert_relative_eq!(samples[0], 2.0 / 32768.0);
        assert_relative_eq!(samples[1], 3.0 / 32768.0);
    }
}
