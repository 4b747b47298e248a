//! Debounced edge detection over the confidence stream.
//!
//! A raw per-window threshold crossing flaps on pops, clicks and brief dips
//! mid-utterance. The tracker instead counts run-lengths:
//!
//! - a segment only *starts* counting when a window clears the threshold,
//!   and only *commits* if the run exceeded `min_speech_windows` (suppresses
//!   transient false positives);
//! - a segment only *closes* after more than `min_silence_windows`
//!   consecutive quiet windows (avoids fragmenting one utterance);
//! - the committed end boundary is the window start captured at the *first*
//!   quiet window after the run, so confirmation silence is never included
//!   in the emitted segment.
//!
//! A run still open when the stream ends is dropped, never emitted — the
//! engine only commits segments on a confirmed silence boundary.

/// Half-open logical frame range `[start, end)` of one committed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentBounds {
    pub start: usize,
    pub end: usize,
}

/// Run-length state machine turning window confidences into segment bounds.
///
/// `Silence` is the implicit state while `speech_windows == 0`.
#[derive(Debug)]
pub struct Hysteresis {
    confidence_threshold: f32,
    min_speech_windows: u32,
    min_silence_windows: u32,

    /// Consecutive above-threshold windows in the current run.
    speech_windows: u32,
    /// Consecutive at-or-below-threshold windows since the last run.
    silence_windows: u32,
    /// Length of the last completed run, snapshotted at its first quiet
    /// window and cleared on emission so later quiet windows cannot re-emit.
    last_speech_windows: u32,
    /// Window start recorded when the current run began.
    speech_start: usize,
    /// Window start recorded at the first quiet window after the run — the
    /// committed segment end if the silence sustains.
    pending_end: usize,
}

impl Hysteresis {
    pub fn new(confidence_threshold: f32, min_speech_windows: u32, min_silence_windows: u32) -> Self {
        Self {
            confidence_threshold,
            min_speech_windows,
            min_silence_windows,
            speech_windows: 0,
            silence_windows: 0,
            last_speech_windows: 0,
            speech_start: 0,
            pending_end: 0,
        }
    }

    /// Feed one window's confidence together with that window's logical
    /// start index. Returns the bounds of a newly committed segment, if any.
    pub fn observe(&mut self, confidence: f32, window_start: usize) -> Option<SegmentBounds> {
        if confidence > self.confidence_threshold {
            if self.speech_windows == 0 {
                self.speech_start = window_start;
            }
            self.speech_windows += 1;
            self.silence_windows = 0;
            return None;
        }

        if self.silence_windows == 0 {
            // First quiet window after a run: snapshot the run length and
            // pin the segment end before the counter resets.
            self.last_speech_windows = self.speech_windows;
            self.pending_end = window_start;
        }
        self.speech_windows = 0;
        self.silence_windows += 1;

        if self.last_speech_windows > self.min_speech_windows
            && self.silence_windows > self.min_silence_windows
        {
            self.last_speech_windows = 0;
            return Some(SegmentBounds {
                start: self.speech_start,
                end: self.pending_end,
            });
        }
        None
    }

    /// Correct the recorded logical indices after `evicted` frames left the
    /// ring, clamping at the new origin. Data behind a clamped pointer is
    /// permanently lost — a bounded-history trade-off, not an error.
    pub fn rewind(&mut self, evicted: usize) {
        self.speech_start = self.speech_start.saturating_sub(evicted);
        self.pending_end = self.pending_end.saturating_sub(evicted);
    }

    /// True while inside an unconfirmed speech run.
    pub fn in_speech(&self) -> bool {
        self.speech_windows > 0
    }
}
