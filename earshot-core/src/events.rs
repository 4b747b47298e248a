//! Payload and status types crossing the engine boundary.

use serde::{Deserialize, Serialize};

/// One committed span of detected speech, handed to the speech sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSegment {
    /// Logical frame index of the first frame in the segment, relative to
    /// the ring origin at emission time.
    pub start: usize,
    /// Logical frame index one past the last frame (half-open range).
    pub end: usize,
    /// Normalized mono f32 samples covering `[start, end)`, materialized at
    /// emission time.
    pub samples: Vec<f32>,
}

impl SpeechSegment {
    /// Number of frames the segment spans.
    pub fn frame_len(&self) -> usize {
        self.end - self.start
    }
}

/// Current state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    /// Engine created but `start()` not yet called.
    Idle,
    /// Pipeline running, consuming frames.
    Listening,
    /// Pipeline stopped (stream ended or stop requested); may be restarted.
    Stopped,
}
