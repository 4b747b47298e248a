//! Audio boundary: frame sources and resampling.
//!
//! The engine never talks to a transport or a device itself. It consumes an
//! async [`FrameSource`] (whatever the embedding application negotiated —
//! a WebRTC track, a capture thread, a file) and a [`Resampler`] that maps
//! each incoming frame to the canonical format before buffering.

pub mod resample;
pub mod source;

pub use source::{FrameSource, WavSource};

use crate::buffering::frame::AudioFrame;
use crate::error::Result;

/// Canonical sample rate the scorer operates at (16 kHz mono s16).
pub const CANONICAL_SAMPLE_RATE: u32 = 16_000;

/// Per-frame rate/format conversion at the ingest boundary.
///
/// Implementations may buffer internally (rate conversion needs context),
/// so a call may return an empty frame while input accumulates. Failure is
/// non-fatal per frame: the pipeline logs it, drops the frame and moves on.
pub trait Resampler: Send {
    /// Convert one frame to the canonical rate/format.
    fn resample(&mut self, frame: AudioFrame) -> Result<AudioFrame>;
}

/// No-op resampler for sources that already produce canonical frames.
#[derive(Debug, Default)]
pub struct PassthroughResampler;

impl Resampler for PassthroughResampler {
    fn resample(&mut self, frame: AudioFrame) -> Result<AudioFrame> {
        Ok(frame)
    }
}
