//! Typed audio frame passed from the transport boundary into the ring.

/// A contiguous block of mono signed 16-bit PCM samples at a known sample rate.
///
/// Frames are immutable after creation: the ingest stage builds one per
/// transport packet, the resampler maps it to the canonical rate, and the
/// ring buffer owns it from `append` onward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    /// Mono i16 samples in play order.
    pub samples: Vec<i16>,
    /// Sample rate in Hz (e.g. 16000, 44100, 48000).
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Number of samples in this frame.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the frame contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the duration of this frame in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
