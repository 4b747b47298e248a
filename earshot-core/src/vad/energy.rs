//! Energy-based confidence scorer.
//!
//! ## Algorithm
//!
//! 1. Compute RMS of the window.
//! 2. Map RMS linearly onto `[0, 1]` against a reference level: a window at
//!    or above `reference_rms` scores 1.0, digital silence scores 0.0.
//!
//! Crude compared to a neural scorer, but deterministic, dependency-free
//! and good enough to drive the hysteresis tracker on clean audio.

use super::SpeechScorer;
use crate::error::Result;

/// A simple RMS-based speech confidence scorer.
#[derive(Debug, Clone)]
pub struct EnergyScorer {
    /// RMS level (normalized full-scale) treated as "definitely speech".
    /// Typical conversational speech sits around 0.05–0.15.
    reference_rms: f32,
}

impl EnergyScorer {
    /// Create a scorer with the given reference RMS level.
    pub fn new(reference_rms: f32) -> Self {
        Self {
            reference_rms: reference_rms.max(f32::EPSILON),
        }
    }

    fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
        (sum_sq / samples.len() as f32).sqrt()
    }
}

impl Default for EnergyScorer {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl SpeechScorer for EnergyScorer {
    fn score(&mut self, samples: &[f32]) -> Result<f32> {
        Ok((Self::rms(samples) / self.reference_rms).clamp(0.0, 1.0))
    }
}
