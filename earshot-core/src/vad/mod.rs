//! Voice activity scoring and segmentation.
//!
//! The `SpeechScorer` trait is the primary extensibility point: swap in
//! `EnergyScorer` (default), a Silero-style neural scorer, or a scripted
//! fake in tests without touching the pipeline. The windower and the
//! hysteresis tracker around it are model-agnostic — they only ever see a
//! confidence in `[0, 1]` per analysis window.

pub mod energy;
pub mod hysteresis;
pub mod windower;

pub use energy::EnergyScorer;
pub use hysteresis::{Hysteresis, SegmentBounds};
pub use windower::Windower;

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Contract for confidence scorers.
///
/// `&mut self` intentionally expresses that scorers may be stateful (RNN
/// hidden state, adaptive noise floors). All mutation is serialised through
/// `ScorerHandle`'s `parking_lot::Mutex`.
pub trait SpeechScorer: Send + 'static {
    /// Score one analysis window of normalized mono f32 samples.
    ///
    /// The returned confidence must be in `[0.0, 1.0]`; the pipeline clamps
    /// out-of-range values defensively but treats that as a scorer bug.
    fn score(&mut self, samples: &[f32]) -> Result<f32>;
}

/// Thread-safe reference-counted handle to any `SpeechScorer` implementor.
///
/// The scorer is an explicit dependency injected at engine construction —
/// never a process-wide singleton — so tests substitute deterministic
/// fakes. One handle may back several engine instances; scoring calls are
/// serialised through the non-poisoning `parking_lot::Mutex`.
#[derive(Clone)]
pub struct ScorerHandle(pub Arc<Mutex<dyn SpeechScorer>>);

impl ScorerHandle {
    /// Wrap any `SpeechScorer` in a `ScorerHandle`.
    pub fn new<S: SpeechScorer>(scorer: S) -> Self {
        Self(Arc::new(Mutex::new(scorer)))
    }
}

impl std::fmt::Debug for ScorerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScorerHandle").finish_non_exhaustive()
    }
}
