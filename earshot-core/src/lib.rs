//! # earshot-core
//!
//! Streaming voice-activity-detection and speech-segmentation engine.
//!
//! ## Architecture
//!
//! ```text
//! FrameSource ─► resample ─► FrameRing ─► Windower ─► score(window)
//!                                             │            │
//!                                             │       confidence ∈ [0,1]
//!                                             │            │
//!                                        Hysteresis ◄──────┘
//!                                             │
//!                        ┌────────────────────┴──────────────┐
//!                  ConfidenceSink                       SpeechSink
//!                 (every window)                  (committed segments)
//! ```
//!
//! One cooperative task drives ingest, windowing and segmentation in strict
//! frame-arrival order; only sink callbacks run concurrently, dispatched
//! fire-and-forget so a slow consumer never stalls frame intake. The
//! transport, the scorer and the downstream consumers are all injected at
//! the boundary — the engine owns nothing but the algorithm.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod buffering;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod events;
pub mod vad;

// Convenience re-exports for downstream crates
pub use audio::{
    resample::RateConverter, FrameSource, PassthroughResampler, Resampler, WavSource,
    CANONICAL_SAMPLE_RATE,
};
pub use buffering::frame::AudioFrame;
pub use dispatch::{ConfidenceSink, Sinks, SpeechSink};
pub use engine::{EngineConfig, VadEngine};
pub use error::{EarshotError, Result};
pub use events::{EngineStatus, SpeechSegment};
pub use vad::{EnergyScorer, ScorerHandle, SpeechScorer};
