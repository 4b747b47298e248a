//! `VadEngine` — top-level lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! VadEngine::new(config, scorer)?          status = Idle
//!     └─► start(source, resampler, sinks)  pipeline task spawned, Listening
//!         ├─► stop()                       cancel requested, returns at once
//!         └─► stop_graceful().await        cancel + await drained callbacks
//! ```
//!
//! `stop()` deliberately does not wait for in-flight dispatched callbacks:
//! a confidence or speech notification queued before the stop may still
//! fire briefly after `stop()` returns. Callers that need fully delivered
//! sinks use `stop_graceful()`, which awaits the pipeline task — and the
//! pipeline drains its callback set before exiting.

pub mod pipeline;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    audio::{FrameSource, Resampler},
    dispatch::{Dispatcher, Sinks},
    error::{EarshotError, Result},
    events::EngineStatus,
    vad::ScorerHandle,
};

/// Configuration for `VadEngine`. All values are fixed for the instance's
/// lifetime; validation happens once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Ring capacity in frames. Default: 64.
    pub buffer_size: usize,
    /// Analysis window length in frames. Default: 8.
    pub detection_window: usize,
    /// Frames shared by consecutive windows; the stride is
    /// `detection_window - overlap`. Default: 4.
    pub overlap: usize,
    /// A speech run must exceed this many windows to qualify. Default: 2.
    pub min_speech_windows: u32,
    /// Quiet windows required past the first before a segment commits.
    /// Default: 2.
    pub min_silence_windows: u32,
    /// Confidence above which a window counts as speech. Default: 0.45.
    pub confidence_threshold: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64,
            detection_window: 8,
            overlap: 4,
            min_speech_windows: 2,
            min_silence_windows: 2,
            confidence_threshold: 0.45,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.detection_window == 0 {
            return Err(EarshotError::InvalidConfig(
                "detection_window must be positive".into(),
            ));
        }
        if self.overlap >= self.detection_window {
            return Err(EarshotError::InvalidConfig(format!(
                "overlap ({}) must be smaller than detection_window ({})",
                self.overlap, self.detection_window
            )));
        }
        if self.buffer_size < self.detection_window {
            return Err(EarshotError::InvalidConfig(format!(
                "buffer_size ({}) must hold at least one detection_window ({})",
                self.buffer_size, self.detection_window
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(EarshotError::InvalidConfig(format!(
                "confidence_threshold ({}) must be in [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// The top-level engine handle.
///
/// `VadEngine` is `Send + Sync` — all fields use interior mutability, so it
/// can sit in an `Arc` shared between the transport's session handler and
/// whatever drives shutdown.
pub struct VadEngine {
    config: EngineConfig,
    scorer: ScorerHandle,
    /// `true` while the pipeline task is active.
    running: Arc<AtomicBool>,
    /// Wakes the pipeline's current frame-wait suspension on stop.
    shutdown: Arc<Notify>,
    status: Arc<Mutex<EngineStatus>>,
    /// Handle of the spawned pipeline task, taken by `stop_graceful`.
    pipeline: Mutex<Option<JoinHandle<()>>>,
    diagnostics: Arc<pipeline::PipelineDiagnostics>,
}

impl VadEngine {
    /// Create a new engine with an injected scorer. Does not consume frames
    /// until `start()`.
    ///
    /// # Errors
    /// `EarshotError::InvalidConfig` when the window geometry or threshold
    /// is unusable (notably `overlap >= detection_window`).
    pub fn new(config: EngineConfig, scorer: ScorerHandle) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
            status: Arc::new(Mutex::new(EngineStatus::Idle)),
            pipeline: Mutex::new(None),
            diagnostics: Arc::new(pipeline::PipelineDiagnostics::default()),
        })
    }

    /// Spawn the pipeline over `source`, resampling every frame with
    /// `resampler` and delivering notifications to `sinks`.
    ///
    /// Must be called within a tokio runtime. Returns immediately; the
    /// pipeline runs as a background task until the source ends or stop is
    /// requested.
    ///
    /// # Errors
    /// `EarshotError::AlreadyRunning` if the pipeline is active.
    pub fn start(
        &self,
        source: Box<dyn FrameSource>,
        resampler: Box<dyn Resampler>,
        sinks: Sinks,
    ) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EarshotError::AlreadyRunning);
        }

        self.diagnostics.reset();
        *self.status.lock() = EngineStatus::Listening;

        let ctx = pipeline::PipelineContext {
            config: self.config.clone(),
            scorer: self.scorer.clone(),
            source,
            resampler,
            dispatcher: Dispatcher::new(sinks),
            running: Arc::clone(&self.running),
            shutdown: Arc::clone(&self.shutdown),
            status: Arc::clone(&self.status),
            diagnostics: Arc::clone(&self.diagnostics),
        };

        let handle = tokio::spawn(pipeline::run(ctx));
        *self.pipeline.lock() = Some(handle);

        info!("engine started");
        Ok(())
    }

    /// Request a stop and return without waiting.
    ///
    /// The pipeline's current frame wait is woken and no further windows
    /// are evaluated, but callbacks dispatched before the stop may still
    /// complete afterwards.
    ///
    /// # Errors
    /// `EarshotError::NotRunning` if the pipeline is not active.
    pub fn stop(&self) -> Result<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(EarshotError::NotRunning);
        }

        self.running.store(false, Ordering::SeqCst);
        self.shutdown.notify_one();
        info!("engine stop requested");
        Ok(())
    }

    /// The stricter stop: request cancellation, then await the pipeline
    /// task, which drains all outstanding callbacks before exiting.
    ///
    /// Also usable after the source ended on its own, to await the drain.
    pub async fn stop_graceful(&self) -> Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.shutdown.notify_one();
        }

        let handle = self.pipeline.lock().take();
        if let Some(handle) = handle {
            handle
                .await
                .map_err(|e| EarshotError::Other(anyhow::anyhow!("pipeline task failed: {e}")))?;
        }
        *self.status.lock() = EngineStatus::Stopped;
        info!("engine stopped, callbacks drained");
        Ok(())
    }

    /// Current engine status (snapshot).
    pub fn status(&self) -> EngineStatus {
        *self.status.lock()
    }

    /// True while the pipeline task is consuming frames.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Snapshot of pipeline counters for observability.
    pub fn diagnostics_snapshot(&self) -> pipeline::DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Result as CoreResult;
    use crate::vad::SpeechScorer;

    struct NullScorer;

    impl SpeechScorer for NullScorer {
        fn score(&mut self, _samples: &[f32]) -> CoreResult<f32> {
            Ok(0.0)
        }
    }

    fn scorer() -> ScorerHandle {
        ScorerHandle::new(NullScorer)
    }

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_stride_is_rejected() {
        let config = EngineConfig {
            detection_window: 8,
            overlap: 8,
            ..EngineConfig::default()
        };
        assert!(matches!(
            VadEngine::new(config, scorer()),
            Err(EarshotError::InvalidConfig(_))
        ));
    }

    #[test]
    fn overlap_beyond_window_is_rejected() {
        let config = EngineConfig {
            detection_window: 4,
            overlap: 6,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn undersized_buffer_is_rejected() {
        let config = EngineConfig {
            buffer_size: 4,
            detection_window: 8,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let config = EngineConfig {
            confidence_threshold: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"detectionWindow": 16, "overlap": 8}"#).unwrap();
        assert_eq!(config.detection_window, 16);
        assert_eq!(config.overlap, 8);
        assert_eq!(config.buffer_size, EngineConfig::default().buffer_size);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn stop_before_start_is_an_error() {
        let engine = VadEngine::new(EngineConfig::default(), scorer()).unwrap();
        assert!(matches!(engine.stop(), Err(EarshotError::NotRunning)));
        assert_eq!(engine.status(), EngineStatus::Idle);
    }
}
