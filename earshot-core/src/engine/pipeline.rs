//! The cooperative pipeline loop.
//!
//! ## Stages (per arriving frame)
//!
//! ```text
//! 1. Await the next frame (or shutdown / end-of-stream)
//! 2. Resample to canonical 16 kHz mono s16 (failure drops the frame)
//! 3. Append to the frame ring; rewind logical pointers on eviction
//! 4. While a full detection window is buffered:
//!    a. extract + normalize → score → confidence ∈ [0, 1]
//!    b. dispatch confidence to the registered sink
//!    c. feed the hysteresis tracker; on a committed segment,
//!       materialize its samples and dispatch to the speech sink
//! 5. Reap completed callback tasks
//! ```
//!
//! Everything except callback execution happens synchronously on this one
//! task, in frame-arrival order: buffer mutation, pointer arithmetic and
//! state transitions are never concurrent with each other, which gives a
//! total order over window evaluations and segment emissions.

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::{
    audio::{FrameSource, Resampler},
    buffering::FrameRing,
    dispatch::Dispatcher,
    engine::EngineConfig,
    events::{EngineStatus, SpeechSegment},
    vad::{windower::normalize, Hysteresis, ScorerHandle, SegmentBounds, Windower},
};

pub struct PipelineDiagnostics {
    pub frames_in: AtomicUsize,
    pub frames_dropped: AtomicUsize,
    pub frames_evicted: AtomicUsize,
    pub windows_scored: AtomicUsize,
    pub scorer_errors: AtomicUsize,
    pub speech_windows: AtomicUsize,
    pub segments_emitted: AtomicUsize,
}

impl Default for PipelineDiagnostics {
    fn default() -> Self {
        Self {
            frames_in: AtomicUsize::new(0),
            frames_dropped: AtomicUsize::new(0),
            frames_evicted: AtomicUsize::new(0),
            windows_scored: AtomicUsize::new(0),
            scorer_errors: AtomicUsize::new(0),
            speech_windows: AtomicUsize::new(0),
            segments_emitted: AtomicUsize::new(0),
        }
    }
}

impl PipelineDiagnostics {
    pub fn reset(&self) {
        self.frames_in.store(0, Ordering::Relaxed);
        self.frames_dropped.store(0, Ordering::Relaxed);
        self.frames_evicted.store(0, Ordering::Relaxed);
        self.windows_scored.store(0, Ordering::Relaxed);
        self.scorer_errors.store(0, Ordering::Relaxed);
        self.speech_windows.store(0, Ordering::Relaxed);
        self.segments_emitted.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            frames_in: self.frames_in.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_evicted: self.frames_evicted.load(Ordering::Relaxed),
            windows_scored: self.windows_scored.load(Ordering::Relaxed),
            scorer_errors: self.scorer_errors.load(Ordering::Relaxed),
            speech_windows: self.speech_windows.load(Ordering::Relaxed),
            segments_emitted: self.segments_emitted.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiagnosticsSnapshot {
    pub frames_in: usize,
    pub frames_dropped: usize,
    pub frames_evicted: usize,
    pub windows_scored: usize,
    pub scorer_errors: usize,
    pub speech_windows: usize,
    pub segments_emitted: usize,
}

/// All context the pipeline needs, passed as one struct so the spawn stays tidy.
pub struct PipelineContext {
    pub config: EngineConfig,
    pub scorer: ScorerHandle,
    pub source: Box<dyn FrameSource>,
    pub resampler: Box<dyn Resampler>,
    pub dispatcher: Dispatcher,
    pub running: Arc<AtomicBool>,
    pub shutdown: Arc<Notify>,
    pub status: Arc<Mutex<EngineStatus>>,
    pub diagnostics: Arc<PipelineDiagnostics>,
}

/// Run the pipeline until the source ends or `stop()` is requested.
///
/// Outstanding callbacks are drained before this returns, so awaiting the
/// task handle (the graceful stop path) observes fully delivered sinks,
/// while the plain `stop()` returns immediately and lets late callbacks
/// fire on their own schedule.
pub async fn run(mut ctx: PipelineContext) {
    info!(
        buffer_size = ctx.config.buffer_size,
        detection_window = ctx.config.detection_window,
        overlap = ctx.config.overlap,
        "pipeline started"
    );

    let mut ring = FrameRing::new(ctx.config.buffer_size);
    let mut windower = Windower::new(ctx.config.detection_window, ctx.config.overlap);
    let mut hysteresis = Hysteresis::new(
        ctx.config.confidence_threshold,
        ctx.config.min_speech_windows,
        ctx.config.min_silence_windows,
    );

    loop {
        if !ctx.running.load(Ordering::Relaxed) {
            break;
        }

        // ── 1. Await the next frame, shutdown wakes this suspension ──────
        let frame = tokio::select! {
            _ = ctx.shutdown.notified() => {
                debug!("stop requested while awaiting frame");
                break;
            }
            frame = ctx.source.next_frame() => match frame {
                Some(frame) => frame,
                None => {
                    info!("frame source ended");
                    break;
                }
            },
        };
        ctx.diagnostics.frames_in.fetch_add(1, Ordering::Relaxed);

        // ── 2. Resample — failure is fatal to this frame only ────────────
        let frame = match ctx.resampler.resample(frame) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "resample failed, dropping frame");
                ctx.diagnostics.frames_dropped.fetch_add(1, Ordering::Relaxed);
                continue;
            }
        };
        if frame.is_empty() {
            // Rate converter still accumulating input
            continue;
        }

        // ── 3. Buffer, correcting pointers for eviction ──────────────────
        let evicted = ring.append(frame);
        if evicted > 0 {
            ctx.diagnostics
                .frames_evicted
                .fetch_add(evicted, Ordering::Relaxed);
            windower.rewind(evicted);
            hysteresis.rewind(evicted);
        }

        // ── 4. Evaluate every window the new frame completed ─────────────
        while ctx.running.load(Ordering::Relaxed) && windower.ready(&ring) {
            let window_start = windower.start();
            let samples = windower.extract(&ring);
            let scored = ctx.scorer.0.lock().score(&samples);
            windower.advance();

            let confidence = match scored {
                Ok(confidence) => confidence.clamp(0.0, 1.0),
                Err(e) => {
                    warn!(window_start, error = %e, "scorer failed, skipping window");
                    ctx.diagnostics.scorer_errors.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };

            ctx.diagnostics.windows_scored.fetch_add(1, Ordering::Relaxed);
            if confidence > ctx.config.confidence_threshold {
                ctx.diagnostics.speech_windows.fetch_add(1, Ordering::Relaxed);
            }
            debug!(window_start, confidence, "window scored");

            ctx.dispatcher.notify_confidence(confidence);

            if let Some(bounds) = hysteresis.observe(confidence, window_start) {
                emit_segment(&mut ctx, &ring, bounds);
            }
        }

        // ── 5. Reap completed callback tasks ─────────────────────────────
        ctx.dispatcher.reap();
    }

    if hysteresis.in_speech() {
        // Segments only commit on a confirmed silence boundary; an open run
        // at stream end is dropped.
        debug!("stream ended mid-speech run, trailing segment not emitted");
    }

    ctx.dispatcher.drain().await;
    ctx.running.store(false, Ordering::SeqCst);
    *ctx.status.lock() = EngineStatus::Stopped;

    let snap = ctx.diagnostics.snapshot();
    info!(
        frames_in = snap.frames_in,
        frames_dropped = snap.frames_dropped,
        frames_evicted = snap.frames_evicted,
        windows_scored = snap.windows_scored,
        scorer_errors = snap.scorer_errors,
        speech_windows = snap.speech_windows,
        segments_emitted = snap.segments_emitted,
        "pipeline stopped"
    );
}

/// Materialize a committed segment's samples and hand it to the speech sink.
fn emit_segment(ctx: &mut PipelineContext, ring: &FrameRing, bounds: SegmentBounds) {
    if bounds.start >= bounds.end {
        // Both pointers clamped to the origin: the span was evicted whole
        // before the silence confirmation arrived.
        debug!(?bounds, "segment evicted before emission, skipping");
        return;
    }

    let samples = normalize(ring.slice(bounds.start, bounds.end));
    ctx.diagnostics.segments_emitted.fetch_add(1, Ordering::Relaxed);
    info!(
        start = bounds.start,
        end = bounds.end,
        frames = bounds.end - bounds.start,
        samples = samples.len(),
        "speech segment committed"
    );

    ctx.dispatcher.notify_speech(SpeechSegment {
        start: bounds.start,
        end: bounds.end,
        samples,
    });
}
