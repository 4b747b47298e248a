//! Non-blocking callback dispatch.
//!
//! Confidence values and speech segments go to consumer-supplied sinks.
//! Sink handlers run as independent tokio tasks so a slow transcriber or a
//! stalled UI meter never blocks the frame-arrival path. The dispatcher
//! tracks every spawned handler in a `JoinSet`; completed tasks are reaped
//! through the set rather than by closures mutating shared state, and a
//! handler error or panic is logged here and never reaches the pipeline.
//!
//! Handlers are spawned in window-evaluation order, but there is no
//! ordering guarantee across handler *completions* — a later-queued
//! callback may finish first, and confidence delivery is not ordered
//! relative to speech delivery.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::events::SpeechSegment;

/// Consumer of per-window confidence values (e.g. a UI meter).
#[async_trait]
pub trait ConfidenceSink: Send + Sync {
    async fn on_confidence(&self, confidence: f32) -> anyhow::Result<()>;
}

/// Consumer of committed speech segments (e.g. a transcriber).
#[async_trait]
pub trait SpeechSink: Send + Sync {
    async fn on_speech(&self, segment: SpeechSegment) -> anyhow::Result<()>;
}

/// Optional consumer registrations handed to `VadEngine::start`.
///
/// Absence of a sink is a typed "no consumer registered" state: the
/// corresponding notifications are simply not produced.
#[derive(Default)]
pub struct Sinks {
    pub confidence: Option<Arc<dyn ConfidenceSink>>,
    pub speech: Option<Arc<dyn SpeechSink>>,
}

/// Fire-and-forget dispatcher owned by the pipeline task.
pub struct Dispatcher {
    confidence_sink: Option<Arc<dyn ConfidenceSink>>,
    speech_sink: Option<Arc<dyn SpeechSink>>,
    tasks: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(sinks: Sinks) -> Self {
        Self {
            confidence_sink: sinks.confidence,
            speech_sink: sinks.speech,
            tasks: JoinSet::new(),
        }
    }

    /// Schedule delivery of one confidence value. Never blocks.
    pub fn notify_confidence(&mut self, confidence: f32) {
        let Some(sink) = self.confidence_sink.clone() else {
            return;
        };
        self.tasks.spawn(async move {
            if let Err(e) = sink.on_confidence(confidence).await {
                warn!(confidence, error = %e, "confidence sink failed");
            }
        });
    }

    /// Schedule delivery of one committed segment. Never blocks.
    pub fn notify_speech(&mut self, segment: SpeechSegment) {
        let Some(sink) = self.speech_sink.clone() else {
            return;
        };
        self.tasks.spawn(async move {
            let (start, end) = (segment.start, segment.end);
            if let Err(e) = sink.on_speech(segment).await {
                warn!(start, end, error = %e, "speech sink failed");
            }
        });
    }

    /// Remove finished handlers from the live set, surfacing panics in the
    /// log. Called opportunistically from the pipeline loop.
    pub fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    warn!(error = %e, "callback task panicked");
                }
            }
        }
    }

    /// Await every outstanding handler. Used by the graceful stop path; the
    /// plain stop never calls this from the caller's side.
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                if !e.is_cancelled() {
                    warn!(error = %e, "callback task panicked");
                }
            }
        }
        debug!("callback dispatch drained");
    }

    /// Number of handlers still in flight.
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    pub fn has_confidence_sink(&self) -> bool {
        self.confidence_sink.is_some()
    }

    pub fn has_speech_sink(&self) -> bool {
        self.speech_sink.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;

    struct RecordingSink {
        confidences: Mutex<Vec<f32>>,
        segments: Mutex<Vec<SpeechSegment>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                confidences: Mutex::new(Vec::new()),
                segments: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ConfidenceSink for RecordingSink {
        async fn on_confidence(&self, confidence: f32) -> anyhow::Result<()> {
            self.confidences.lock().push(confidence);
            Ok(())
        }
    }

    #[async_trait]
    impl SpeechSink for RecordingSink {
        async fn on_speech(&self, segment: SpeechSegment) -> anyhow::Result<()> {
            self.segments.lock().push(segment);
            Ok(())
        }
    }

    struct FailingSink {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ConfidenceSink for FailingSink {
        async fn on_confidence(&self, _confidence: f32) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("intentional test failure")
        }
    }

    struct PanickingSink;

    #[async_trait]
    impl ConfidenceSink for PanickingSink {
        async fn on_confidence(&self, _confidence: f32) -> anyhow::Result<()> {
            panic!("intentional test panic");
        }
    }

    #[tokio::test]
    async fn delivers_to_registered_sinks() {
        let sink = RecordingSink::new();
        let mut dispatcher = Dispatcher::new(Sinks {
            confidence: Some(Arc::clone(&sink) as Arc<dyn ConfidenceSink>),
            speech: Some(Arc::clone(&sink) as Arc<dyn SpeechSink>),
        });

        dispatcher.notify_confidence(0.7);
        dispatcher.notify_speech(SpeechSegment {
            start: 0,
            end: 2,
            samples: vec![0.1, 0.2],
        });
        dispatcher.drain().await;

        assert_eq!(*sink.confidences.lock(), vec![0.7]);
        assert_eq!(sink.segments.lock().len(), 1);
        assert_eq!(dispatcher.outstanding(), 0);
    }

    #[tokio::test]
    async fn missing_sinks_dispatch_nothing() {
        let mut dispatcher = Dispatcher::new(Sinks::default());
        assert!(!dispatcher.has_confidence_sink());
        assert!(!dispatcher.has_speech_sink());

        dispatcher.notify_confidence(0.5);
        dispatcher.notify_speech(SpeechSegment {
            start: 0,
            end: 0,
            samples: vec![],
        });
        assert_eq!(dispatcher.outstanding(), 0);
    }

    #[tokio::test]
    async fn sink_errors_are_contained() {
        let sink = Arc::new(FailingSink {
            calls: AtomicUsize::new(0),
        });
        let mut dispatcher = Dispatcher::new(Sinks {
            confidence: Some(Arc::clone(&sink) as Arc<dyn ConfidenceSink>),
            speech: None,
        });

        dispatcher.notify_confidence(0.3);
        dispatcher.notify_confidence(0.4);
        dispatcher.drain().await;

        // Both deliveries ran despite the first failing.
        assert_eq!(sink.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sink_panics_are_contained() {
        let mut dispatcher = Dispatcher::new(Sinks {
            confidence: Some(Arc::new(PanickingSink)),
            speech: None,
        });

        dispatcher.notify_confidence(0.9);
        dispatcher.drain().await;
        assert_eq!(dispatcher.outstanding(), 0);
    }

    #[tokio::test]
    async fn reap_removes_completed_tasks() {
        let sink = RecordingSink::new();
        let mut dispatcher = Dispatcher::new(Sinks {
            confidence: Some(Arc::clone(&sink) as Arc<dyn ConfidenceSink>),
            speech: None,
        });

        for i in 0..8 {
            dispatcher.notify_confidence(i as f32 / 10.0);
        }
        // Let the handlers run to completion, then reap.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        dispatcher.reap();
        assert_eq!(dispatcher.outstanding(), 0);
        assert_eq!(sink.confidences.lock().len(), 8);
    }
}
