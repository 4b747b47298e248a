//! Frame sources: the async ingest boundary.
//!
//! The core consumes one operation from the transport: "give me the next
//! decoded frame or tell me the stream ended". Anything that can do that —
//! a WebRTC track adapter, a capture thread behind a channel, a WAV file —
//! plugs in via [`FrameSource`].

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::buffering::frame::AudioFrame;
use crate::error::{EarshotError, Result};

/// Async source of decoded audio frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Suspend until the next frame arrives. `None` signals end-of-stream,
    /// which the pipeline treats as a clean termination, not a failure.
    async fn next_frame(&mut self) -> Option<AudioFrame>;
}

/// A plain mpsc receiver is a frame source: the transport side keeps the
/// sender and drops it to signal end-of-stream.
#[async_trait]
impl FrameSource for mpsc::Receiver<AudioFrame> {
    async fn next_frame(&mut self) -> Option<AudioFrame> {
        self.recv().await
    }
}

/// Frame source backed by a WAV file, yielding fixed-size mono frames.
///
/// Multi-channel input is downmixed by averaging. Useful for offline runs
/// and deterministic tests; the whole file is decoded up front.
pub struct WavSource {
    frames: std::vec::IntoIter<AudioFrame>,
}

impl WavSource {
    /// Decode `path` into frames of `frame_len` samples each. The trailing
    /// partial frame is kept — frame length is a packaging choice, not a
    /// contract the ring depends on.
    ///
    /// # Errors
    /// Returns `EarshotError::Source` when the file is not 16-bit integer
    /// PCM or hound fails to parse it.
    pub fn open(path: impl AsRef<Path>, frame_len: usize) -> Result<Self> {
        let mut reader = hound::WavReader::open(path.as_ref())
            .map_err(|e| EarshotError::Source(format!("wav open: {e}")))?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(EarshotError::Source(format!(
                "unsupported wav format: {:?} {} bit (need 16-bit int PCM)",
                spec.sample_format, spec.bits_per_sample
            )));
        }

        let channels = spec.channels as usize;
        let interleaved: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| EarshotError::Source(format!("wav decode: {e}")))?;

        let mono: Vec<i16> = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / channels as i32) as i16
                })
                .collect()
        };

        let frames: Vec<AudioFrame> = mono
            .chunks(frame_len.max(1))
            .map(|chunk| AudioFrame::new(chunk.to_vec(), spec.sample_rate))
            .collect();

        tracing::debug!(
            path = %path.as_ref().display(),
            sample_rate = spec.sample_rate,
            channels,
            frames = frames.len(),
            "wav source loaded"
        );

        Ok(Self {
            frames: frames.into_iter(),
        })
    }
}

#[async_trait]
impl FrameSource for WavSource {
    async fn next_frame(&mut self) -> Option<AudioFrame> {
        self.frames.next()
    }
}
