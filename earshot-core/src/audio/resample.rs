//! Sample-rate conversion using a rubato `FastFixedIn` resampler.
//!
//! Transports hand us frames at whatever rate they negotiated (48 kHz is
//! typical for Opus). The scorer wants [`CANONICAL_SAMPLE_RATE`] mono s16.
//! `RateConverter` bridges that gap on the pipeline task, where allocation
//! is allowed.
//!
//! When input rate == canonical rate the converter is a passthrough — no
//! rubato session is created at all.

use rubato::{FastFixedIn, PolynomialDegree, Resampler as RubatoResampler};

use crate::audio::{Resampler, CANONICAL_SAMPLE_RATE};
use crate::buffering::frame::AudioFrame;
use crate::error::{EarshotError, Result};

/// Converts mono i16 frames from one fixed sample rate to the canonical rate.
pub struct RateConverter {
    /// `None` when input rate == canonical rate (passthrough mode).
    resampler: Option<FastFixedIn<f32>>,
    /// Rate this converter was built for; frames at other rates are rejected.
    input_rate: u32,
    /// Accumulation buffer — holds partial input chunks between calls.
    input_buf: Vec<f32>,
    /// How many input samples rubato expects per process call.
    chunk_size: usize,
    /// Pre-allocated output buffer: `[1][output_frames_max]`.
    output_buf: Vec<Vec<f32>>,
}

impl RateConverter {
    /// Create a converter from `input_rate` to the canonical rate.
    ///
    /// `chunk_size` is the input sample count per rubato call (e.g. `960`,
    /// 20 ms at 48 kHz).
    ///
    /// # Errors
    /// Returns `EarshotError::Resample` if rubato fails to initialise.
    pub fn new(input_rate: u32, chunk_size: usize) -> Result<Self> {
        if input_rate == CANONICAL_SAMPLE_RATE {
            return Ok(Self {
                resampler: None,
                input_rate,
                input_buf: Vec::new(),
                chunk_size,
                output_buf: Vec::new(),
            });
        }

        let ratio = CANONICAL_SAMPLE_RATE as f64 / input_rate as f64;

        let resampler = FastFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio — no dynamic adjustment
            PolynomialDegree::Cubic,
            chunk_size,
            1, // mono
        )
        .map_err(|e| EarshotError::Resample(format!("resampler init: {e}")))?;

        let max_out = resampler.output_frames_max();
        let output_buf = vec![vec![0f32; max_out]; 1];

        tracing::info!(
            input_rate,
            canonical_rate = CANONICAL_SAMPLE_RATE,
            chunk_size,
            max_out,
            "resampling enabled"
        );

        Ok(Self {
            resampler: Some(resampler),
            input_rate,
            input_buf: Vec::new(),
            chunk_size,
            output_buf,
        })
    }

    /// Returns `true` when no rate conversion takes place.
    pub fn is_passthrough(&self) -> bool {
        self.resampler.is_none()
    }
}

impl Resampler for RateConverter {
    /// Convert one frame. Samples accumulate internally until a full
    /// `chunk_size` block is available for rubato; the returned frame may
    /// therefore be empty, and the caller skips empty frames.
    fn resample(&mut self, frame: AudioFrame) -> Result<AudioFrame> {
        if frame.sample_rate != self.input_rate {
            return Err(EarshotError::Resample(format!(
                "frame at {} Hz, converter built for {} Hz",
                frame.sample_rate, self.input_rate
            )));
        }

        let Some(ref mut resampler) = self.resampler else {
            return Ok(frame);
        };

        self.input_buf
            .extend(frame.samples.iter().map(|&s| s as f32 / 32768.0));

        let mut out: Vec<i16> = Vec::new();

        while self.input_buf.len() >= self.chunk_size {
            let input_slice = &self.input_buf[..self.chunk_size];

            let (_consumed, produced) = resampler
                .process_into_buffer(&[input_slice], &mut self.output_buf, None)
                .map_err(|e| EarshotError::Resample(e.to_string()))?;

            out.extend(
                self.output_buf[0][..produced]
                    .iter()
                    .map(|&s| (s * 32768.0).clamp(-32768.0, 32767.0) as i16),
            );

            self.input_buf.drain(..self.chunk_size);
        }

        Ok(AudioFrame::new(out, CANONICAL_SAMPLE_RATE))
    }
}
