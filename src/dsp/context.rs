//! Processing context for graph nodes.
//!
//! Describes the pass a node is being evaluated for: how many frames, how
//! many interleaved channels, and the dsp-time of the first frame.

/// Context handed to every node for one evaluation pass.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    /// The audio sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: f32,
    /// Number of interleaved channels in every buffer.
    pub channels: usize,
    /// Number of frames in this pass.
    pub frames: usize,
    /// Dsp-time of the first frame, in seconds since the engine started.
    pub dsp_time: f64,
}

impl ProcessContext {
    /// Creates a context at dsp-time zero.
    pub fn new(sample_rate: f32, channels: usize, frames: usize) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            frames,
            dsp_time: 0.0,
        }
    }

    /// Same context, moved to a different dsp-time.
    pub fn at_time(self, dsp_time: f64) -> Self {
        Self { dsp_time, ..self }
    }

    /// Number of interleaved samples touched by this pass.
    #[inline]
    pub fn samples(&self) -> usize {
        self.frames * self.channels
    }

    /// Duration of the pass in seconds.
    pub fn block_duration(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Converts a duration in seconds to samples.
    pub fn seconds_to_samples(&self, seconds: f32) -> usize {
        (seconds * self.sample_rate).round().max(0.0) as usize
    }

    /// Returns the Nyquist frequency (half the sample rate).
    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self::new(48000.0, 2, 256)
    }
}
