//! Signal types and buffers for the patch graph.
//!
//! Every buffer is interleaved: `frames * channels` samples, frame-major.
//! Control and gate signals are written identically to every channel and
//! read back from channel 0.

use crate::engine::NodeId;

/// Maximum number of input jacks on a single node.
pub const MAX_INPUT_PORTS: usize = 4;

/// Maximum number of output jacks on a single node.
pub const MAX_OUTPUT_PORTS: usize = 4;

/// The kind of signal a jack carries.
///
/// Purely descriptive: any output may be patched into any input. The type
/// tells the device layer how to draw the cable and which threshold
/// semantics the receiving node applies.
///
/// - **Audio**: sample streams, typically -1.0 to 1.0
/// - **Control**: modulation, 0.0 to 1.0 (unipolar) or -1.0 to 1.0 (bipolar)
/// - **Gate**: on/off triggers, read against a 0.5 threshold
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalType {
    Audio,
    Control,
    Gate,
}

impl SignalType {
    /// Returns a human-readable name for the signal type.
    pub fn name(&self) -> &'static str {
        match self {
            SignalType::Audio => "Audio",
            SignalType::Control => "Control",
            SignalType::Gate => "Gate",
        }
    }
}

/// A pooled buffer of interleaved samples.
///
/// Storage is sized once for the largest block the engine will process;
/// a pass only touches the leading `frames * channels` samples. The buffer
/// remembers which node produced it and for which dsp-time, which is what
/// the evaluator and tests use to tell a fresh result from a stale one.
#[derive(Clone, Debug)]
pub struct SignalBuffer {
    /// Sample storage. Capacity is fixed at construction.
    pub samples: Vec<f32>,
    /// Number of interleaved channels.
    pub channels: usize,
    /// The type of signal stored in this buffer.
    pub signal_type: SignalType,
    /// Node that last wrote this buffer.
    pub producer: Option<NodeId>,
    /// Dsp-time (seconds) of the pass that last wrote this buffer.
    pub dsp_time: f64,
}

impl SignalBuffer {
    /// Creates a zeroed buffer holding `frames` frames of `channels` channels.
    pub fn new(frames: usize, channels: usize, signal_type: SignalType) -> Self {
        let channels = channels.max(1);
        Self {
            samples: vec![0.0; frames * channels],
            channels,
            signal_type,
            producer: None,
            dsp_time: 0.0,
        }
    }

    /// Creates a new audio signal buffer.
    pub fn audio(frames: usize, channels: usize) -> Self {
        Self::new(frames, channels, SignalType::Audio)
    }

    /// Creates a new control signal buffer.
    pub fn control(frames: usize, channels: usize) -> Self {
        Self::new(frames, channels, SignalType::Control)
    }

    /// Clears the buffer, setting all samples to zero.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Fills the buffer with a constant value.
    pub fn fill(&mut self, value: f32) {
        self.samples.fill(value);
    }

    /// Total number of samples the buffer can hold.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of whole frames the buffer can hold.
    pub fn frame_capacity(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Writes `value` to every channel of `frame`.
    #[inline]
    pub fn write_frame(&mut self, frame: usize, value: f32) {
        let start = frame * self.channels;
        self.samples[start..start + self.channels].fill(value);
    }

    /// Writes a single channel sample.
    #[inline]
    pub fn write(&mut self, frame: usize, channel: usize, value: f32) {
        self.samples[frame * self.channels + channel] = value;
    }

    /// Reads a single channel sample.
    #[inline]
    pub fn read(&self, frame: usize, channel: usize) -> f32 {
        self.samples[frame * self.channels + channel]
    }

    /// Records who wrote this buffer and for which pass.
    pub fn tag(&mut self, producer: NodeId, dsp_time: f64) {
        self.producer = Some(producer);
        self.dsp_time = dsp_time;
    }
}

/// The upstream signals visible to one node during one pass.
///
/// An unpatched jack reads as `None`, which every node treats as "no
/// signal". A cable whose source cannot run this pass (missing, bypassed,
/// or closing a cycle) reads as a patched run of zeros.
#[derive(Clone, Copy, Debug)]
pub struct InputBuffers<'a> {
    ports: [Option<&'a [f32]>; MAX_INPUT_PORTS],
    channels: usize,
}

impl<'a> InputBuffers<'a> {
    /// Creates an input set with every jack unpatched.
    pub fn new(channels: usize) -> Self {
        Self {
            ports: [None; MAX_INPUT_PORTS],
            channels: channels.max(1),
        }
    }

    /// Builder form of [`InputBuffers::set`].
    pub fn with(mut self, port: usize, samples: &'a [f32]) -> Self {
        self.set(port, Some(samples));
        self
    }

    /// Binds (or clears) the signal for one input jack.
    pub fn set(&mut self, port: usize, samples: Option<&'a [f32]>) {
        if let Some(slot) = self.ports.get_mut(port) {
            *slot = samples;
        }
    }

    /// Returns true if the jack carries a signal this pass.
    #[inline]
    pub fn is_patched(&self, port: usize) -> bool {
        matches!(self.ports.get(port), Some(Some(_)))
    }

    /// Raw interleaved samples for a jack.
    #[inline]
    pub fn get(&self, port: usize) -> Option<&'a [f32]> {
        self.ports.get(port).copied().flatten()
    }

    /// Number of interleaved channels in every input.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Reads one channel of one frame, if the jack is patched.
    #[inline]
    pub fn sample(&self, port: usize, frame: usize, channel: usize) -> Option<f32> {
        self.get(port)
            .and_then(|buf| buf.get(frame * self.channels + channel).copied())
    }

    /// Reads a control value (channel 0) for one frame.
    #[inline]
    pub fn control(&self, port: usize, frame: usize) -> Option<f32> {
        self.sample(port, frame, 0)
    }
}
