//! Rising-edge detection for gate and trigger inputs.

/// Threshold above which a gate counts as high.
pub const GATE_THRESHOLD: f32 = 0.5;

/// Length of a generated trigger pulse, in seconds.
pub const TRIGGER_SECONDS: f32 = 0.005;

/// Trigger pulse length in samples at `sample_rate` (at least one sample).
pub fn trigger_samples(sample_rate: f32) -> usize {
    ((TRIGGER_SECONDS * sample_rate) as usize).max(1)
}

/// Emits fixed-length 1.0 pulses on request.
#[derive(Clone, Copy, Debug)]
pub struct TriggerPulse {
    length: usize,
    remaining: usize,
}

impl TriggerPulse {
    /// Creates a generator whose pulses last [`TRIGGER_SECONDS`].
    pub fn new(sample_rate: f32) -> Self {
        Self {
            length: trigger_samples(sample_rate),
            remaining: 0,
        }
    }

    /// Starts (or restarts) a pulse at the next sample.
    pub fn fire(&mut self) {
        self.remaining = self.length;
    }

    /// Next output sample: 1.0 while a pulse is running, else 0.0.
    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            1.0
        } else {
            0.0
        }
    }

    /// Cancels any running pulse.
    pub fn reset(&mut self) {
        self.remaining = 0;
    }
}

/// Detects a signal crossing the threshold upward.
///
/// State carries from sample to sample and from callback to callback, so
/// callers must feed samples strictly in order.
#[derive(Clone, Copy, Debug)]
pub struct RisingEdge {
    was_high: bool,
    threshold: f32,
}

impl RisingEdge {
    /// Creates a detector with the default 0.5 threshold.
    pub fn new() -> Self {
        Self::with_threshold(GATE_THRESHOLD)
    }

    /// Creates a detector with a custom threshold.
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            was_high: false,
            threshold,
        }
    }

    /// Feeds one sample; returns true on the low-to-high transition.
    #[inline]
    pub fn detect(&mut self, value: f32) -> bool {
        let high = value > self.threshold;
        let rising = high && !self.was_high;
        self.was_high = high;
        rising
    }

    /// Whether the last sample was high.
    pub fn is_high(&self) -> bool {
        self.was_high
    }

    /// Forgets the previous sample.
    pub fn reset(&mut self) {
        self.was_high = false;
    }
}

impl Default for RisingEdge {
    fn default() -> Self {
        Self::new()
    }
}
