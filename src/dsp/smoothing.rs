//! Parameter smoothing for click-free audio.
//!
//! Two flavours are used by the node kinds:
//!
//! - [`BlockRamp`]: the buffer-length linear ramp. A parameter moves from the
//!   value it ended the previous callback on to this callback's snapshot,
//!   spread evenly across every frame. Used by the gain family.
//! - [`SmoothedValue`]: a one-pole exponential smoother advanced per sample.
//!   Used by the stateful effects, whose parameters feed nonlinear curves.

/// Buffer-length linear ramp.
///
/// For a pass of `n` frames starting at value `A` with snapshot target `B`,
/// frame `i` reads `A + (B - A) * (i + 1) / n`, so the last frame lands
/// exactly on `B` and the next callback starts from there.
#[derive(Clone, Copy, Debug)]
pub struct BlockRamp {
    current: f32,
    primed: bool,
}

/// One callback's worth of a [`BlockRamp`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RampSegment {
    start: f32,
    step: f32,
}

impl RampSegment {
    /// Value at `frame` within the pass.
    #[inline]
    pub fn at(&self, frame: usize) -> f32 {
        self.start + self.step * (frame as f32 + 1.0)
    }
}

impl BlockRamp {
    /// Creates a ramp resting at `initial`.
    ///
    /// The first [`BlockRamp::segment`] call jumps straight to its target;
    /// a freshly created node has no previous callback to ramp from.
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            primed: false,
        }
    }

    /// Plans a pass of `frames` frames toward `target` and advances the
    /// ramp so the following pass starts from `target`.
    pub fn segment(&mut self, target: f32, frames: usize) -> RampSegment {
        if !self.primed || frames == 0 {
            self.primed = true;
            self.current = target;
            return RampSegment {
                start: target,
                step: 0.0,
            };
        }
        let start = self.current;
        self.current = target;
        RampSegment {
            start,
            step: (target - start) / frames as f32,
        }
    }

    /// Value the last pass ended on.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Jumps to `value`; the next segment starts there.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.primed = true;
    }
}

/// A value that glides exponentially toward a target, one sample at a time.
///
/// The coefficient comes from a time constant: after one time constant the
/// value has covered ~63% of the distance to its target.
#[derive(Clone, Debug)]
pub struct SmoothedValue {
    current: f32,
    target: f32,
    coefficient: f32,
}

impl SmoothedValue {
    /// Default time constant in milliseconds.
    pub const DEFAULT_TIME_CONSTANT_MS: f32 = 10.0;

    /// Distance at which the value snaps onto its target.
    const SNAP: f32 = 1e-4;

    /// Creates a smoothed value resting at `initial`.
    pub fn new(initial: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coefficient: Self::coefficient(time_constant_ms, sample_rate),
        }
    }

    /// Creates a smoothed value with the default 10ms time constant.
    pub fn with_default_smoothing(initial: f32, sample_rate: f32) -> Self {
        Self::new(initial, Self::DEFAULT_TIME_CONSTANT_MS, sample_rate)
    }

    fn coefficient(time_constant_ms: f32, sample_rate: f32) -> f32 {
        let samples = time_constant_ms * 0.001 * sample_rate;
        if samples < 1.0 {
            0.0
        } else {
            (-1.0 / samples).exp()
        }
    }

    /// Sets a new target value to smooth toward.
    #[inline]
    pub fn set_target(&mut self, value: f32) {
        self.target = value;
    }

    /// Current target.
    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Current value without advancing.
    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Advances one sample and returns the new value.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let diff = self.current - self.target;
        self.current = if diff.abs() <= Self::SNAP {
            self.target
        } else {
            self.target + self.coefficient * diff
        };
        self.current
    }

    /// Jumps to `value` with no smoothing.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
    }
}

/// Moves `current` toward `target` by at most `max_step`.
///
/// A non-finite or non-positive step means "arrive immediately".
#[inline]
pub fn slew(current: f32, target: f32, max_step: f32) -> f32 {
    if !max_step.is_finite() || max_step <= 0.0 {
        return target;
    }
    let diff = target - current;
    if diff.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(diff)
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::new(0.0, Self::DEFAULT_TIME_CONSTANT_MS, 48000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_first_segment_is_flat() {
        let mut ramp = BlockRamp::new(0.0);
        let seg = ramp.segment(0.5, 1024);

        assert_eq!(seg.at(0), 0.5);
        assert_eq!(seg.at(1023), 0.5);
    }

    #[test]
    fn test_ramp_spans_the_buffer() {
        let mut ramp = BlockRamp::new(0.0);
        ramp.segment(0.5, 1024);
        let seg = ramp.segment(1.0, 1024);

        assert_abs_diff_eq!(seg.at(0), 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(seg.at(1023), 1.0, epsilon = 1e-6);
        assert_eq!(ramp.current(), 1.0);
    }

    #[test]
    fn test_ramp_steps_are_uniform() {
        let mut ramp = BlockRamp::new(0.0);
        ramp.segment(0.0, 64);
        let seg = ramp.segment(1.0, 64);

        let step = 1.0 / 64.0;
        for i in 1..64 {
            assert_abs_diff_eq!(seg.at(i) - seg.at(i - 1), step, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_ramp_is_continuous_across_passes() {
        let mut ramp = BlockRamp::new(0.0);
        ramp.segment(0.2, 32);
        let first = ramp.segment(0.8, 32);
        let second = ramp.segment(0.4, 32);

        // The second pass departs from where the first one ended
        let gap = (second.at(0) - first.at(31)).abs();
        assert!(gap <= (0.8f32 - 0.4).abs() / 32.0 + 1e-6);
    }

    #[test]
    fn test_ramp_reset() {
        let mut ramp = BlockRamp::new(0.0);
        ramp.reset(0.25);
        let seg = ramp.segment(0.75, 2);
        assert_abs_diff_eq!(seg.at(0), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(seg.at(1), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_frame_segment_snaps() {
        let mut ramp = BlockRamp::new(0.0);
        ramp.segment(0.0, 16);
        ramp.segment(1.0, 0);
        assert_eq!(ramp.current(), 1.0);
    }

    #[test]
    fn test_slew_limits_step() {
        assert_eq!(slew(0.0, 1.0, 0.25), 0.25);
        assert_eq!(slew(1.0, 0.0, 0.25), 0.75);
        assert_eq!(slew(0.9, 1.0, 0.25), 1.0);
        assert_eq!(slew(0.0, 1.0, f32::INFINITY), 1.0);
        assert_eq!(slew(0.0, -1.0, 0.0), -1.0);
    }

    #[test]
    fn test_smoothing_approaches_target() {
        let mut sv = SmoothedValue::new(0.0, 10.0, 48000.0);
        sv.set_target(1.0);
        for _ in 0..4800 {
            sv.next();
        }
        assert_abs_diff_eq!(sv.current(), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn test_smoothing_is_gradual() {
        let mut sv = SmoothedValue::new(0.0, 10.0, 48000.0);
        sv.set_target(1.0);

        let first = sv.next();
        let second = sv.next();
        assert!(first > 0.0);
        assert!(second > first);
        assert!(second < 0.5);
    }

    #[test]
    fn test_one_time_constant() {
        let mut sv = SmoothedValue::new(0.0, 10.0, 48000.0);
        sv.set_target(1.0);
        for _ in 0..480 {
            sv.next();
        }
        assert_abs_diff_eq!(sv.current(), 0.632, epsilon = 0.05);
    }

    #[test]
    fn test_zero_time_constant_is_instant() {
        let mut sv = SmoothedValue::new(0.0, 0.0, 48000.0);
        sv.set_target(1.0);
        assert_eq!(sv.next(), 1.0);
    }

    #[test]
    fn test_set_immediate() {
        let mut sv = SmoothedValue::default();
        sv.set_target(3.0);
        assert_eq!(sv.current(), 0.0);
        sv.set_immediate(1.0);
        assert_eq!(sv.current(), 1.0);
        assert_eq!(sv.target(), 1.0);
        assert_eq!(sv.next(), 1.0);
    }
}
