//! Gain node.
//!
//! Scales its input by a ramped amplitude. The amplitude moves linearly
//! across each buffer from the previous callback's value to the new one,
//! so dial movements never step.

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

/// Ramped gain stage.
///
/// # Ports
///
/// - **In** (Audio, Input): Signal to scale. Unpatched is silence.
/// - **Out** (Audio, Output): Scaled signal.
///
/// # Parameters
///
/// - **Amp** (0-2): Linear gain.
pub struct Gain {
    amp: BlockRamp,
}

impl Gain {
    pub const ID: &'static str = "gain";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("in", "In", SignalType::Audio)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] =
        &[ParameterDefinition::new("amp", "Amp", 0.0, 2.0, 1.0, "x")];

    const PORT_IN: usize = 0;
    const PORT_OUT: usize = 0;
    const PARAM_AMP: usize = 0;

    pub fn new() -> Self {
        Self {
            amp: BlockRamp::new(1.0),
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        // Advance even when silent so a later patch starts from the right value
        let amp = self.amp.segment(params[Self::PARAM_AMP], ctx.frames);
        let Some(input) = inputs.get(Self::PORT_IN) else {
            return;
        };
        let out = &mut outputs[Self::PORT_OUT];

        let channels = ctx.channels;
        for frame in 0..ctx.frames {
            let gain = amp.at(frame);
            let start = frame * channels;
            for idx in start..start + channels {
                out.samples[idx] = input[idx] * gain;
            }
        }
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gain_tables() {
        assert_eq!(Gain::ID, "gain");
        assert_eq!(Gain::PARAMETERS[0].id, "amp");
        assert_eq!(Gain::PARAMETERS[0].max, 2.0);
    }

    #[test]
    fn test_unpatched_is_silent() {
        let mut gain = Gain::new();
        let ctx = ProcessContext::new(48000.0, 2, 32);
        let mut outputs = vec![SignalBuffer::audio(32, 2)];
        gain.process(&InputBuffers::new(2), &mut outputs, &[1.0], &ctx);
        assert!(outputs[0].samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_amp_ramps_across_buffer() {
        let mut gain = Gain::new();
        let ctx = ProcessContext::new(48000.0, 1, 1024);
        let ones = vec![1.0; 1024];
        let inputs = InputBuffers::new(1).with(0, &ones);
        let mut outputs = vec![SignalBuffer::audio(1024, 1)];

        gain.process(&inputs, &mut outputs, &[0.5], &ctx);
        assert!(outputs[0].samples.iter().all(|&s| s == 0.5));

        gain.process(&inputs, &mut outputs, &[1.0], &ctx);
        let s = &outputs[0].samples;
        assert_abs_diff_eq!(s[0], 0.5, epsilon = 1e-3);
        assert_abs_diff_eq!(s[1023], 1.0, epsilon = 1e-6);
        for i in 1..1024 {
            let delta = s[i] - s[i - 1];
            assert!(delta > 0.0 && delta < 1e-3);
        }
    }

    #[test]
    fn test_stereo_channels_share_gain() {
        let mut gain = Gain::new();
        let ctx = ProcessContext::new(48000.0, 2, 2);
        let input = [1.0, -1.0, 0.5, -0.5];
        let inputs = InputBuffers::new(2).with(0, &input);
        let mut outputs = vec![SignalBuffer::audio(2, 2)];

        gain.process(&inputs, &mut outputs, &[2.0], &ctx);
        assert_eq!(outputs[0].samples, vec![2.0, -2.0, 1.0, -1.0]);
    }
}
