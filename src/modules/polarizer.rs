//! Polarizer node: ramped signed scaling, -1 (inverted) through 0 to +1.

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

/// Scales the input by a polarity between -1 and 1.
///
/// # Ports
///
/// - **In** (Control, Input): Unpatched is silence.
/// - **Out** (Control, Output)
///
/// # Parameters
///
/// - **Polarity** (-1 to 1)
pub struct Polarizer {
    polarity: BlockRamp,
}

impl Polarizer {
    pub const ID: &'static str = "polarizer";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("in", "In", SignalType::Control)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Control)];

    pub const PARAMETERS: &'static [ParameterDefinition] =
        &[ParameterDefinition::new("polarity", "Polarity", -1.0, 1.0, 1.0, "")];

    pub fn new() -> Self {
        Self {
            polarity: BlockRamp::new(1.0),
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let polarity = self.polarity.segment(params[0], ctx.frames);
        let Some(input) = inputs.get(0) else {
            return;
        };
        let out = &mut outputs[0];
        for frame in 0..ctx.frames {
            let scale = polarity.at(frame);
            let start = frame * ctx.channels;
            for idx in start..start + ctx.channels {
                out.samples[idx] = input[idx] * scale;
            }
        }
    }
}

impl Default for Polarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverts() {
        let mut node = Polarizer::new();
        let ctx = ProcessContext::new(48000.0, 1, 3);
        let input = [0.25, -0.5, 1.0];
        let mut outputs = vec![SignalBuffer::control(3, 1)];
        node.process(&InputBuffers::new(1).with(0, &input), &mut outputs, &[-1.0], &ctx);
        assert_eq!(outputs[0].samples, vec![-0.25, 0.5, -1.0]);
    }

    #[test]
    fn test_flip_is_ramped() {
        let mut node = Polarizer::new();
        let ctx = ProcessContext::new(48000.0, 1, 100);
        let input = [1.0; 100];
        let inputs = InputBuffers::new(1).with(0, &input);
        let mut outputs = vec![SignalBuffer::control(100, 1)];

        node.process(&inputs, &mut outputs, &[1.0], &ctx);
        node.process(&inputs, &mut outputs, &[-1.0], &ctx);

        let s = &outputs[0].samples;
        assert!(s[0] > 0.9);
        assert!(s[49].abs() < 0.05);
        assert_eq!(s[99], -1.0);
    }

    #[test]
    fn test_unpatched_is_silent() {
        let mut node = Polarizer::new();
        let ctx = ProcessContext::new(48000.0, 1, 4);
        let mut outputs = vec![SignalBuffer::control(4, 1)];
        node.process(&InputBuffers::new(1), &mut outputs, &[-1.0], &ctx);
        assert!(outputs[0].samples.iter().all(|&s| s == 0.0));
    }
}
