//! Speaker node.
//!
//! The graph's sink. The evaluator pulls every active speaker once per pass
//! and sums their outputs into the hardware buffer.

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

/// Output sink with a ramped volume.
///
/// # Ports
///
/// - **In** (Audio, Input): Unpatched is silence.
/// - **Out** (Audio, Output): What this speaker contributes to the mix.
///
/// # Parameters
///
/// - **Volume** (0-1): Per-sink gain.
pub struct Speaker {
    volume: BlockRamp,
}

impl Speaker {
    pub const ID: &'static str = "speaker";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("in", "In", SignalType::Audio)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] =
        &[ParameterDefinition::normalized("volume", "Volume", 1.0)];

    const PORT_IN: usize = 0;
    const PORT_OUT: usize = 0;
    const PARAM_VOLUME: usize = 0;

    pub fn new() -> Self {
        Self {
            volume: BlockRamp::new(1.0),
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let volume = self.volume.segment(params[Self::PARAM_VOLUME], ctx.frames);
        let Some(input) = inputs.get(Self::PORT_IN) else {
            return;
        };
        let out = &mut outputs[Self::PORT_OUT];
        for frame in 0..ctx.frames {
            let gain = volume.at(frame);
            let start = frame * ctx.channels;
            for idx in start..start + ctx.channels {
                out.samples[idx] = input[idx] * gain;
            }
        }
    }
}

impl Default for Speaker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_tables() {
        assert_eq!(Speaker::ID, "speaker");
        assert_eq!(Speaker::PARAMETERS[0].default, 1.0);
    }

    #[test]
    fn test_passes_input_at_full_volume() {
        let mut speaker = Speaker::new();
        let ctx = ProcessContext::new(48000.0, 2, 2);
        let input = [0.1, 0.2, 0.3, 0.4];
        let mut outputs = vec![SignalBuffer::audio(2, 2)];
        speaker.process(&InputBuffers::new(2).with(0, &input), &mut outputs, &[1.0], &ctx);
        assert_eq!(outputs[0].samples, input.to_vec());
    }

    #[test]
    fn test_unpatched_is_silent() {
        let mut speaker = Speaker::new();
        let ctx = ProcessContext::new(48000.0, 2, 8);
        let mut outputs = vec![SignalBuffer::audio(8, 2)];
        speaker.process(&InputBuffers::new(2), &mut outputs, &[1.0], &ctx);
        assert!(outputs[0].samples.iter().all(|&s| s == 0.0));
    }
}
