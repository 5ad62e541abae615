//! VCA (Voltage Controlled Amplifier) node.
//!
//! Controls the amplitude of an audio signal with a control voltage.

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

/// A voltage controlled amplifier.
///
/// Multiplies the audio input by a control signal, blended with a manual
/// level. Typically fed by an envelope or a clock-driven gate.
///
/// # Ports
///
/// - **In** (Audio, Input): Signal to be amplified. Unpatched is silence.
/// - **CV** (Control, Input): Amplitude control, clamped to 0-1. Unpatched reads 1.0.
/// - **Out** (Audio, Output): Amplitude-controlled output.
///
/// # Parameters
///
/// - **Level** (0-1): Overall output level.
/// - **CV Amount** (0-1): How much the CV input affects the output.
///   At 0 the CV is ignored; at 1 the CV has full control.
pub struct Vca {
    level: BlockRamp,
    cv_amount: BlockRamp,
}

impl Vca {
    pub const ID: &'static str = "vca";

    pub const INPUTS: &'static [PortDefinition] = &[
        PortDefinition::input("in", "In", SignalType::Audio),
        PortDefinition::input_with_default("cv", "CV", SignalType::Control, 1.0),
    ];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::normalized("level", "Level", 1.0),
        ParameterDefinition::normalized("cv_amount", "CV Amount", 1.0),
    ];

    const PORT_IN: usize = 0;
    const PORT_CV: usize = 1;
    const PORT_OUT: usize = 0;

    const PARAM_LEVEL: usize = 0;
    const PARAM_CV_AMOUNT: usize = 1;

    pub fn new() -> Self {
        Self {
            level: BlockRamp::new(1.0),
            cv_amount: BlockRamp::new(1.0),
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let level = self.level.segment(params[Self::PARAM_LEVEL], ctx.frames);
        let cv_amount = self.cv_amount.segment(params[Self::PARAM_CV_AMOUNT], ctx.frames);
        let Some(audio) = inputs.get(Self::PORT_IN) else {
            return;
        };
        let cv_default = Self::INPUTS[Self::PORT_CV].default_value;
        let out = &mut outputs[Self::PORT_OUT];

        let channels = ctx.channels;
        for frame in 0..ctx.frames {
            let cv = inputs
                .control(Self::PORT_CV, frame)
                .unwrap_or(cv_default)
                .clamp(0.0, 1.0);
            let amount = cv_amount.at(frame);

            // amount = 0: level only; amount = 1: level * cv
            let amplitude = level.at(frame) * (1.0 - amount + cv * amount);

            let start = frame * channels;
            for idx in start..start + channels {
                out.samples[idx] = audio[idx] * amplitude;
            }
        }
    }
}

impl Default for Vca {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(vca: &mut Vca, audio: &[f32], cv: Option<&[f32]>, params: &[f32]) -> Vec<f32> {
        let frames = audio.len();
        let ctx = ProcessContext::new(48000.0, 1, frames);
        let mut inputs = InputBuffers::new(1).with(0, audio);
        inputs.set(1, cv);
        let mut outputs = vec![SignalBuffer::audio(frames, 1)];
        vca.process(&inputs, &mut outputs, params, &ctx);
        outputs.remove(0).samples
    }

    #[test]
    fn test_vca_tables() {
        assert_eq!(Vca::ID, "vca");
        assert_eq!(Vca::INPUTS[1].id, "cv");
        assert_eq!(Vca::INPUTS[1].default_value, 1.0);
        assert_eq!(Vca::PARAMETERS.len(), 2);
    }

    #[test]
    fn test_unpatched_cv_passes_audio() {
        let mut vca = Vca::new();
        let out = render(&mut vca, &[0.5; 16], None, &[1.0, 1.0]);
        assert!(out.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_zero_cv_silences() {
        let mut vca = Vca::new();
        let out = render(&mut vca, &[0.8; 16], Some(&[0.0; 16]), &[1.0, 1.0]);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_half_cv() {
        let mut vca = Vca::new();
        let out = render(&mut vca, &[1.0; 16], Some(&[0.5; 16]), &[1.0, 1.0]);
        assert!(out.iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_cv_amount_zero_ignores_cv() {
        let mut vca = Vca::new();
        let out = render(&mut vca, &[1.0; 16], Some(&[0.0; 16]), &[0.7, 0.0]);
        assert!(out.iter().all(|&s| (s - 0.7).abs() < 1e-6));
    }

    #[test]
    fn test_cv_is_clamped() {
        let mut vca = Vca::new();
        let out = render(&mut vca, &[1.0; 4], Some(&[3.0, -2.0, 1.0, 0.0]), &[1.0, 1.0]);
        assert_eq!(out, vec![1.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_unpatched_audio_is_silent() {
        let mut vca = Vca::new();
        let ctx = ProcessContext::new(48000.0, 1, 8);
        let cv = [1.0; 8];
        let inputs = InputBuffers::new(1).with(1, &cv);
        let mut outputs = vec![SignalBuffer::audio(8, 1)];
        vca.process(&inputs, &mut outputs, &[1.0, 1.0], &ctx);
        assert!(outputs[0].samples.iter().all(|&s| s == 0.0));
    }
}
