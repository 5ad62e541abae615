//! Stereo image node: mid/side width and equal-power pan.

use std::f32::consts::{FRAC_PI_4, SQRT_2};

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

/// Width and pan for the first two channels.
///
/// Width scales the side component (0 = mono, 1 = unchanged, 2 = wide).
/// Pan uses an equal-power law normalized so the center is unity gain.
/// With a mono engine the signal passes through untouched; channels past
/// the second pass through as well.
pub struct Stereo {
    width: BlockRamp,
    pan: BlockRamp,
}

impl Stereo {
    pub const ID: &'static str = "stereo";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("in", "In", SignalType::Audio)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::new("width", "Width", 0.0, 2.0, 1.0, "x"),
        ParameterDefinition::new("pan", "Pan", -1.0, 1.0, 0.0, ""),
    ];

    const PARAM_WIDTH: usize = 0;
    const PARAM_PAN: usize = 1;

    pub fn new() -> Self {
        Self {
            width: BlockRamp::new(1.0),
            pan: BlockRamp::new(0.0),
        }
    }

    /// Left and right gains for `pan`, 1.0 each at center.
    #[inline]
    pub fn pan_gains(pan: f32) -> (f32, f32) {
        let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
        (angle.cos() * SQRT_2, angle.sin() * SQRT_2)
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let width = self.width.segment(params[Self::PARAM_WIDTH], ctx.frames);
        let pan = self.pan.segment(params[Self::PARAM_PAN], ctx.frames);
        let Some(input) = inputs.get(0) else {
            return;
        };
        let out = &mut outputs[0];
        let channels = ctx.channels;

        if channels < 2 {
            out.samples[..ctx.samples()].copy_from_slice(&input[..ctx.samples()]);
            return;
        }

        for frame in 0..ctx.frames {
            let start = frame * channels;
            let (left, right) = (input[start], input[start + 1]);

            let mid = (left + right) * 0.5;
            let side = (left - right) * 0.5 * width.at(frame);
            let (gain_l, gain_r) = Self::pan_gains(pan.at(frame));

            out.samples[start] = (mid + side) * gain_l;
            out.samples[start + 1] = (mid - side) * gain_r;
            for idx in start + 2..start + channels {
                out.samples[idx] = input[idx];
            }
        }
    }
}

impl Default for Stereo {
    fn default() -> Self {
        Self::new()
    }
}
