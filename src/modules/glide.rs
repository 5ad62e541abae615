//! Glide (portamento) node.

use crate::dsp::{
    smoothing::slew, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext,
    SignalBuffer, SignalType,
};

/// Linear slew limiter.
///
/// The output travels toward the input at `1 / time` units per second.
/// With nothing patched the output holds where it was.
pub struct Glide {
    current: Option<f32>,
}

impl Glide {
    pub const ID: &'static str = "glide";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("in", "In", SignalType::Control)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Control)];

    pub const PARAMETERS: &'static [ParameterDefinition] =
        &[ParameterDefinition::new("time", "Time", 0.0, 10.0, 0.1, "s")];

    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let time = params[0].max(0.0);
        let max_step = if time > 0.0 {
            1.0 / (time * ctx.sample_rate)
        } else {
            f32::INFINITY
        };

        let out = &mut outputs[0];
        for frame in 0..ctx.frames {
            let value = match (inputs.control(0, frame), self.current) {
                (Some(target), Some(current)) => slew(current, target, max_step),
                // First sample after construction starts on the input
                (Some(target), None) => target,
                (None, current) => current.unwrap_or(0.0),
            };
            self.current = Some(value);
            out.write_frame(frame, value);
        }
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

impl Default for Glide {
    fn default() -> Self {
        Self::new()
    }
}
