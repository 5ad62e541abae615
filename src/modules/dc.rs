//! DC node: a constant, ramped offset with no inputs.

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

pub struct Dc {
    level: BlockRamp,
    /// Makes `process` panic after writing its output.
    #[cfg(test)]
    pub(crate) fail: bool,
}

impl Dc {
    pub const ID: &'static str = "dc";

    pub const INPUTS: &'static [PortDefinition] = &[];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Control)];

    pub const PARAMETERS: &'static [ParameterDefinition] =
        &[ParameterDefinition::new("level", "Level", -1.0, 1.0, 0.0, "")];

    pub fn new() -> Self {
        Self {
            level: BlockRamp::new(0.0),
            #[cfg(test)]
            fail: false,
        }
    }

    pub fn process(
        &mut self,
        _inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let level = self.level.segment(params[0], ctx.frames);
        let out = &mut outputs[0];
        for frame in 0..ctx.frames {
            out.write_frame(frame, level.at(frame));
        }

        #[cfg(test)]
        if self.fail {
            panic!("dc fault injected");
        }
    }
}

impl Default for Dc {
    fn default() -> Self {
        Self::new()
    }
}
