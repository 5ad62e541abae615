//! Artifact node: lo-fi degradation.
//!
//! Bit-depth reduction, sample-rate reduction by holding, and a little
//! jitter noise under the quantizer, blended with the dry signal.

use crate::dsp::{
    InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer, SignalType,
};

/// Bit crusher and sample-rate reducer.
///
/// # Ports
///
/// - **In** (Audio, Input): Unpatched is silence.
/// - **Out** (Audio, Output)
///
/// # Parameters
///
/// - **Bits** (1-16): Quantizer resolution.
/// - **Downsample** (1-32): Each captured sample is held this many frames.
/// - **Jitter** (0-1): Noise added before quantizing, in quantizer steps.
/// - **Mix** (0-1): Dry/wet.
pub struct Artifact {
    rng: fastrand::Rng,
    held: Vec<f32>,
    countdown: usize,
}

impl Artifact {
    pub const ID: &'static str = "artifact";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("in", "In", SignalType::Audio)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::new("bits", "Bits", 1.0, 16.0, 8.0, "bits"),
        ParameterDefinition::new("downsample", "Downsample", 1.0, 32.0, 1.0, "x"),
        ParameterDefinition::normalized("jitter", "Jitter", 0.0),
        ParameterDefinition::normalized("mix", "Mix", 1.0),
    ];

    const PARAM_BITS: usize = 0;
    const PARAM_DOWNSAMPLE: usize = 1;
    const PARAM_JITTER: usize = 2;
    const PARAM_MIX: usize = 3;

    pub fn new(channels: usize) -> Self {
        Self::with_rng(fastrand::Rng::new(), channels)
    }

    pub fn with_seed(seed: u64, channels: usize) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed), channels)
    }

    fn with_rng(rng: fastrand::Rng, channels: usize) -> Self {
        Self {
            rng,
            held: vec![0.0; channels.max(1)],
            countdown: 0,
        }
    }

    /// Rounds `value` onto a grid of `2^(bits - 1)` steps per unit.
    #[inline]
    fn crush(value: f32, steps: f32) -> f32 {
        (value * steps).round() / steps
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let Some(input) = inputs.get(0) else {
            return;
        };
        let bits = params[Self::PARAM_BITS].round().clamp(1.0, 16.0);
        let hold = params[Self::PARAM_DOWNSAMPLE].round().clamp(1.0, 32.0) as usize;
        let jitter = params[Self::PARAM_JITTER].clamp(0.0, 1.0);
        let mix = params[Self::PARAM_MIX].clamp(0.0, 1.0);

        let steps = 2.0f32.powf(bits - 1.0);
        let channels = ctx.channels.min(self.held.len());
        let out = &mut outputs[0];

        for frame in 0..ctx.frames {
            if self.countdown == 0 {
                self.countdown = hold;
                for ch in 0..channels {
                    let noise = if jitter > 0.0 {
                        (self.rng.f32() * 2.0 - 1.0) * jitter / steps
                    } else {
                        0.0
                    };
                    let dry = input[frame * ctx.channels + ch];
                    self.held[ch] = Self::crush(dry + noise, steps).clamp(-1.0, 1.0);
                }
            }
            self.countdown -= 1;

            for ch in 0..channels {
                let idx = frame * ctx.channels + ch;
                out.samples[idx] = input[idx] * (1.0 - mix) + self.held[ch] * mix;
            }
        }
    }

    pub fn reset(&mut self) {
        self.held.fill(0.0);
        self.countdown = 0;
    }
}
