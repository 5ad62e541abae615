//! Oscillator node.
//!
//! Free-running audio-rate oscillator with a pitch input in octaves.

use std::f64::consts::TAU;

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

/// Oscillator waveform shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine = 0,
    Saw = 1,
    Square = 2,
    Triangle = 3,
}

impl Waveform {
    /// Convert from parameter value (0-3) to waveform.
    pub fn from_param(value: f32) -> Self {
        match value as usize {
            0 => Waveform::Sine,
            1 => Waveform::Saw,
            2 => Waveform::Square,
            3 => Waveform::Triangle,
            _ => Waveform::Sine,
        }
    }

    /// Evaluate the shape at `phase` (0.0 to 1.0).
    #[inline]
    pub fn sample(&self, phase: f64) -> f32 {
        let value = match self {
            Waveform::Sine => (phase * TAU).sin(),
            Waveform::Saw => 2.0 * phase - 1.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        };
        value as f32
    }
}

/// Phase-accumulator oscillator.
///
/// # Ports
///
/// - **Pitch** (Control, Input): Offset in octaves added to Frequency. Unpatched reads 0.
/// - **Out** (Audio, Output): The waveform, identical on every channel.
///
/// # Parameters
///
/// - **Frequency** (20-20000 Hz): Base frequency.
/// - **Waveform**: Sine, Saw, Square or Triangle.
/// - **Level** (0-1): Output level, ramped across each buffer.
pub struct Oscillator {
    phase: f64,
    level: BlockRamp,
}

impl Oscillator {
    pub const ID: &'static str = "oscillator";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("pitch", "Pitch", SignalType::Control)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::logarithmic("frequency", "Frequency", 20.0, 20000.0, 220.0, "Hz"),
        ParameterDefinition::choice(
            "waveform",
            "Waveform",
            &["Sine", "Saw", "Square", "Triangle"],
            0,
        ),
        ParameterDefinition::normalized("level", "Level", 0.8),
    ];

    const PORT_PITCH: usize = 0;
    const PORT_OUT: usize = 0;

    const PARAM_FREQUENCY: usize = 0;
    const PARAM_WAVEFORM: usize = 1;
    const PARAM_LEVEL: usize = 2;

    /// Creates a new oscillator at phase zero.
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            level: BlockRamp::new(0.0),
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let base = params[Self::PARAM_FREQUENCY] as f64;
        let waveform = Waveform::from_param(params[Self::PARAM_WAVEFORM]);
        let level = self.level.segment(params[Self::PARAM_LEVEL], ctx.frames);
        let nyquist = ctx.nyquist() as f64;
        let sample_rate = ctx.sample_rate as f64;
        let out = &mut outputs[Self::PORT_OUT];

        let mut increment = base.clamp(0.0, nyquist) / sample_rate;
        let pitch_patched = inputs.is_patched(Self::PORT_PITCH);

        for frame in 0..ctx.frames {
            if pitch_patched {
                let octaves = inputs.control(Self::PORT_PITCH, frame).unwrap_or(0.0) as f64;
                increment = (base * octaves.exp2()).clamp(0.0, nyquist) / sample_rate;
            }
            out.write_frame(frame, waveform.sample(self.phase) * level.at(frame));

            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= self.phase.floor();
            }
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new()
    }
}
