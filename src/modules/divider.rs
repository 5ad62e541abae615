//! Clock divider node.
//!
//! Follows an incoming phase ramp (usually a clock's Phase output) and
//! re-emits it faster or slower. The incoming ramp is integrated into a
//! monotonic tracked phase, so the output stays continuous across wraps.

use crate::dsp::{
    InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, RisingEdge, SignalBuffer,
    SignalType,
};

/// Multipliers for each step of the `ratio` parameter.
const RATIOS: [f64; 8] = [4.0, 2.0, 1.0, 1.0 / 2.0, 1.0 / 3.0, 1.0 / 4.0, 1.0 / 8.0, 1.0 / 16.0];

/// The tracked phase wraps here. Divisible by every divisor so the wrap
/// lands on a whole output cycle.
const PHASE_WRAP: f64 = 96.0;

/// A drop larger than this between two input samples counts as a wrap.
const WRAP_THRESHOLD: f64 = 0.5;

/// Ramp divider / multiplier.
///
/// # Ports
///
/// - **In** (Control, Input): Phase ramp, 0 to 1. Unpatched holds the last output.
/// - **Reset** (Gate, Input): Re-syncs the tracked phase to zero on a rising edge.
/// - **Out** (Control, Output): Divided ramp.
/// - **Gate** (Gate, Output): High for the first half of each output cycle.
///
/// # Parameters
///
/// - **Ratio**: x4, x2, 1, /2, /3, /4, /8 or /16.
pub struct Divider {
    tracked: f64,
    previous: Option<f32>,
    reset: RisingEdge,
    last_out: f32,
}

impl Divider {
    pub const ID: &'static str = "divider";

    pub const INPUTS: &'static [PortDefinition] = &[
        PortDefinition::input("in", "In", SignalType::Control),
        PortDefinition::input("reset", "Reset", SignalType::Gate),
    ];

    pub const OUTPUTS: &'static [PortDefinition] = &[
        PortDefinition::output("out", "Out", SignalType::Control),
        PortDefinition::output("gate", "Gate", SignalType::Gate),
    ];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[ParameterDefinition::choice(
        "ratio",
        "Ratio",
        &["x4", "x2", "1", "/2", "/3", "/4", "/8", "/16"],
        3,
    )];

    const PORT_IN: usize = 0;
    const PORT_RESET: usize = 1;
    const PORT_OUT: usize = 0;
    const PORT_GATE: usize = 1;

    pub fn new() -> Self {
        Self {
            tracked: 0.0,
            previous: None,
            reset: RisingEdge::new(),
            last_out: 0.0,
        }
    }

    /// Phase advance between two ramp samples.
    ///
    /// A drop of more than half a cycle is the ramp wrapping. Any smaller
    /// drop is jitter or a falling input and does not move the phase.
    #[inline]
    fn delta(previous: f32, current: f32) -> f64 {
        let delta = (current - previous) as f64;
        if delta < -WRAP_THRESHOLD {
            delta + 1.0
        } else {
            delta.max(0.0)
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let ratio = RATIOS.get(params[0] as usize).copied().unwrap_or(0.5);
        let patched = inputs.is_patched(Self::PORT_IN);

        let (main, rest) = outputs.split_at_mut(Self::PORT_GATE);
        let out = &mut main[Self::PORT_OUT];
        let gate = &mut rest[0];

        for frame in 0..ctx.frames {
            if inputs
                .control(Self::PORT_RESET, frame)
                .is_some_and(|v| self.reset.detect(v))
            {
                self.tracked = 0.0;
            }

            if patched {
                let current = inputs.control(Self::PORT_IN, frame).unwrap_or(0.0);
                if let Some(previous) = self.previous {
                    self.tracked = (self.tracked + Self::delta(previous, current)) % PHASE_WRAP;
                }
                self.previous = Some(current);
                self.last_out = (self.tracked * ratio).fract() as f32;
            } else {
                self.previous = None;
            }

            out.write_frame(frame, self.last_out);
            gate.write_frame(frame, if self.last_out < 0.5 { 1.0 } else { 0.0 });
        }
    }

    pub fn reset(&mut self) {
        self.tracked = 0.0;
        self.previous = None;
        self.reset.reset();
        self.last_out = 0.0;
    }
}

impl Default for Divider {
    fn default() -> Self {
        Self::new()
    }
}
