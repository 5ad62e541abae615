//! Sample and Hold node.
//!
//! Captures the input signal value when triggered and holds that value
//! until the next trigger. Essential for creating stepped random sequences,
//! staircase LFO patterns, and quantized modulation.

use crate::dsp::{
    smoothing::slew, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext,
    RisingEdge, SignalBuffer, SignalType,
};

/// A Sample and Hold node.
///
/// Samples the input signal on rising edge of the trigger and holds
/// that value until the next trigger. Optionally applies slew (glide)
/// to smooth transitions between sampled values. Each channel holds its
/// own value, so a stereo source stays stereo.
///
/// # Use Cases
///
/// - Noise -> S&H (clocked) = random sequence generator
/// - Slow ramp -> S&H (fast clock) = staircase pattern
///
/// # Ports
///
/// - **In** (Control, Input): Signal to sample. Unpatched samples 0.
/// - **Trigger** (Gate, Input): Samples input on rising edge.
/// - **Out** (Control, Output): Held (and optionally slewed) value.
///
/// # Parameters
///
/// - **Slew** (0-1s): Time to glide a full unit toward a newly sampled value.
///   At 0, values change instantly.
pub struct SampleHold {
    /// The currently held value per channel (target for slew).
    held: Vec<f32>,
    /// Current output per channel (may be slewing toward `held`).
    current: Vec<f32>,
    trigger: RisingEdge,
}

impl SampleHold {
    pub const ID: &'static str = "sample_hold";

    pub const INPUTS: &'static [PortDefinition] = &[
        PortDefinition::input("in", "In", SignalType::Control),
        PortDefinition::input("trigger", "Trig", SignalType::Gate),
    ];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Control)];

    pub const PARAMETERS: &'static [ParameterDefinition] =
        &[ParameterDefinition::new("slew", "Slew", 0.0, 1.0, 0.0, "s")];

    const PORT_IN: usize = 0;
    const PORT_TRIGGER: usize = 1;
    const PORT_OUT: usize = 0;

    const PARAM_SLEW: usize = 0;

    pub fn new(channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            held: vec![0.0; channels],
            current: vec![0.0; channels],
            trigger: RisingEdge::new(),
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let slew_time = params[Self::PARAM_SLEW];

        // Value change per sample for a full 0->1 transition in slew_time
        let slew_rate = if slew_time > 0.0 {
            1.0 / (slew_time * ctx.sample_rate)
        } else {
            f32::INFINITY
        };

        let channels = ctx.channels.min(self.held.len());
        let output = &mut outputs[Self::PORT_OUT];

        for frame in 0..ctx.frames {
            let trigger_rising = inputs
                .control(Self::PORT_TRIGGER, frame)
                .is_some_and(|v| self.trigger.detect(v));

            for ch in 0..channels {
                if trigger_rising {
                    self.held[ch] = inputs.sample(Self::PORT_IN, frame, ch).unwrap_or(0.0);
                }
                self.current[ch] = slew(self.current[ch], self.held[ch], slew_rate);
                output.write(frame, ch, self.current[ch]);
            }
        }
    }

    pub fn reset(&mut self) {
        self.held.fill(0.0);
        self.current.fill(0.0);
        self.trigger.reset();
    }
}
