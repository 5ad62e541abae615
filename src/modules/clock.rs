//! Clock node.
//!
//! Generates a measure-long phase ramp and the pulse and reset signals
//! derived from it. One measure lasts `480 / bpm` seconds.

use crate::dsp::{
    edge::TriggerPulse, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext,
    RisingEdge, SignalBuffer, SignalType,
};

/// What the clock's main output carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockMode {
    /// Ramp from 0.0 to 1.0 over one measure.
    Phase = 0,
    /// Gate train with a configurable number of pulses per measure.
    Pulse = 1,
    /// One short trigger at the top of every measure.
    Reset = 2,
}

impl ClockMode {
    /// Convert from parameter value (0-2) to mode.
    pub fn from_param(value: f32) -> Self {
        match value as usize {
            0 => ClockMode::Phase,
            1 => ClockMode::Pulse,
            2 => ClockMode::Reset,
            _ => ClockMode::Phase,
        }
    }
}

/// Pulses per measure for each step of the `pulses` parameter.
const PULSE_COUNTS: [f64; 5] = [1.0, 2.0, 4.0, 8.0, 16.0];

/// Length of one measure in seconds at `bpm`.
pub fn measure_period(bpm: f32) -> f64 {
    480.0 / bpm.max(1.0) as f64
}

/// Master clock.
///
/// Time is counted in whole samples, so at 120 BPM and 48 kHz one cycle is
/// exactly 192000 samples and the ramp reads `n / 192000` at sample `n`.
///
/// # Ports
///
/// - **Reset** (Gate, Input): Restarts the measure on a rising edge.
/// - **Out** (Control, Output): Phase ramp, pulse train or reset trigger, per Mode.
/// - **Reset** (Gate, Output): Trigger at the top of every measure.
///
/// # Parameters
///
/// - **BPM** (20-300): Tempo.
/// - **Mode**: Phase, Pulse or Reset.
/// - **Pulses**: 1, 2, 4, 8 or 16 pulses per measure in Pulse mode.
/// - **Width** (0-1): Pulse duty cycle.
/// - **Run** (toggle): When off the phase freezes and no pulses are emitted.
pub struct Clock {
    /// Samples elapsed in the current measure.
    elapsed: f64,
    /// Length of the measure in samples, from the last pass.
    period: f64,
    reset_in: RisingEdge,
    top: TriggerPulse,
}

impl Clock {
    pub const ID: &'static str = "clock";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("reset", "Reset", SignalType::Gate)];

    pub const OUTPUTS: &'static [PortDefinition] = &[
        PortDefinition::output("out", "Out", SignalType::Control),
        PortDefinition::output("reset", "Reset", SignalType::Gate),
    ];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::new("bpm", "BPM", 20.0, 300.0, 120.0, "BPM"),
        ParameterDefinition::choice("mode", "Mode", &["Phase", "Pulse", "Reset"], 0),
        ParameterDefinition::choice("pulses", "Pulses", &["1", "2", "4", "8", "16"], 2),
        ParameterDefinition::new("width", "Width", 0.01, 0.99, 0.5, "%"),
        ParameterDefinition::toggle("run", "Run", true),
    ];

    const PORT_RESET_IN: usize = 0;
    const PORT_OUT: usize = 0;
    const PORT_RESET_OUT: usize = 1;

    const PARAM_BPM: usize = 0;
    const PARAM_MODE: usize = 1;
    const PARAM_PULSES: usize = 2;
    const PARAM_WIDTH: usize = 3;
    const PARAM_RUN: usize = 4;

    /// Creates a clock sitting at the top of a measure.
    pub fn new(sample_rate: f32) -> Self {
        let mut top = TriggerPulse::new(sample_rate);
        top.fire();
        Self {
            elapsed: 0.0,
            period: 0.0,
            reset_in: RisingEdge::new(),
            top,
        }
    }

    /// Current position in the measure (0.0 to 1.0).
    pub fn phase(&self) -> f64 {
        if self.period > 0.0 {
            self.elapsed / self.period
        } else {
            0.0
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let mode = ClockMode::from_param(params[Self::PARAM_MODE]);
        let pulses = PULSE_COUNTS
            .get(params[Self::PARAM_PULSES] as usize)
            .copied()
            .unwrap_or(4.0);
        let width = params[Self::PARAM_WIDTH].clamp(0.01, 0.99) as f64;
        let running = params[Self::PARAM_RUN] > 0.5;

        // Keep the position within the measure when the tempo moves
        let period = (measure_period(params[Self::PARAM_BPM]) * ctx.sample_rate as f64).max(1.0);
        if period != self.period {
            if self.period > 0.0 {
                self.elapsed = self.elapsed / self.period * period;
            }
            self.period = period;
        }

        let (main, rest) = outputs.split_at_mut(Self::PORT_RESET_OUT);
        let out = &mut main[Self::PORT_OUT];
        let reset_out = &mut rest[0];

        for frame in 0..ctx.frames {
            let reset = inputs
                .control(Self::PORT_RESET_IN, frame)
                .is_some_and(|v| self.reset_in.detect(v));
            if reset {
                self.elapsed = 0.0;
                self.top.fire();
            }

            let phase = self.elapsed / self.period;
            let trigger = if running { self.top.next() } else { 0.0 };
            let pulse = if running && (phase * pulses).fract() < width {
                1.0
            } else {
                0.0
            };

            let value = match mode {
                ClockMode::Phase => phase as f32,
                ClockMode::Pulse => pulse,
                ClockMode::Reset => trigger,
            };
            out.write_frame(frame, value);
            reset_out.write_frame(frame, trigger);

            if running {
                self.elapsed += 1.0;
                if self.elapsed >= self.period {
                    self.elapsed -= self.period;
                    self.top.fire();
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.reset_in.reset();
        self.top.fire();
    }
}
