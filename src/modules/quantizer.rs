//! Pitch quantizer node.
//!
//! Maps a 0-1 control signal spanning `range` octaves onto the nearest note
//! of a scale. The output stays in the same 0-1 units as the input.

use crate::dsp::{
    InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, RisingEdge, SignalBuffer,
    SignalType, TriggerPulse,
};

/// Scales, as semitone offsets within one octave.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scale {
    Chromatic = 0,
    Major = 1,
    Minor = 2,
    Pentatonic = 3,
}

impl Scale {
    pub fn from_param(value: f32) -> Self {
        match value as usize {
            1 => Scale::Major,
            2 => Scale::Minor,
            3 => Scale::Pentatonic,
            _ => Scale::Chromatic,
        }
    }

    pub fn degrees(&self) -> &'static [i32] {
        match self {
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Pentatonic => &[0, 2, 4, 7, 9],
        }
    }

    /// Nearest scale note to `semitones`, ties going down.
    pub fn nearest(&self, semitones: f32) -> i32 {
        let octave = (semitones / 12.0).floor();
        let within = semitones - octave * 12.0;
        let mut best = 0;
        let mut best_distance = f32::MAX;
        // The next octave's root is a candidate too
        for &degree in self.degrees().iter().chain(std::iter::once(&12)) {
            let distance = (within - degree as f32).abs();
            if distance < best_distance {
                best = degree;
                best_distance = distance;
            }
        }
        octave as i32 * 12 + best
    }
}

/// Scale quantizer.
///
/// # Ports
///
/// - **In** (Control, Input): 0-1 across the whole range. Unpatched holds the last note.
/// - **Trigger** (Gate, Input): When patched, a new note is taken only on a rising edge.
/// - **Out** (Control, Output): Quantized value.
/// - **Changed** (Gate, Output): Trigger whenever the note changes.
///
/// # Parameters
///
/// - **Scale**: Chromatic, Major, Minor or Pentatonic.
/// - **Range** (1-8 octaves): Span of the 0-1 input.
pub struct Quantizer {
    note: Option<i32>,
    last_out: f32,
    trigger: RisingEdge,
    changed: TriggerPulse,
}

impl Quantizer {
    pub const ID: &'static str = "quantizer";

    pub const INPUTS: &'static [PortDefinition] = &[
        PortDefinition::input("in", "In", SignalType::Control),
        PortDefinition::input("trigger", "Trig", SignalType::Gate),
    ];

    pub const OUTPUTS: &'static [PortDefinition] = &[
        PortDefinition::output("out", "Out", SignalType::Control),
        PortDefinition::output("changed", "Changed", SignalType::Gate),
    ];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::choice(
            "scale",
            "Scale",
            &["Chromatic", "Major", "Minor", "Pentatonic"],
            0,
        ),
        ParameterDefinition::new("range", "Range", 1.0, 8.0, 2.0, "oct"),
    ];

    const PORT_IN: usize = 0;
    const PORT_TRIGGER: usize = 1;
    const PORT_OUT: usize = 0;
    const PORT_CHANGED: usize = 1;

    const PARAM_SCALE: usize = 0;
    const PARAM_RANGE: usize = 1;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            note: None,
            last_out: 0.0,
            trigger: RisingEdge::new(),
            changed: TriggerPulse::new(sample_rate),
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let scale = Scale::from_param(params[Self::PARAM_SCALE]);
        let span = params[Self::PARAM_RANGE].clamp(1.0, 8.0) * 12.0;
        let latched = inputs.is_patched(Self::PORT_TRIGGER);

        let (main, rest) = outputs.split_at_mut(Self::PORT_CHANGED);
        let out = &mut main[Self::PORT_OUT];
        let changed = &mut rest[0];

        for frame in 0..ctx.frames {
            let take = if latched {
                inputs
                    .control(Self::PORT_TRIGGER, frame)
                    .is_some_and(|v| self.trigger.detect(v))
            } else {
                true
            };

            if let (true, Some(value)) = (take, inputs.control(Self::PORT_IN, frame)) {
                let note = scale.nearest(value.clamp(0.0, 1.0) * span);
                if self.note.is_some_and(|previous| previous != note) {
                    self.changed.fire();
                }
                self.note = Some(note);
                self.last_out = note as f32 / span;
            }

            out.write_frame(frame, self.last_out);
            changed.write_frame(frame, self.changed.next());
        }
    }

    pub fn reset(&mut self) {
        self.note = None;
        self.last_out = 0.0;
        self.trigger.reset();
        self.changed.reset();
    }
}
