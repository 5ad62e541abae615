//! Compressor node.
//!
//! Feed-forward compressor: an envelope follower tracks the level of the
//! detection signal (the sidechain when patched, otherwise the input), a
//! soft-knee gain computer turns that level into gain reduction, and the
//! result is blended with the dry signal. All channels share one envelope
//! so the stereo image holds still under compression.

use crate::dsp::{
    activity::peak, Activity, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext,
    SignalBuffer, SignalType, SmoothedValue,
};

/// Peak envelope follower with separate attack and release.
struct EnvelopeFollower {
    level: f32,
    sample_rate: f32,
}

impl EnvelopeFollower {
    fn new(sample_rate: f32) -> Self {
        Self {
            level: 0.0,
            sample_rate,
        }
    }

    #[inline]
    fn coefficient(&self, ms: f32) -> f32 {
        (-1.0 / (ms * 0.001 * self.sample_rate)).exp()
    }

    #[inline]
    fn process(&mut self, input: f32, attack_ms: f32, release_ms: f32) -> f32 {
        let input_abs = input.abs();
        let coeff = if input_abs > self.level {
            self.coefficient(attack_ms)
        } else {
            self.coefficient(release_ms)
        };
        self.level = coeff * self.level + (1.0 - coeff) * input_abs;
        self.level
    }

    fn reset(&mut self) {
        self.level = 0.0;
    }
}

/// Dynamics compressor with sidechain and gain reduction output.
///
/// # Ports
///
/// - **In** (Audio, Input)
/// - **Sidechain** (Audio, Input): Replaces the input as detection source when patched.
/// - **Out** (Audio, Output)
/// - **GR** (Control, Output): Gain reduction, 0 (none) to 1 (60 dB).
pub struct Compressor {
    activity: Activity,
    envelope: EnvelopeFollower,
    threshold: SmoothedValue,
    ratio: SmoothedValue,
    attack: SmoothedValue,
    release: SmoothedValue,
    knee: SmoothedValue,
    makeup: SmoothedValue,
    mix: SmoothedValue,
}

impl Compressor {
    pub const ID: &'static str = "compressor";

    pub const INPUTS: &'static [PortDefinition] = &[
        PortDefinition::input("in", "In", SignalType::Audio),
        PortDefinition::input("sidechain", "Sidechain", SignalType::Audio),
    ];

    pub const OUTPUTS: &'static [PortDefinition] = &[
        PortDefinition::output("out", "Out", SignalType::Audio),
        PortDefinition::output("gr", "GR", SignalType::Control),
    ];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::new("threshold", "Threshold", -60.0, 0.0, -20.0, "dB"),
        ParameterDefinition::logarithmic("ratio", "Ratio", 1.0, 20.0, 4.0, ":1"),
        ParameterDefinition::logarithmic("attack", "Attack", 0.1, 100.0, 10.0, "ms"),
        ParameterDefinition::logarithmic("release", "Release", 10.0, 1000.0, 100.0, "ms"),
        ParameterDefinition::new("knee", "Knee", 0.0, 12.0, 6.0, "dB"),
        ParameterDefinition::new("makeup", "Makeup", 0.0, 24.0, 0.0, "dB"),
        ParameterDefinition::normalized("mix", "Mix", 1.0),
    ];

    const PORT_IN: usize = 0;
    const PORT_SIDECHAIN: usize = 1;
    const PORT_OUT: usize = 0;
    const PORT_GR: usize = 1;

    const PARAM_THRESHOLD: usize = 0;
    const PARAM_RATIO: usize = 1;
    const PARAM_ATTACK: usize = 2;
    const PARAM_RELEASE: usize = 3;
    const PARAM_KNEE: usize = 4;
    const PARAM_MAKEUP: usize = 5;
    const PARAM_MIX: usize = 6;

    pub fn new(sample_rate: f32) -> Self {
        let smoothed = |index: usize| {
            SmoothedValue::with_default_smoothing(Self::PARAMETERS[index].default, sample_rate)
        };
        Self {
            activity: Activity::Idle,
            envelope: EnvelopeFollower::new(sample_rate),
            threshold: smoothed(Self::PARAM_THRESHOLD),
            ratio: smoothed(Self::PARAM_RATIO),
            attack: smoothed(Self::PARAM_ATTACK),
            release: smoothed(Self::PARAM_RELEASE),
            knee: smoothed(Self::PARAM_KNEE),
            makeup: smoothed(Self::PARAM_MAKEUP),
            mix: smoothed(Self::PARAM_MIX),
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Gain reduction in dB for a detector level, with a quadratic soft knee.
    #[inline]
    pub fn compute_gain_reduction(level_db: f32, threshold: f32, ratio: f32, knee: f32) -> f32 {
        let over_threshold = level_db - threshold;
        let slope = 1.0 - 1.0 / ratio;

        if knee <= 0.0 {
            return if over_threshold <= 0.0 {
                0.0
            } else {
                over_threshold * slope
            };
        }

        let half_knee = knee / 2.0;
        if over_threshold <= -half_knee {
            0.0
        } else if over_threshold >= half_knee {
            over_threshold * slope
        } else {
            let knee_factor = over_threshold + half_knee;
            slope * knee_factor * knee_factor / (2.0 * knee)
        }
    }

    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        if !self.activity.begin_pass(inputs.is_patched(Self::PORT_IN)) {
            return;
        }

        self.threshold.set_target(params[Self::PARAM_THRESHOLD]);
        self.ratio.set_target(params[Self::PARAM_RATIO]);
        self.attack.set_target(params[Self::PARAM_ATTACK]);
        self.release.set_target(params[Self::PARAM_RELEASE]);
        self.knee.set_target(params[Self::PARAM_KNEE]);
        self.makeup.set_target(params[Self::PARAM_MAKEUP]);
        self.mix.set_target(params[Self::PARAM_MIX]);

        let input = inputs.get(Self::PORT_IN);
        let detector_port = if inputs.is_patched(Self::PORT_SIDECHAIN) {
            Self::PORT_SIDECHAIN
        } else {
            Self::PORT_IN
        };

        let (out_slice, gr_slice) = outputs.split_at_mut(Self::PORT_GR);
        let out = &mut out_slice[Self::PORT_OUT];
        let gr_out = &mut gr_slice[0];

        let channels = ctx.channels;
        for frame in 0..ctx.frames {
            let threshold_db = self.threshold.next();
            let ratio = self.ratio.next().max(1.0);
            let attack_ms = self.attack.next().max(0.1);
            let release_ms = self.release.next().max(10.0);
            let knee_db = self.knee.next().max(0.0);
            let makeup_db = self.makeup.next();
            let mix = self.mix.next().clamp(0.0, 1.0);

            let detect = (0..channels)
                .filter_map(|ch| inputs.sample(detector_port, frame, ch))
                .fold(0.0f32, |acc, s| acc.max(s.abs()));
            let envelope_level = self.envelope.process(detect, attack_ms, release_ms);

            let level_db = 20.0 * envelope_level.max(0.00001).log10();
            let gr_db = Self::compute_gain_reduction(level_db, threshold_db, ratio, knee_db);
            let gain = 10.0_f32.powf((makeup_db - gr_db) / 20.0);

            let start = frame * channels;
            for idx in start..start + channels {
                let dry = input.map_or(0.0, |buf| buf[idx]);
                out.samples[idx] = dry * (1.0 - mix) + dry * gain * mix;
            }
            gr_out.write_frame(frame, (gr_db / 60.0).clamp(0.0, 1.0));
        }

        if self.activity.end_pass(peak(&out.samples[..ctx.samples()])) {
            self.envelope.reset();
        }
    }

    pub fn reset(&mut self) {
        self.activity = Activity::Idle;
        self.envelope.reset();
        for smoothed in [
            &mut self.threshold,
            &mut self.ratio,
            &mut self.attack,
            &mut self.release,
            &mut self.knee,
            &mut self.makeup,
            &mut self.mix,
        ] {
            let target = smoothed.target();
            smoothed.set_immediate(target);
        }
    }
}
