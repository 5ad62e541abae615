//! Reverb node.
//!
//! Freeverb topology: the input is summed to mono, pre-delayed, then fed
//! through eight parallel damped combs and four series allpasses per
//! channel. Each channel's tank is detuned by a fixed spread so the
//! channels decorrelate.
//!
//! Every delay line is allocated at construction (on the control thread)
//! at its maximum length; the audio thread only moves read positions.

use crate::dsp::{
    activity::peak, Activity, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext,
    SignalBuffer, SignalType, SmoothedValue,
};

/// Comb delays in samples at 44.1 kHz.
const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass delays in samples at 44.1 kHz.
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];

/// Detuning between adjacent channels' tanks.
const STEREO_SPREAD: usize = 23;

const MAX_PREDELAY_SECONDS: f32 = 0.1;

/// Delay length scaled from the 44.1 kHz tuning to `sample_rate`.
fn scaled(tuning: usize, sample_rate: f32) -> usize {
    ((tuning as f32 * sample_rate / 44100.0) as usize).max(1)
}

/// Comb filter with a one-pole lowpass in the feedback path.
struct CombFilter {
    buffer: Vec<f32>,
    write_pos: usize,
    filter_state: f32,
}

impl CombFilter {
    fn new(max_len: usize) -> Self {
        Self {
            buffer: vec![0.0; max_len.max(1)],
            write_pos: 0,
            filter_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, delay: usize, feedback: f32, damping: f32) -> f32 {
        let len = self.buffer.len();
        let delay = delay.clamp(1, len);
        let read_pos = (self.write_pos + len - delay) % len;
        let output = self.buffer[read_pos];

        self.filter_state = output * (1.0 - damping) + self.filter_state * damping;
        self.buffer[self.write_pos] = input + self.filter_state * feedback;
        self.write_pos = (self.write_pos + 1) % len;

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
    }
}

struct AllpassFilter {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl AllpassFilter {
    const FEEDBACK: f32 = 0.5;

    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            write_pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.write_pos];
        let output = -input + buffered;

        self.buffer[self.write_pos] = input + buffered * Self::FEEDBACK;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    fn new(max_samples: usize) -> Self {
        Self {
            buffer: vec![0.0; max_samples.max(1) + 1],
            write_pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, delay: usize) -> f32 {
        let len = self.buffer.len();
        self.buffer[self.write_pos] = input;
        let read_pos = (self.write_pos + len - delay.min(len - 1)) % len;
        let output = self.buffer[read_pos];
        self.write_pos = (self.write_pos + 1) % len;
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
    }
}

/// One channel's combs and allpasses.
struct Tank {
    combs: Vec<CombFilter>,
    comb_lengths: [usize; 8],
    allpasses: Vec<AllpassFilter>,
}

impl Tank {
    fn new(spread: usize, sample_rate: f32) -> Self {
        let mut comb_lengths = [0; 8];
        for (len, &tuning) in comb_lengths.iter_mut().zip(COMB_TUNINGS.iter()) {
            *len = scaled(tuning + spread, sample_rate);
        }
        Self {
            combs: comb_lengths.iter().map(|&len| CombFilter::new(len)).collect(),
            comb_lengths,
            allpasses: ALLPASS_TUNINGS
                .iter()
                .map(|&t| AllpassFilter::new(scaled(t + spread, sample_rate)))
                .collect(),
        }
    }

    #[inline]
    fn process(&mut self, input: f32, room: f32, feedback: f32, damping: f32) -> f32 {
        let mut sum = 0.0;
        for (comb, &len) in self.combs.iter_mut().zip(self.comb_lengths.iter()) {
            let delay = (len as f32 * room) as usize;
            sum += comb.process(input, delay, feedback, damping);
        }
        let mut wet = sum * 0.125;
        for allpass in self.allpasses.iter_mut() {
            wet = allpass.process(wet);
        }
        wet
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.allpasses.iter_mut().for_each(AllpassFilter::clear);
    }
}

/// Freeverb-style reverb with adjustable size, decay, and damping.
///
/// # Parameters
///
/// - **Size** (0-1): Scales comb delays between half and full length.
/// - **Decay** (0.1-30 s): Tail length; sets the comb feedback.
/// - **Damping** (0-1): High-frequency absorption in the tail.
/// - **Pre-Delay** (0-100 ms)
/// - **Mix** (0-1): Dry/wet.
/// - **Width** (0-1): Crossfeed between the first two channels' tails.
pub struct Reverb {
    sample_rate: f32,
    activity: Activity,
    predelay: DelayLine,
    tanks: Vec<Tank>,
    wet: Vec<f32>,
    size: SmoothedValue,
    decay: SmoothedValue,
    damping: SmoothedValue,
    predelay_ms: SmoothedValue,
    mix: SmoothedValue,
    width: SmoothedValue,
}

impl Reverb {
    pub const ID: &'static str = "reverb";

    pub const INPUTS: &'static [PortDefinition] =
        &[PortDefinition::input("in", "In", SignalType::Audio)];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::normalized("size", "Size", 0.5),
        ParameterDefinition::logarithmic("decay", "Decay", 0.1, 30.0, 2.0, "s"),
        ParameterDefinition::normalized("damping", "Damping", 0.5),
        ParameterDefinition::new("predelay", "Pre-Delay", 0.0, 100.0, 0.0, "ms"),
        ParameterDefinition::normalized("mix", "Mix", 0.3),
        ParameterDefinition::normalized("width", "Width", 1.0),
    ];

    const PORT_IN: usize = 0;
    const PORT_OUT: usize = 0;

    const PARAM_SIZE: usize = 0;
    const PARAM_DECAY: usize = 1;
    const PARAM_DAMPING: usize = 2;
    const PARAM_PREDELAY: usize = 3;
    const PARAM_MIX: usize = 4;
    const PARAM_WIDTH: usize = 5;

    pub fn new(sample_rate: f32, channels: usize) -> Self {
        let channels = channels.max(1);
        let smoothed = |index: usize| {
            SmoothedValue::with_default_smoothing(Self::PARAMETERS[index].default, sample_rate)
        };
        Self {
            sample_rate,
            activity: Activity::Idle,
            predelay: DelayLine::new((MAX_PREDELAY_SECONDS * sample_rate) as usize),
            tanks: (0..channels)
                .map(|ch| Tank::new(ch * STEREO_SPREAD, sample_rate))
                .collect(),
            wet: vec![0.0; channels],
            size: smoothed(Self::PARAM_SIZE),
            decay: smoothed(Self::PARAM_DECAY),
            damping: smoothed(Self::PARAM_DAMPING),
            predelay_ms: smoothed(Self::PARAM_PREDELAY),
            mix: smoothed(Self::PARAM_MIX),
            width: smoothed(Self::PARAM_WIDTH),
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    /// Comb feedback that gives a tail of roughly `decay_seconds`.
    fn decay_to_feedback(decay_seconds: f32, avg_delay_samples: f32, sample_rate: f32) -> f32 {
        let avg_delay_seconds = avg_delay_samples / sample_rate;
        if decay_seconds <= 0.0 || avg_delay_seconds <= 0.0 {
            return 0.0;
        }
        let feedback = (-3.0 * avg_delay_seconds / decay_seconds).exp();
        feedback.clamp(0.0, 0.98)
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

        self.size.set_target(params[Self::PARAM_SIZE]);
        self.decay.set_target(params[Self::PARAM_DECAY]);
        self.damping.set_target(params[Self::PARAM_DAMPING]);
        self.predelay_ms.set_target(params[Self::PARAM_PREDELAY]);
        self.mix.set_target(params[Self::PARAM_MIX]);
        self.width.set_target(params[Self::PARAM_WIDTH]);

        let input = inputs.get(Self::PORT_IN);
        let out = &mut outputs[Self::PORT_OUT];
        let channels = ctx.channels.min(self.tanks.len());
        let avg_tuning = COMB_TUNINGS.iter().sum::<usize>() as f32 / COMB_TUNINGS.len() as f32;
        let scale = self.sample_rate / 44100.0;

        for frame in 0..ctx.frames {
            let room = 0.5 + self.size.next().clamp(0.0, 1.0) * 0.5;
            let decay = self.decay.next();
            let damping = self.damping.next().clamp(0.0, 1.0);
            let predelay = (self.predelay_ms.next().max(0.0) * 0.001 * self.sample_rate) as usize;
            let mix = self.mix.next().clamp(0.0, 1.0);
            let width = self.width.next().clamp(0.0, 1.0);

            let feedback =
                Self::decay_to_feedback(decay, avg_tuning * scale * room, self.sample_rate);

            let start = frame * ctx.channels;
            let mono = match input {
                Some(buf) => buf[start..start + channels].iter().sum::<f32>() / channels as f32,
                None => 0.0,
            };
            let predelayed = self.predelay.process(mono, predelay);

            for (wet, tank) in self.wet.iter_mut().zip(self.tanks.iter_mut()).take(channels) {
                *wet = tank.process(predelayed, room, feedback, damping);
            }

            // Freeverb's wet1/wet2 crossfeed between the first pair
            if channels >= 2 {
                let wet1 = width * 0.5 + 0.5;
                let wet2 = (1.0 - width) * 0.5;
                let (l, r) = (self.wet[0], self.wet[1]);
                self.wet[0] = l * wet1 + r * wet2;
                self.wet[1] = r * wet1 + l * wet2;
            }

            for ch in 0..channels {
                let dry = input.map_or(0.0, |buf| buf[start + ch]);
                out.samples[start + ch] = dry * (1.0 - mix) + self.wet[ch] * mix;
            }
        }

        if self.activity.end_pass(peak(&out.samples[..ctx.samples()])) {
            self.clear();
        }
    }

    fn clear(&mut self) {
        self.predelay.clear();
        self.tanks.iter_mut().for_each(Tank::clear);
        self.wet.fill(0.0);
    }

    pub fn reset(&mut self) {
        self.activity = Activity::Idle;
        self.clear();
    }
}
