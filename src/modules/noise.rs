//! Noise source.
//!
//! White noise straight from the generator, or pink noise through Paul
//! Kellet's filter bank. Every channel gets its own stream.

use crate::dsp::{
    BlockRamp, InputBuffers, ParameterDefinition, PortDefinition, ProcessContext, SignalBuffer,
    SignalType,
};

/// Noise color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoiseColor {
    White = 0,
    Pink = 1,
}

impl NoiseColor {
    pub fn from_param(value: f32) -> Self {
        if value as usize == 1 {
            NoiseColor::Pink
        } else {
            NoiseColor::White
        }
    }
}

/// Paul Kellet's refined pink filter, one per channel.
#[derive(Clone, Copy, Debug, Default)]
struct PinkFilter {
    b: [f32; 7],
}

impl PinkFilter {
    #[inline]
    fn process(&mut self, white: f32) -> f32 {
        let b = &mut self.b;
        b[0] = 0.99886 * b[0] + white * 0.055_517_9;
        b[1] = 0.99332 * b[1] + white * 0.075_075_9;
        b[2] = 0.96900 * b[2] + white * 0.153_852;
        b[3] = 0.86650 * b[3] + white * 0.310_485_6;
        b[4] = 0.55000 * b[4] + white * 0.532_952_2;
        b[5] = -0.7616 * b[5] - white * 0.016_898;
        let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
        b[6] = white * 0.115_926;
        pink * 0.11
    }
}

pub struct Noise {
    rng: fastrand::Rng,
    pink: Vec<PinkFilter>,
    level: BlockRamp,
}

impl Noise {
    pub const ID: &'static str = "noise";

    pub const INPUTS: &'static [PortDefinition] = &[];

    pub const OUTPUTS: &'static [PortDefinition] =
        &[PortDefinition::output("out", "Out", SignalType::Audio)];

    pub const PARAMETERS: &'static [ParameterDefinition] = &[
        ParameterDefinition::choice("color", "Color", &["White", "Pink"], 0),
        ParameterDefinition::normalized("level", "Level", 0.5),
    ];

    const PARAM_COLOR: usize = 0;
    const PARAM_LEVEL: usize = 1;

    pub fn new(channels: usize) -> Self {
        Self::with_rng(fastrand::Rng::new(), channels)
    }

    /// Deterministic stream, for reproducible renders.
    pub fn with_seed(seed: u64, channels: usize) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed), channels)
    }

    fn with_rng(rng: fastrand::Rng, channels: usize) -> Self {
        Self {
            rng,
            pink: vec![PinkFilter::default(); channels.max(1)],
            level: BlockRamp::new(0.5),
        }
    }

    pub fn process(
        &mut self,
        _inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        let color = NoiseColor::from_param(params[Self::PARAM_COLOR]);
        let level = self.level.segment(params[Self::PARAM_LEVEL], ctx.frames);
        let out = &mut outputs[0];

        let channels = ctx.channels.min(self.pink.len());
        for frame in 0..ctx.frames {
            let gain = level.at(frame);
            for ch in 0..channels {
                let white = self.rng.f32() * 2.0 - 1.0;
                let value = match color {
                    NoiseColor::White => white,
                    NoiseColor::Pink => self.pink[ch].process(white),
                };
                out.write(frame, ch, value * gain);
            }
        }
    }

    pub fn reset(&mut self) {
        self.pink.fill(PinkFilter::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(noise: &mut Noise, color: NoiseColor, frames: usize, channels: usize) -> Vec<f32> {
        let ctx = ProcessContext::new(48000.0, channels, frames);
        let mut outputs = vec![SignalBuffer::audio(frames, channels)];
        noise.process(
            &InputBuffers::new(channels),
            &mut outputs,
            &[color as usize as f32, 1.0],
            &ctx,
        );
        outputs.remove(0).samples
    }

    #[test]
    fn test_white_noise_range() {
        let mut noise = Noise::with_seed(7, 1);
        let out = render(&mut noise, NoiseColor::White, 4096, 1);
        assert!(out.iter().all(|s| (-1.0..=1.0).contains(s)));
        let mean = out.iter().sum::<f32>() / out.len() as f32;
        assert!(mean.abs() < 0.05);
        assert!(out.iter().any(|&s| s.abs() > 0.5));
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = render(&mut Noise::with_seed(42, 2), NoiseColor::Pink, 256, 2);
        let b = render(&mut Noise::with_seed(42, 2), NoiseColor::Pink, 256, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_channels_are_independent() {
        let out = render(&mut Noise::with_seed(3, 2), NoiseColor::White, 64, 2);
        let differing = out.chunks(2).filter(|f| f[0] != f[1]).count();
        assert!(differing > 60);
    }

    #[test]
    fn test_pink_is_bounded() {
        let out = render(&mut Noise::with_seed(11, 1), NoiseColor::Pink, 48000, 1);
        assert!(out.iter().all(|s| s.abs() < 3.0));
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_zero_level_is_silent() {
        let mut noise = Noise::with_seed(1, 1);
        let ctx = ProcessContext::new(48000.0, 1, 32);
        let mut outputs = vec![SignalBuffer::audio(32, 1)];
        noise.process(&InputBuffers::new(1), &mut outputs, &[0.0, 0.0], &ctx);
        assert!(outputs[0].samples.iter().all(|&s| s == 0.0));
    }
}
