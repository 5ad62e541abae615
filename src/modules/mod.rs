//! Node kinds.
//!
//! The set of kinds is closed: [`NodeKind`] names them and carries their
//! static port and parameter tables, [`SignalNode`] holds one live node and
//! dispatches processing with a `match`.

pub mod artifact;
pub mod clock;
pub mod compressor;
pub mod dc;
pub mod divider;
pub mod gain;
pub mod glide;
pub mod noise;
pub mod oscillator;
pub mod polarizer;
pub mod quantizer;
pub mod reverb;
pub mod sample_hold;
pub mod speaker;
pub mod stereo;
pub mod vca;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dsp::{
    parameter::index_of, port::position_of, InputBuffers, ParameterDefinition, PortDefinition,
    ProcessContext, SignalBuffer, MAX_PARAMETERS,
};

pub use artifact::Artifact;
pub use clock::{Clock, ClockMode};
pub use compressor::Compressor;
pub use dc::Dc;
pub use divider::Divider;
pub use gain::Gain;
pub use glide::Glide;
pub use noise::{Noise, NoiseColor};
pub use oscillator::{Oscillator, Waveform};
pub use polarizer::Polarizer;
pub use quantizer::{Quantizer, Scale};
pub use reverb::Reverb;
pub use sample_hold::SampleHold;
pub use speaker::Speaker;
pub use stereo::Stereo;
pub use vca::Vca;

/// Every node kind the engine can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Oscillator,
    Clock,
    Divider,
    Gain,
    Vca,
    Polarizer,
    Dc,
    Glide,
    Noise,
    Artifact,
    Quantizer,
    SampleHold,
    Compressor,
    Reverb,
    Stereo,
    Speaker,
}

impl NodeKind {
    pub const ALL: [NodeKind; 16] = [
        NodeKind::Oscillator,
        NodeKind::Clock,
        NodeKind::Divider,
        NodeKind::Gain,
        NodeKind::Vca,
        NodeKind::Polarizer,
        NodeKind::Dc,
        NodeKind::Glide,
        NodeKind::Noise,
        NodeKind::Artifact,
        NodeKind::Quantizer,
        NodeKind::SampleHold,
        NodeKind::Compressor,
        NodeKind::Reverb,
        NodeKind::Stereo,
        NodeKind::Speaker,
    ];

    pub fn inputs(&self) -> &'static [PortDefinition] {
        match self {
            NodeKind::Oscillator => Oscillator::INPUTS,
            NodeKind::Clock => Clock::INPUTS,
            NodeKind::Divider => Divider::INPUTS,
            NodeKind::Gain => Gain::INPUTS,
            NodeKind::Vca => Vca::INPUTS,
            NodeKind::Polarizer => Polarizer::INPUTS,
            NodeKind::Dc => Dc::INPUTS,
            NodeKind::Glide => Glide::INPUTS,
            NodeKind::Noise => Noise::INPUTS,
            NodeKind::Artifact => Artifact::INPUTS,
            NodeKind::Quantizer => Quantizer::INPUTS,
            NodeKind::SampleHold => SampleHold::INPUTS,
            NodeKind::Compressor => Compressor::INPUTS,
            NodeKind::Reverb => Reverb::INPUTS,
            NodeKind::Stereo => Stereo::INPUTS,
            NodeKind::Speaker => Speaker::INPUTS,
        }
    }

    pub fn outputs(&self) -> &'static [PortDefinition] {
        match self {
            NodeKind::Oscillator => Oscillator::OUTPUTS,
            NodeKind::Clock => Clock::OUTPUTS,
            NodeKind::Divider => Divider::OUTPUTS,
            NodeKind::Gain => Gain::OUTPUTS,
            NodeKind::Vca => Vca::OUTPUTS,
            NodeKind::Polarizer => Polarizer::OUTPUTS,
            NodeKind::Dc => Dc::OUTPUTS,
            NodeKind::Glide => Glide::OUTPUTS,
            NodeKind::Noise => Noise::OUTPUTS,
            NodeKind::Artifact => Artifact::OUTPUTS,
            NodeKind::Quantizer => Quantizer::OUTPUTS,
            NodeKind::SampleHold => SampleHold::OUTPUTS,
            NodeKind::Compressor => Compressor::OUTPUTS,
            NodeKind::Reverb => Reverb::OUTPUTS,
            NodeKind::Stereo => Stereo::OUTPUTS,
            NodeKind::Speaker => Speaker::OUTPUTS,
        }
    }

    pub fn parameters(&self) -> &'static [ParameterDefinition] {
        match self {
            NodeKind::Oscillator => Oscillator::PARAMETERS,
            NodeKind::Clock => Clock::PARAMETERS,
            NodeKind::Divider => Divider::PARAMETERS,
            NodeKind::Gain => Gain::PARAMETERS,
            NodeKind::Vca => Vca::PARAMETERS,
            NodeKind::Polarizer => Polarizer::PARAMETERS,
            NodeKind::Dc => Dc::PARAMETERS,
            NodeKind::Glide => Glide::PARAMETERS,
            NodeKind::Noise => Noise::PARAMETERS,
            NodeKind::Artifact => Artifact::PARAMETERS,
            NodeKind::Quantizer => Quantizer::PARAMETERS,
            NodeKind::SampleHold => SampleHold::PARAMETERS,
            NodeKind::Compressor => Compressor::PARAMETERS,
            NodeKind::Reverb => Reverb::PARAMETERS,
            NodeKind::Stereo => Stereo::PARAMETERS,
            NodeKind::Speaker => Speaker::PARAMETERS,
        }
    }

    /// Stable string id, as persisted.
    pub fn id(&self) -> &'static str {
        match self {
            NodeKind::Oscillator => Oscillator::ID,
            NodeKind::Clock => Clock::ID,
            NodeKind::Divider => Divider::ID,
            NodeKind::Gain => Gain::ID,
            NodeKind::Vca => Vca::ID,
            NodeKind::Polarizer => Polarizer::ID,
            NodeKind::Dc => Dc::ID,
            NodeKind::Glide => Glide::ID,
            NodeKind::Noise => Noise::ID,
            NodeKind::Artifact => Artifact::ID,
            NodeKind::Quantizer => Quantizer::ID,
            NodeKind::SampleHold => SampleHold::ID,
            NodeKind::Compressor => Compressor::ID,
            NodeKind::Reverb => Reverb::ID,
            NodeKind::Stereo => Stereo::ID,
            NodeKind::Speaker => Speaker::ID,
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.id() == id)
    }

    /// Sinks are what the evaluator pulls from.
    pub fn is_sink(&self) -> bool {
        matches!(self, NodeKind::Speaker)
    }

    pub fn input_index(&self, id: &str) -> Option<usize> {
        position_of(self.inputs(), id)
    }

    pub fn output_index(&self, id: &str) -> Option<usize> {
        position_of(self.outputs(), id)
    }

    pub fn parameter_index(&self, id: &str) -> Option<usize> {
        index_of(self.parameters(), id)
    }

    /// Default value for every parameter slot; unused slots are zero.
    pub fn default_parameters(&self) -> [f32; MAX_PARAMETERS] {
        let mut values = [0.0; MAX_PARAMETERS];
        for (value, def) in values.iter_mut().zip(self.parameters()) {
            *value = def.default;
        }
        values
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One live node: the kind's DSP state.
///
/// Built on the control thread (some kinds allocate delay lines sized for
/// the engine's channel count), then moved to the audio thread.
pub enum SignalNode {
    Oscillator(Oscillator),
    Clock(Clock),
    Divider(Divider),
    Gain(Gain),
    Vca(Vca),
    Polarizer(Polarizer),
    Dc(Dc),
    Glide(Glide),
    Noise(Noise),
    Artifact(Artifact),
    Quantizer(Quantizer),
    SampleHold(SampleHold),
    Compressor(Compressor),
    Reverb(Reverb),
    Stereo(Stereo),
    Speaker(Speaker),
}

impl fmt::Debug for SignalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignalNode").field(&self.kind()).finish()
    }
}

impl SignalNode {
    pub fn new(kind: NodeKind, sample_rate: f32, channels: usize) -> Self {
        match kind {
            NodeKind::Oscillator => SignalNode::Oscillator(Oscillator::new()),
            NodeKind::Clock => SignalNode::Clock(Clock::new(sample_rate)),
            NodeKind::Divider => SignalNode::Divider(Divider::new()),
            NodeKind::Gain => SignalNode::Gain(Gain::new()),
            NodeKind::Vca => SignalNode::Vca(Vca::new()),
            NodeKind::Polarizer => SignalNode::Polarizer(Polarizer::new()),
            NodeKind::Dc => SignalNode::Dc(Dc::new()),
            NodeKind::Glide => SignalNode::Glide(Glide::new()),
            NodeKind::Noise => SignalNode::Noise(Noise::new(channels)),
            NodeKind::Artifact => SignalNode::Artifact(Artifact::new(channels)),
            NodeKind::Quantizer => SignalNode::Quantizer(Quantizer::new(sample_rate)),
            NodeKind::SampleHold => SignalNode::SampleHold(SampleHold::new(channels)),
            NodeKind::Compressor => SignalNode::Compressor(Compressor::new(sample_rate)),
            NodeKind::Reverb => SignalNode::Reverb(Reverb::new(sample_rate, channels)),
            NodeKind::Stereo => SignalNode::Stereo(Stereo::new()),
            NodeKind::Speaker => SignalNode::Speaker(Speaker::new()),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            SignalNode::Oscillator(_) => NodeKind::Oscillator,
            SignalNode::Clock(_) => NodeKind::Clock,
            SignalNode::Divider(_) => NodeKind::Divider,
            SignalNode::Gain(_) => NodeKind::Gain,
            SignalNode::Vca(_) => NodeKind::Vca,
            SignalNode::Polarizer(_) => NodeKind::Polarizer,
            SignalNode::Dc(_) => NodeKind::Dc,
            SignalNode::Glide(_) => NodeKind::Glide,
            SignalNode::Noise(_) => NodeKind::Noise,
            SignalNode::Artifact(_) => NodeKind::Artifact,
            SignalNode::Quantizer(_) => NodeKind::Quantizer,
            SignalNode::SampleHold(_) => NodeKind::SampleHold,
            SignalNode::Compressor(_) => NodeKind::Compressor,
            SignalNode::Reverb(_) => NodeKind::Reverb,
            SignalNode::Stereo(_) => NodeKind::Stereo,
            SignalNode::Speaker(_) => NodeKind::Speaker,
        }
    }

    /// Runs one pass.
    ///
    /// `outputs` holds one cleared buffer per output port, `params` one
    /// snapshot value per parameter. A node that returns without writing
    /// leaves silence behind.
    ///
    /// REAL-TIME SAFE: no node allocates or locks in here.
    pub fn process(
        &mut self,
        inputs: &InputBuffers<'_>,
        outputs: &mut [SignalBuffer],
        params: &[f32],
        ctx: &ProcessContext,
    ) {
        match self {
            SignalNode::Oscillator(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Clock(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Divider(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Gain(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Vca(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Polarizer(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Dc(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Glide(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Noise(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Artifact(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Quantizer(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::SampleHold(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Compressor(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Reverb(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Stereo(n) => n.process(inputs, outputs, params, ctx),
            SignalNode::Speaker(n) => n.process(inputs, outputs, params, ctx),
        }
    }

    /// Forgets running state (phases, held values, tails).
    pub fn reset(&mut self) {
        match self {
            SignalNode::Oscillator(n) => n.reset(),
            SignalNode::Clock(n) => n.reset(),
            SignalNode::Divider(n) => n.reset(),
            SignalNode::Glide(n) => n.reset(),
            SignalNode::Noise(n) => n.reset(),
            SignalNode::Artifact(n) => n.reset(),
            SignalNode::Quantizer(n) => n.reset(),
            SignalNode::SampleHold(n) => n.reset(),
            SignalNode::Compressor(n) => n.reset(),
            SignalNode::Reverb(n) => n.reset(),
            // Ramped scalars carry no state worth resetting
            SignalNode::Gain(_)
            | SignalNode::Vca(_)
            | SignalNode::Polarizer(_)
            | SignalNode::Dc(_)
            | SignalNode::Stereo(_)
            | SignalNode::Speaker(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::{MAX_INPUT_PORTS, MAX_OUTPUT_PORTS};

    #[test]
    fn test_kind_ids_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_id(kind.id()), Some(kind));
            assert_eq!(kind.to_string(), kind.id());
        }
        assert_eq!(NodeKind::from_id("theremin"), None);
    }

    #[test]
    fn test_serde_names_match_ids() {
        for kind in NodeKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.id()));
        }
    }

    #[test]
    fn test_tables_fit_the_engine_limits() {
        for kind in NodeKind::ALL {
            assert!(kind.inputs().len() <= MAX_INPUT_PORTS, "{}", kind);
            assert!(kind.outputs().len() <= MAX_OUTPUT_PORTS, "{}", kind);
            assert!(!kind.outputs().is_empty(), "{}", kind);
            assert!(kind.parameters().len() <= MAX_PARAMETERS, "{}", kind);
            assert!(kind.inputs().iter().all(|p| p.is_input()));
            assert!(kind.outputs().iter().all(|p| p.is_output()));
        }
    }

    #[test]
    fn test_defaults_are_in_range() {
        for kind in NodeKind::ALL {
            let defaults = kind.default_parameters();
            for (i, def) in kind.parameters().iter().enumerate() {
                assert!(defaults[i] >= def.min && defaults[i] <= def.max, "{}.{}", kind, def.id);
            }
        }
    }

    #[test]
    fn test_only_speaker_is_a_sink() {
        let sinks: Vec<_> = NodeKind::ALL.iter().filter(|k| k.is_sink()).collect();
        assert_eq!(sinks, vec![&NodeKind::Speaker]);
    }

    #[test]
    fn test_port_lookup() {
        assert_eq!(NodeKind::Vca.input_index("cv"), Some(1));
        assert_eq!(NodeKind::Clock.output_index("reset"), Some(1));
        assert_eq!(NodeKind::Clock.input_index("reset"), Some(0));
        assert_eq!(NodeKind::Gain.parameter_index("amp"), Some(0));
        assert_eq!(NodeKind::Gain.input_index("sidechain"), None);
    }

    #[test]
    fn test_every_kind_processes_silence() {
        for kind in NodeKind::ALL {
            let mut node = SignalNode::new(kind, 48000.0, 2);
            assert_eq!(node.kind(), kind);

            let ctx = ProcessContext::new(48000.0, 2, 64);
            let mut outputs: Vec<SignalBuffer> = kind
                .outputs()
                .iter()
                .map(|p| SignalBuffer::new(64, 2, p.signal_type))
                .collect();
            let params = kind.default_parameters();
            node.process(&InputBuffers::new(2), &mut outputs, &params, &ctx);
            node.reset();

            for buffer in &outputs {
                assert!(buffer.samples.iter().all(|s| s.is_finite()), "{}", kind);
            }
        }
    }
}
