//! DSP building blocks shared by every node kind.
//!
//! Signal buffers, jack and parameter definitions, the processing context,
//! and the small stateful helpers (ramps, edge detection, activity) that
//! several node kinds have in common.

pub mod activity;
pub mod context;
pub mod edge;
pub mod parameter;
pub mod port;
pub mod signal;
pub mod smoothing;

pub use activity::Activity;
pub use context::ProcessContext;
pub use edge::{RisingEdge, TriggerPulse};
pub use parameter::{ParamValue, ParameterDefinition, ParameterDisplay};
pub use port::{PortDefinition, PortDirection};
pub use signal::{InputBuffers, SignalBuffer, SignalType, MAX_INPUT_PORTS, MAX_OUTPUT_PORTS};
pub use smoothing::{BlockRamp, RampSegment, SmoothedValue};

/// Maximum number of parameters on a single node.
pub const MAX_PARAMETERS: usize = 8;
