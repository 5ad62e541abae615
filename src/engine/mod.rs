//! Engine module
//!
//! The patch graph runtime: the shared edge and parameter tables, the
//! audio-thread evaluator, and the control-thread controller. Host audio
//! output through cpal is behind the `cpal-output` feature.

#[cfg(feature = "cpal-output")]
pub mod audio_engine;
pub mod audio_graph;
pub mod audio_processor;
pub mod buffer_pool;
pub mod channels;
pub mod commands;
pub mod controller;
pub mod parameter_bus;
pub mod patch_registry;
pub mod recursion_guard;

use std::sync::Arc;

use crate::config::EngineConfig;

#[cfg(feature = "cpal-output")]
pub use audio_engine::{AudioEngine, AudioError};
pub use audio_graph::AudioGraph;
pub use audio_processor::AudioProcessor;
pub use buffer_pool::BufferPool;
pub use channels::{AudioHandle, ControlHandle, EngineChannels};
pub use commands::{EngineCommand, EngineEvent, NodeId, PortIndex, RetiredNode};
pub use controller::EngineController;
pub use parameter_bus::ParameterBus;
pub use patch_registry::{InputJack, OutputJack, PatchRegistry};
pub use recursion_guard::RecursionGuard;

/// Builds both halves of an engine.
///
/// The controller stays on the control thread; the processor is moved into
/// the audio callback (or driven directly for offline rendering).
pub fn create(config: EngineConfig) -> (EngineController, AudioProcessor) {
    let config = config.sanitized();
    let registry = Arc::new(PatchRegistry::new(config.max_nodes));
    let parameters = Arc::new(ParameterBus::new(config.max_nodes));
    let (control, audio) = EngineChannels::new(config.command_capacity, config.event_capacity).split();

    let graph = AudioGraph::new(&config, Arc::clone(&registry), Arc::clone(&parameters));
    let processor = AudioProcessor::new(&config, graph, audio);
    let controller = EngineController::new(config, control, registry, parameters);
    (controller, processor)
}
