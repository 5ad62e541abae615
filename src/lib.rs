//! Modular Graph Library
//!
//! Real-time signal graph core for a modular synthesizer: a closed set of
//! node kinds, a lock-free patch and parameter layer the control thread
//! writes, and a pull evaluator that renders every audio callback without
//! allocating.

pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod modules;
pub mod persistence;

pub use config::EngineConfig;
pub use engine::{create, AudioProcessor, EngineController, EngineEvent, InputJack, NodeId, OutputJack};
pub use error::{EngineError, Result};
pub use modules::{NodeKind, SignalNode};
pub use persistence::Patch;
