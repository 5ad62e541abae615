//! Engine Commands and Events
//!
//! Defines the messages that flow between the control thread and the audio thread.
//! All types here must be Send + 'static for safe cross-thread communication.
//!
//! Anything that owns heap memory travels in a `Box` or `Vec` built on the
//! control thread, and comes back the same way when the audio thread is done
//! with it, so the audio thread never allocates or frees.

use std::fmt;

use crate::dsp::SignalBuffer;
use crate::modules::SignalNode;

use super::buffer_pool::BufferPool;

/// Dense handle for a node, chosen by the device layer (`< max_nodes`).
pub type NodeId = u32;

/// Ordinal of a port within a node kind's input or output list.
pub type PortIndex = usize;

/// Commands sent from the control thread to the audio thread.
/// These are processed non-blocking at the start of every callback.
pub enum EngineCommand {
    /// Install a node built on the control thread.
    AddNode {
        id: NodeId,
        /// Slot generation claimed on the parameter bus for this node.
        generation: u32,
        node: Box<SignalNode>,
        /// One buffer per output port, sized for the current pool.
        outputs: Vec<SignalBuffer>,
    },

    /// Take a node out of the graph and send it back for dropping.
    RemoveNode { id: NodeId },

    /// Bypass a node: an inactive node outputs silence and pulls nothing.
    SetActive { id: NodeId, active: bool },

    /// Replace the buffer pool (used to grow the maximum block size).
    SwapPool(Box<BufferPool>),

    /// Remove every node.
    ClearGraph,
}

impl fmt::Debug for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::AddNode {
                id,
                generation,
                node,
                outputs,
            } => f
                .debug_struct("AddNode")
                .field("id", id)
                .field("generation", generation)
                .field("kind", &node.kind())
                .field("outputs", &outputs.len())
                .finish(),
            EngineCommand::RemoveNode { id } => f.debug_struct("RemoveNode").field("id", id).finish(),
            EngineCommand::SetActive { id, active } => f
                .debug_struct("SetActive")
                .field("id", id)
                .field("active", active)
                .finish(),
            EngineCommand::SwapPool(pool) => f
                .debug_tuple("SwapPool")
                .field(&pool.max_frames())
                .finish(),
            EngineCommand::ClearGraph => f.write_str("ClearGraph"),
        }
    }
}

/// A node the audio thread no longer uses, on its way back to be dropped.
pub struct RetiredNode {
    pub id: NodeId,
    pub node: Option<Box<SignalNode>>,
    pub outputs: Vec<SignalBuffer>,
}

/// Events sent from the audio thread to the control thread.
pub enum EngineEvent {
    /// A removed node (or a rejected add), for dropping off the audio thread.
    NodeRetired(RetiredNode),

    /// A replaced buffer pool, for dropping off the audio thread.
    PoolRetired(Box<BufferPool>),

    /// A node panicked during processing. Its outputs were silenced for that pass.
    NodeFault { node: NodeId },

    /// Output peak levels since the last report.
    OutputLevel {
        /// Left channel peak level (0.0-1.0+).
        left: f32,
        /// Right channel peak level (0.0-1.0+).
        right: f32,
    },

    /// Smoothed audio callback load, in percent of the real-time budget.
    CpuLoad(f32),
}

impl fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::NodeRetired(retired) => {
                f.debug_tuple("NodeRetired").field(&retired.id).finish()
            }
            EngineEvent::PoolRetired(pool) => f
                .debug_tuple("PoolRetired")
                .field(&pool.max_frames())
                .finish(),
            EngineEvent::NodeFault { node } => f.debug_struct("NodeFault").field("node", node).finish(),
            EngineEvent::OutputLevel { left, right } => f
                .debug_struct("OutputLevel")
                .field("left", left)
                .field("right", right)
                .finish(),
            EngineEvent::CpuLoad(load) => f.debug_tuple("CpuLoad").field(load).finish(),
        }
    }
}

impl EngineEvent {
    /// True for events that only carry memory to free.
    pub fn is_retirement(&self) -> bool {
        matches!(self, EngineEvent::NodeRetired(_) | EngineEvent::PoolRetired(_))
    }
}
