//! Jack / patch registry.
//!
//! One atomic word per input jack names the output feeding it. The control
//! thread writes edges, the audio thread snapshots them once per pass, and
//! because an edge is a single word a reader sees either the old cable or
//! the new one, never half of each.
//!
//! Word layout: bit 63 marks a live edge, bits 8..40 hold the source node,
//! bits 0..8 the source output port. Zero means unpatched.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::dsp::{MAX_INPUT_PORTS, MAX_OUTPUT_PORTS};
use crate::error::{EngineError, Result};

use super::commands::{NodeId, PortIndex};

const LIVE: u64 = 1 << 63;
const PORT_MASK: u64 = 0xff;
const NODE_MASK: u64 = 0xffff_ffff;

/// An input port on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InputJack {
    pub node: NodeId,
    pub port: PortIndex,
}

/// An output port on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputJack {
    pub node: NodeId,
    pub port: PortIndex,
}

impl InputJack {
    pub fn new(node: NodeId, port: PortIndex) -> Self {
        Self { node, port }
    }
}

impl OutputJack {
    pub fn new(node: NodeId, port: PortIndex) -> Self {
        Self { node, port }
    }
}

/// Packs an edge into its word.
#[inline]
pub fn encode(source: OutputJack) -> u64 {
    LIVE | ((source.node as u64) & NODE_MASK) << 8 | (source.port as u64 & PORT_MASK)
}

/// Unpacks an edge word; `None` when unpatched.
#[inline]
pub fn decode(word: u64) -> Option<OutputJack> {
    if word & LIVE == 0 {
        return None;
    }
    Some(OutputJack {
        node: ((word >> 8) & NODE_MASK) as NodeId,
        port: (word & PORT_MASK) as PortIndex,
    })
}

/// Edge table shared between the control and audio threads.
pub struct PatchRegistry {
    edges: Box<[AtomicU64]>,
    max_nodes: usize,
}

impl PatchRegistry {
    pub fn new(max_nodes: usize) -> Self {
        let edges = (0..max_nodes * MAX_INPUT_PORTS)
            .map(|_| AtomicU64::new(0))
            .collect();
        Self { edges, max_nodes }
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// Number of edge words (one per possible input jack).
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    fn slot(&self, input: InputJack) -> Result<usize> {
        if input.node as usize >= self.max_nodes {
            return Err(EngineError::NodeOutOfRange {
                node: input.node,
                max_nodes: self.max_nodes,
            });
        }
        if input.port >= MAX_INPUT_PORTS {
            return Err(EngineError::UnknownInputPort {
                node: input.node,
                port: input.port.to_string(),
            });
        }
        Ok(input.node as usize * MAX_INPUT_PORTS + input.port)
    }

    /// Patches `source` into `input`, replacing whatever was there.
    ///
    /// Only ranges are checked: either end may name a node that does not
    /// exist yet. Returns the edge that was replaced.
    pub fn connect(&self, source: OutputJack, input: InputJack) -> Result<Option<OutputJack>> {
        let slot = self.slot(input)?;
        if source.node as usize >= self.max_nodes {
            return Err(EngineError::NodeOutOfRange {
                node: source.node,
                max_nodes: self.max_nodes,
            });
        }
        if source.port >= MAX_OUTPUT_PORTS {
            return Err(EngineError::UnknownOutputPort {
                node: source.node,
                port: source.port.to_string(),
            });
        }
        Ok(decode(self.edges[slot].swap(encode(source), Ordering::AcqRel)))
    }

    /// Unpatches `input`. Returns the edge that was removed.
    pub fn disconnect(&self, input: InputJack) -> Result<Option<OutputJack>> {
        let slot = self.slot(input)?;
        Ok(decode(self.edges[slot].swap(0, Ordering::AcqRel)))
    }

    /// The output currently feeding `input`, if any.
    pub fn resolve(&self, input: InputJack) -> Option<OutputJack> {
        let slot = self.slot(input).ok()?;
        decode(self.edges[slot].load(Ordering::Acquire))
    }

    /// Copies every edge word into `words` (which must be `len()` long).
    ///
    /// REAL-TIME SAFE: plain atomic loads.
    pub fn snapshot_into(&self, words: &mut [u64]) {
        for (word, edge) in words.iter_mut().zip(self.edges.iter()) {
            *word = edge.load(Ordering::Acquire);
        }
    }

    /// Removes every edge into or out of `node`. Returns how many went.
    pub fn clear_node(&self, node: NodeId) -> usize {
        let mut cleared = 0;
        for (slot, edge) in self.edges.iter().enumerate() {
            let word = edge.load(Ordering::Acquire);
            let Some(source) = decode(word) else {
                continue;
            };
            let target = (slot / MAX_INPUT_PORTS) as NodeId;
            if (source.node == node || target == node)
                && edge
                    .compare_exchange(word, 0, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                cleared += 1;
            }
        }
        cleared
    }

    /// Removes every edge.
    pub fn clear(&self) {
        for edge in self.edges.iter() {
            edge.store(0, Ordering::Release);
        }
    }

    /// Every live edge as `(source, input)`, ordered by input jack.
    pub fn connections(&self) -> Vec<(OutputJack, InputJack)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(slot, edge)| {
                decode(edge.load(Ordering::Acquire)).map(|source| {
                    let input = InputJack::new(
                        (slot / MAX_INPUT_PORTS) as NodeId,
                        slot % MAX_INPUT_PORTS,
                    );
                    (source, input)
                })
            })
            .collect()
    }
}
