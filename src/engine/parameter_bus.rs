//! Lock-free parameter bus.
//!
//! One atomic float per (node, parameter slot). The control thread publishes
//! clamped values, the audio thread copies a node's slots once per pass, so
//! every frame of that pass sees the same value. Nodes ramp from the
//! previous pass's value on their own.
//!
//! Each node slot also carries a generation, bumped whenever the control
//! thread claims or vacates the slot. The audio thread compares it with the
//! generation its installed node was built for, so a node the control
//! thread has already replaced or removed never runs on its successor's
//! parameters or cables.

use std::sync::atomic::{AtomicU32, Ordering};

use atomic_float::AtomicF32;

use crate::dsp::MAX_PARAMETERS;
use crate::modules::NodeKind;

use super::commands::NodeId;

pub struct ParameterBus {
    slots: Box<[AtomicF32]>,
    generations: Box<[AtomicU32]>,
    max_nodes: usize,
}

impl ParameterBus {
    pub fn new(max_nodes: usize) -> Self {
        let slots = (0..max_nodes * MAX_PARAMETERS)
            .map(|_| AtomicF32::new(0.0))
            .collect();
        let generations = (0..max_nodes).map(|_| AtomicU32::new(0)).collect();
        Self {
            slots,
            generations,
            max_nodes,
        }
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    #[inline]
    fn slot(&self, node: NodeId, index: usize) -> Option<&AtomicF32> {
        if node as usize >= self.max_nodes || index >= MAX_PARAMETERS {
            return None;
        }
        self.slots.get(node as usize * MAX_PARAMETERS + index)
    }

    /// Stores a value. Out-of-range addresses are ignored.
    pub fn publish(&self, node: NodeId, index: usize, value: f32) {
        if let Some(slot) = self.slot(node, index) {
            slot.store(value, Ordering::Release);
        }
    }

    /// Latest published value, zero for out-of-range addresses.
    pub fn load(&self, node: NodeId, index: usize) -> f32 {
        self.slot(node, index)
            .map(|slot| slot.load(Ordering::Acquire))
            .unwrap_or(0.0)
    }

    /// Copies every slot of `node` into `out`.
    ///
    /// REAL-TIME SAFE: plain atomic loads.
    pub fn snapshot(&self, node: NodeId, out: &mut [f32; MAX_PARAMETERS]) {
        for (index, value) in out.iter_mut().enumerate() {
            *value = self.load(node, index);
        }
    }

    /// Publishes the kind's defaults into every slot of `node`.
    pub fn reset_node(&self, node: NodeId, kind: NodeKind) {
        for (index, value) in kind.default_parameters().into_iter().enumerate() {
            self.publish(node, index, value);
        }
    }

    /// Starts a new generation of `node` holding a `kind`, with its
    /// defaults published. Returns the generation the node must be
    /// installed with; zero for an out-of-range node.
    ///
    /// The generation is stored before the values, so a reader that sees
    /// any of the new values also sees the new generation.
    pub fn claim(&self, node: NodeId, kind: NodeKind) -> u32 {
        let generation = self.vacate(node);
        self.reset_node(node, kind);
        generation
    }

    /// Ends the current generation of `node`. Returns the new one.
    pub fn vacate(&self, node: NodeId) -> u32 {
        self.generations
            .get(node as usize)
            .map(|generation| generation.fetch_add(1, Ordering::AcqRel).wrapping_add(1))
            .unwrap_or(0)
    }

    /// Current generation of `node`.
    ///
    /// Load it after [`ParameterBus::snapshot`]: a snapshot that picked up
    /// a later claim's values is then always caught.
    #[inline]
    pub fn generation(&self, node: NodeId) -> u32 {
        self.generations
            .get(node as usize)
            .map(|generation| generation.load(Ordering::Acquire))
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_publish_and_snapshot() {
        let bus = ParameterBus::new(4);
        bus.publish(2, 1, 0.75);

        let mut values = [0.0; MAX_PARAMETERS];
        bus.snapshot(2, &mut values);
        assert_eq!(values[1], 0.75);
        assert_eq!(values[0], 0.0);
        assert_eq!(bus.load(2, 1), 0.75);
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let bus = ParameterBus::new(2);
        bus.publish(5, 0, 1.0);
        bus.publish(0, MAX_PARAMETERS, 1.0);
        assert_eq!(bus.load(5, 0), 0.0);
        assert_eq!(bus.load(0, MAX_PARAMETERS), 0.0);
    }

    #[test]
    fn test_reset_node_publishes_defaults() {
        let bus = ParameterBus::new(2);
        bus.publish(1, 0, 42.0);
        bus.reset_node(1, NodeKind::Gain);
        assert_eq!(bus.load(1, 0), NodeKind::Gain.default_parameters()[0]);
    }

    #[test]
    fn test_claim_starts_a_generation() {
        let bus = ParameterBus::new(2);
        assert_eq!(bus.generation(1), 0);

        bus.publish(1, 0, 42.0);
        let first = bus.claim(1, NodeKind::Gain);
        assert_eq!(first, 1);
        assert_eq!(bus.generation(1), 1);
        assert_eq!(bus.load(1, 0), NodeKind::Gain.default_parameters()[0]);

        assert_eq!(bus.vacate(1), 2);
        assert_eq!(bus.claim(1, NodeKind::Dc), 3);
        assert_eq!(bus.generation(0), 0);
    }

    #[test]
    fn test_out_of_range_generation_is_zero() {
        let bus = ParameterBus::new(2);
        assert_eq!(bus.claim(7, NodeKind::Dc), 0);
        assert_eq!(bus.vacate(7), 0);
        assert_eq!(bus.generation(7), 0);
    }

    #[test]
    fn test_concurrent_publish_never_tears() {
        let bus = Arc::new(ParameterBus::new(1));
        let writer = {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                for i in 0..10_000 {
                    let v = if i % 2 == 0 { 0.25 } else { 0.5 };
                    bus.publish(0, 0, v);
                }
            })
        };

        for _ in 0..10_000 {
            let v = bus.load(0, 0);
            assert!(v == 0.0 || v == 0.25 || v == 0.5);
        }
        writer.join().unwrap();
    }
}
