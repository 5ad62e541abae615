//! Pull evaluator for the patch graph.
//!
//! The AudioGraph owns the node arena and the buffer pool on the audio
//! thread. There is no precomputed processing order: each pass starts at the
//! sinks and every node pulls its upstream sources before running, so the
//! order falls out of the edges as they are at the start of the pass.
//!
//! A node runs at most once per pass. Re-entering a node that is still on
//! the pull path (a cycle) reads as silence, as does a bypassed node, a
//! node that does not exist and an output port the node does not have. A
//! node that panics is silenced for the pass while the rest of the graph
//! carries on.
//!
//! Edges and parameters change on the control thread before the matching
//! arena command is drained. An installed node whose slot generation on the
//! parameter bus has moved on is stale: it is silent and pulls nothing.

use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::dsp::{InputBuffers, ProcessContext, SignalBuffer, MAX_INPUT_PORTS, MAX_PARAMETERS};
use crate::engine::buffer_pool::BufferPool;
use crate::engine::commands::{EngineCommand, EngineEvent, NodeId, RetiredNode};
use crate::engine::parameter_bus::ParameterBus;
use crate::engine::patch_registry::{decode, OutputJack, PatchRegistry};
use crate::engine::recursion_guard::RecursionGuard;
use crate::modules::{NodeKind, SignalNode};

/// Extra graveyard room for pool swaps and rejected adds.
const GRAVEYARD_SLACK: usize = 8;

/// Stored node data.
struct NodeSlot {
    node: Box<SignalNode>,
    kind: NodeKind,
    generation: u32,
    active: bool,
}

/// Runs `f`, reporting whether it finished without panicking.
fn isolate<F: FnOnce()>(f: F) -> bool {
    panic::catch_unwind(AssertUnwindSafe(f)).is_ok()
}

/// The audio-thread side of the graph.
pub struct AudioGraph {
    /// Node arena indexed by id.
    nodes: Vec<Option<NodeSlot>>,
    /// Installed sink ids, in installation order.
    sinks: Vec<NodeId>,
    registry: Arc<PatchRegistry>,
    parameters: Arc<ParameterBus>,
    pool: Box<BufferPool>,
    guard: RecursionGuard,
    /// Times each node ran during the last pass.
    fill_counts: Vec<u32>,
    /// Edge words copied at the start of the pass.
    edges: Vec<u64>,
    /// Nodes that panicked since the last drain.
    faults: Vec<NodeId>,
    /// Retired memory waiting for room in the event queue.
    retired: Vec<EngineEvent>,
}

impl AudioGraph {
    /// Creates an empty graph. Everything is sized here, on the calling thread.
    pub fn new(config: &EngineConfig, registry: Arc<PatchRegistry>, parameters: Arc<ParameterBus>) -> Self {
        let max_nodes = config.max_nodes;
        let pool = BufferPool::new(
            max_nodes,
            config.max_block_frames,
            config.channels,
            config.scratch_buffers,
        );
        let edge_words = registry.len();

        Self {
            nodes: (0..max_nodes).map(|_| None).collect(),
            sinks: Vec::with_capacity(max_nodes),
            registry,
            parameters,
            pool: Box::new(pool),
            guard: RecursionGuard::new(max_nodes),
            fill_counts: vec![0; max_nodes],
            edges: vec![0; edge_words],
            faults: Vec::with_capacity(max_nodes),
            retired: Vec::with_capacity(max_nodes + GRAVEYARD_SLACK),
        }
    }

    /// Largest number of frames one pass can produce.
    pub fn max_frames(&self) -> usize {
        self.pool.max_frames()
    }

    pub fn channels(&self) -> usize {
        self.pool.channels()
    }

    /// Number of installed nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id as usize), Some(Some(_)))
    }

    pub fn node_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id as usize)?.as_ref().map(|slot| slot.kind)
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id as usize), Some(Some(slot)) if slot.active)
    }

    pub fn sinks(&self) -> &[NodeId] {
        &self.sinks
    }

    /// Times `id` ran during the last pass (0 or 1).
    pub fn fill_count(&self, id: NodeId) -> u32 {
        self.fill_counts.get(id as usize).copied().unwrap_or(0)
    }

    /// A node's output buffer as left by the last pass.
    pub fn node_output(&self, id: NodeId, port: usize) -> Option<&SignalBuffer> {
        self.pool.output(id, port)
    }

    /// Applies one command from the control thread.
    ///
    /// REAL-TIME SAFE: memory only moves; anything let go is retired.
    pub fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::AddNode {
                id,
                generation,
                node,
                outputs,
            } => self.add_node(id, generation, node, outputs),
            EngineCommand::RemoveNode { id } => self.remove_node(id),
            EngineCommand::SetActive { id, active } => {
                if let Some(Some(slot)) = self.nodes.get_mut(id as usize) {
                    slot.active = active;
                }
            }
            EngineCommand::SwapPool(pool) => {
                let old = mem::replace(&mut self.pool, pool);
                self.retire(EngineEvent::PoolRetired(old));
            }
            EngineCommand::ClearGraph => {
                for id in 0..self.nodes.len() {
                    self.remove_node(id as NodeId);
                }
            }
        }
    }

    fn add_node(&mut self, id: NodeId, generation: u32, node: Box<SignalNode>, outputs: Vec<SignalBuffer>) {
        let index = id as usize;
        if index >= self.nodes.len() {
            self.retire(EngineEvent::NodeRetired(RetiredNode {
                id,
                node: Some(node),
                outputs,
            }));
            return;
        }

        let outputs = match self.pool.install(id, outputs) {
            Ok(previous) => previous,
            Err(outputs) => {
                self.retire(EngineEvent::NodeRetired(RetiredNode {
                    id,
                    node: Some(node),
                    outputs,
                }));
                return;
            }
        };

        let kind = node.kind();
        let previous = self.nodes[index].replace(NodeSlot {
            node,
            kind,
            generation,
            active: true,
        });

        self.sinks.retain(|&sink| sink != id);
        if kind.is_sink() {
            self.sinks.push(id);
        }

        if previous.is_some() || !outputs.is_empty() {
            self.retire(EngineEvent::NodeRetired(RetiredNode {
                id,
                node: previous.map(|slot| slot.node),
                outputs,
            }));
        }
    }

    fn remove_node(&mut self, id: NodeId) {
        let Some(slot) = self.nodes.get_mut(id as usize).and_then(Option::take) else {
            return;
        };
        let outputs = self.pool.uninstall(id);
        self.sinks.retain(|&sink| sink != id);
        if let Some(count) = self.fill_counts.get_mut(id as usize) {
            *count = 0;
        }
        self.retire(EngineEvent::NodeRetired(RetiredNode {
            id,
            node: Some(slot.node),
            outputs,
        }));
    }

    /// Holds memory for the control thread to drop.
    ///
    /// The graveyard only grows past its reserved size if the event queue
    /// stays full for a long stretch of removals.
    fn retire(&mut self, event: EngineEvent) {
        self.retired.push(event);
    }

    /// Next piece of retired memory waiting to go back.
    pub fn pop_retired(&mut self) -> Option<EngineEvent> {
        self.retired.pop()
    }

    /// Puts back a retirement the event queue had no room for.
    pub fn push_retired(&mut self, event: EngineEvent) {
        self.retire(event);
    }

    pub fn retired_pending(&self) -> usize {
        self.retired.len()
    }

    /// Next node that panicked since the last drain.
    pub fn pop_fault(&mut self) -> Option<NodeId> {
        self.faults.pop()
    }

    /// Runs one evaluation pass and returns the summed sink output.
    ///
    /// Returns `None` if no scratch buffer is free. The caller hands the
    /// buffer back with [`AudioGraph::release`].
    ///
    /// REAL-TIME SAFE: no allocation, no locks.
    pub fn produce_callback(&mut self, ctx: &ProcessContext) -> Option<SignalBuffer> {
        self.guard.rearm();
        self.fill_counts.fill(0);
        self.registry.snapshot_into(&mut self.edges);

        let mut mix = self.pool.acquire()?;
        let samples = ctx.samples().min(mix.len());

        for i in 0..self.sinks.len() {
            let sink = self.sinks[i];
            if self.pull(sink, ctx) != Pulled::Ready {
                continue;
            }
            if let Some(out) = self.pool.output(sink, 0) {
                for (m, s) in mix.samples[..samples].iter_mut().zip(&out.samples) {
                    *m += *s;
                }
            }
        }

        mix.dsp_time = ctx.dsp_time;
        Some(mix)
    }

    /// Returns a mix buffer to the scratch list.
    pub fn release(&mut self, buffer: SignalBuffer) {
        // Foreign buffers are just dropped.
        let _ = self.pool.release(buffer);
    }

    /// Evaluates `id` for this pass if it has not been already.
    fn pull(&mut self, id: NodeId, ctx: &ProcessContext) -> Pulled {
        let index = id as usize;
        if self.guard.is_done(id) {
            return if self.fill_count(id) > 0 {
                Pulled::Ready
            } else {
                Pulled::Silent
            };
        }
        let (active, generation) = match self.nodes.get(index) {
            Some(Some(slot)) => (slot.active, slot.generation),
            _ => return Pulled::Missing,
        };

        let mut params = [0.0; MAX_PARAMETERS];
        self.parameters.snapshot(id, &mut params);
        if self.parameters.generation(id) != generation {
            // Replaced or removed; its command has not been drained yet.
            return Pulled::Silent;
        }

        if !self.guard.enter_pre(id) {
            // Back-edge of a cycle.
            return Pulled::Silent;
        }

        let mut sources: [(Pulled, Option<OutputJack>); MAX_INPUT_PORTS] =
            [(Pulled::Missing, None); MAX_INPUT_PORTS];
        if active {
            for (port, source) in sources.iter_mut().enumerate() {
                if let Some(jack) = decode(self.edges[index * MAX_INPUT_PORTS + port]) {
                    *source = (self.pull(jack.node, ctx), Some(jack));
                }
            }
        }

        let samples = ctx.samples();
        let mut outputs = self.pool.take_outputs(id);
        for buffer in outputs.iter_mut() {
            buffer.clear();
        }

        let ready = active && outputs.iter().all(|buffer| buffer.len() >= samples);
        if ready {
            let Self {
                nodes,
                pool,
                faults,
                fill_counts,
                ..
            } = self;

            let mut inputs = InputBuffers::new(ctx.channels);
            for (port, (state, source)) in sources.iter().enumerate() {
                let Some(jack) = source else {
                    continue;
                };
                let upstream = match state {
                    Pulled::Ready => pool
                        .output(jack.node, jack.port)
                        .and_then(|buffer| buffer.samples.get(..samples)),
                    _ => None,
                };
                inputs.set(port, Some(upstream.unwrap_or_else(|| pool.silence(samples))));
            }

            if let Some(Some(slot)) = nodes.get_mut(index) {
                let node = &mut slot.node;
                let completed = isolate(|| node.process(&inputs, &mut outputs, &params, ctx));
                if !completed {
                    for buffer in outputs.iter_mut() {
                        buffer.clear();
                    }
                    if faults.len() < faults.capacity() {
                        faults.push(id);
                    }
                }
            }
            fill_counts[index] += 1;
        }

        for buffer in outputs.iter_mut() {
            buffer.tag(id, ctx.dsp_time);
        }
        self.pool.restore_outputs(id, outputs);

        self.guard.exit_post(id);
        self.guard.mark_done(id);
        if ready {
            Pulled::Ready
        } else {
            Pulled::Silent
        }
    }
}

/// What a downstream input sees after pulling its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pulled {
    /// The source ran this pass; read its output buffer.
    Ready,
    /// The source is bypassed, stale or closes a cycle.
    Silent,
    /// No such node.
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::buffer_pool::node_outputs;
    use crate::engine::patch_registry::InputJack;
    use crate::modules::Dc;
    use approx::assert_abs_diff_eq;

    const FRAMES: usize = 64;

    struct Fixture {
        graph: AudioGraph,
        registry: Arc<PatchRegistry>,
        parameters: Arc<ParameterBus>,
        config: EngineConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let config = EngineConfig::default()
                .with_max_nodes(16)
                .with_max_block_frames(FRAMES)
                .with_channels(2);
            let registry = Arc::new(PatchRegistry::new(config.max_nodes));
            let parameters = Arc::new(ParameterBus::new(config.max_nodes));
            let graph = AudioGraph::new(&config, Arc::clone(&registry), Arc::clone(&parameters));
            Self {
                graph,
                registry,
                parameters,
                config,
            }
        }

        fn add(&mut self, id: NodeId, kind: NodeKind) {
            let generation = self.parameters.claim(id, kind);
            self.install(id, generation, SignalNode::new(kind, self.config.sample_rate, self.config.channels));
        }

        /// Installs a dc whose `process` panics every pass.
        fn add_failing(&mut self, id: NodeId) {
            let generation = self.parameters.claim(id, NodeKind::Dc);
            let mut dc = Dc::new();
            dc.fail = true;
            self.install(id, generation, SignalNode::Dc(dc));
        }

        /// Drains an `AddNode` for a slot claimed earlier.
        fn install(&mut self, id: NodeId, generation: u32, node: SignalNode) {
            let kind = node.kind();
            self.graph.handle_command(EngineCommand::AddNode {
                id,
                generation,
                node: Box::new(node),
                outputs: node_outputs(kind, self.config.max_block_frames, self.config.channels),
            });
        }

        fn patch(&self, from: NodeId, to: NodeId, port: usize) {
            self.registry
                .connect(OutputJack::new(from, 0), InputJack::new(to, port))
                .unwrap();
        }

        fn run(&mut self) -> Vec<f32> {
            let ctx = ProcessContext::new(self.config.sample_rate, self.config.channels, FRAMES);
            let mix = self.graph.produce_callback(&ctx).unwrap();
            let samples = mix.samples[..ctx.samples()].to_vec();
            self.graph.release(mix);
            samples
        }
    }

    #[test]
    fn test_empty_graph_is_silent() {
        let mut fx = Fixture::new();
        let out = fx.run();
        assert_eq!(out.len(), FRAMES * 2);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_dc_reaches_speaker() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Speaker);
        fx.parameters.publish(0, 0, 0.5);
        fx.patch(0, 1, 0);

        let out = fx.run();
        assert_abs_diff_eq!(out[out.len() - 1], 0.5, epsilon = 1e-6);
        assert_eq!(fx.graph.fill_count(0), 1);
        assert_eq!(fx.graph.fill_count(1), 1);
    }

    #[test]
    fn test_shared_source_runs_once() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Speaker);
        fx.add(2, NodeKind::Speaker);
        fx.parameters.publish(0, 0, 0.25);
        fx.patch(0, 1, 0);
        fx.patch(0, 2, 0);

        let out = fx.run();
        assert_eq!(fx.graph.fill_count(0), 1);
        assert_abs_diff_eq!(out[out.len() - 1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_cycle_terminates_silent() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Gain);
        fx.add(1, NodeKind::Gain);
        fx.add(2, NodeKind::Speaker);
        fx.patch(0, 1, 0);
        fx.patch(1, 0, 0);
        fx.patch(1, 2, 0);

        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.fill_count(0), 1);
        assert_eq!(fx.graph.fill_count(1), 1);
    }

    #[test]
    fn test_self_loop_terminates() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Gain);
        fx.add(1, NodeKind::Speaker);
        fx.patch(0, 0, 0);
        fx.patch(0, 1, 0);

        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.fill_count(0), 1);
    }

    #[test]
    fn test_cycle_back_edge_reads_as_silence() {
        // dc -> vca.in, vca -> gain, gain -> vca.cv
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Vca);
        fx.add(2, NodeKind::Gain);
        fx.add(3, NodeKind::Speaker);
        fx.parameters.publish(0, 0, 0.5);
        fx.patch(0, 1, 0);
        fx.patch(1, 2, 0);
        fx.patch(2, 1, 1);
        fx.patch(2, 3, 0);

        // An unpatched cv would pass the dc through; the back-edge must not.
        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.fill_count(1), 1);
        assert_eq!(fx.graph.fill_count(2), 1);
    }

    #[test]
    fn test_missing_source_reads_silence() {
        // A dangling cable on vca.cv is zero, not the unpatched 1.0
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Vca);
        fx.add(2, NodeKind::Speaker);
        fx.parameters.publish(0, 0, 0.5);
        fx.patch(0, 1, 0);
        fx.patch(9, 1, 1);
        fx.patch(1, 2, 0);

        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.fill_count(1), 1);
        assert_eq!(fx.graph.fill_count(9), 0);
    }

    #[test]
    fn test_inactive_node_is_silent_and_pulls_nothing() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Gain);
        fx.add(2, NodeKind::Speaker);
        fx.parameters.publish(0, 0, 0.5);
        fx.patch(0, 1, 0);
        fx.patch(1, 2, 0);
        fx.graph.handle_command(EngineCommand::SetActive { id: 1, active: false });

        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.fill_count(0), 0);
        assert_eq!(fx.graph.fill_count(1), 0);
        assert!(!fx.graph.is_active(1));
    }

    #[test]
    fn test_replaced_node_is_silent_until_installed() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Speaker);
        fx.parameters.publish(0, 0, 0.5);
        fx.patch(0, 1, 0);
        assert!(fx.run().iter().all(|&s| s == 0.5));

        // Control thread swaps slot 0 for a gain; the dc is still installed
        let generation = fx.parameters.claim(0, NodeKind::Gain);
        fx.parameters.publish(0, 0, 1.5);
        fx.add(2, NodeKind::Dc);
        fx.parameters.publish(2, 0, 0.5);
        fx.patch(2, 0, 0);

        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.fill_count(0), 0);
        assert_eq!(fx.graph.fill_count(2), 0);

        let gain = SignalNode::new(NodeKind::Gain, fx.config.sample_rate, fx.config.channels);
        fx.install(0, generation, gain);
        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.75));
        assert_eq!(fx.graph.fill_count(0), 1);
        assert_eq!(fx.graph.fill_count(2), 1);
    }

    #[test]
    fn test_vacated_node_ignores_new_cables() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Gain);
        fx.add(1, NodeKind::Speaker);
        fx.add(2, NodeKind::Dc);
        fx.parameters.publish(2, 0, 0.5);
        fx.patch(0, 1, 0);

        // Removal queued, then a cable laid into the vacant slot
        fx.parameters.vacate(0);
        fx.patch(2, 0, 0);

        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.fill_count(0), 0);
        assert!(fx.graph.contains_node(0));
    }

    #[test]
    fn test_outputs_are_tagged() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Speaker);
        fx.patch(0, 1, 0);

        let ctx = ProcessContext::new(48000.0, 2, FRAMES).at_time(2.5);
        let mix = fx.graph.produce_callback(&ctx).unwrap();
        assert_eq!(mix.dsp_time, 2.5);
        fx.graph.release(mix);

        let out = fx.graph.node_output(0, 0).unwrap();
        assert_eq!(out.producer, Some(0));
        assert_eq!(out.dsp_time, 2.5);
    }

    #[test]
    fn test_remove_node_retires_memory() {
        let mut fx = Fixture::new();
        fx.add(3, NodeKind::Speaker);
        assert_eq!(fx.graph.sinks(), &[3]);

        fx.graph.handle_command(EngineCommand::RemoveNode { id: 3 });
        assert!(!fx.graph.contains_node(3));
        assert!(fx.graph.sinks().is_empty());
        assert!(matches!(
            fx.graph.pop_retired(),
            Some(EngineEvent::NodeRetired(RetiredNode { id: 3, node: Some(_), .. }))
        ));
        assert!(fx.graph.pop_retired().is_none());
    }

    #[test]
    fn test_out_of_range_add_is_retired() {
        let mut fx = Fixture::new();
        fx.add(99, NodeKind::Dc);
        assert_eq!(fx.graph.node_count(), 0);
        assert_eq!(fx.graph.retired_pending(), 1);
    }

    #[test]
    fn test_replacing_a_node_retires_the_old_one() {
        let mut fx = Fixture::new();
        fx.add(2, NodeKind::Speaker);
        fx.add(2, NodeKind::Dc);
        assert_eq!(fx.graph.node_kind(2), Some(NodeKind::Dc));
        assert!(fx.graph.sinks().is_empty());
        assert_eq!(fx.graph.retired_pending(), 1);
    }

    #[test]
    fn test_clear_graph() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Speaker);
        fx.graph.handle_command(EngineCommand::ClearGraph);
        assert_eq!(fx.graph.node_count(), 0);
        assert_eq!(fx.graph.retired_pending(), 2);
    }

    #[test]
    fn test_swap_pool_retires_old_pool() {
        let mut fx = Fixture::new();
        let pool = BufferPool::new(16, 128, 2, 2);
        fx.graph.handle_command(EngineCommand::SwapPool(Box::new(pool)));
        assert_eq!(fx.graph.max_frames(), 128);
        assert!(matches!(fx.graph.pop_retired(), Some(EngineEvent::PoolRetired(_))));
    }

    #[test]
    fn test_panicking_node_is_silenced_and_reported() {
        let mut fx = Fixture::new();
        fx.add(0, NodeKind::Dc);
        fx.add(1, NodeKind::Speaker);
        fx.add_failing(2);
        fx.add(3, NodeKind::Speaker);
        fx.parameters.publish(0, 0, 0.25);
        fx.parameters.publish(2, 0, 0.5);
        fx.patch(0, 1, 0);
        fx.patch(2, 3, 0);

        // Only the healthy chain reaches the mix
        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.25));
        assert_eq!(fx.graph.fill_count(0), 1);
        assert_eq!(fx.graph.fill_count(2), 1);
        assert_eq!(fx.graph.fill_count(3), 1);

        let failed = fx.graph.node_output(2, 0).unwrap();
        assert!(failed.samples.iter().all(|&s| s == 0.0));
        assert_eq!(fx.graph.pop_fault(), Some(2));
        assert_eq!(fx.graph.pop_fault(), None);

        // The node stays installed and faults again on the next pass
        let out = fx.run();
        assert!(out.iter().all(|&s| s == 0.25));
        assert!(fx.graph.contains_node(2));
        assert_eq!(fx.graph.pop_fault(), Some(2));
    }

    #[test]
    fn test_isolate_catches_panics() {
        assert!(isolate(|| {}));
        assert!(!isolate(|| panic!("node blew up")));
    }
}
