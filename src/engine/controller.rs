//! Control-thread side of the engine.
//!
//! The EngineController is what the device layer talks to. Edges and
//! parameters go straight into their shared atomic tables; anything that
//! moves memory (adding, removing, bypassing nodes, swapping the pool) is
//! queued for the audio thread. Node state is built here so the audio
//! thread never allocates.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::dsp::ParamValue;
use crate::engine::buffer_pool::{node_outputs, BufferPool};
use crate::engine::channels::ControlHandle;
use crate::engine::commands::{EngineCommand, EngineEvent, NodeId};
use crate::engine::parameter_bus::ParameterBus;
use crate::engine::patch_registry::{InputJack, OutputJack, PatchRegistry};
use crate::error::{EngineError, Result};
use crate::modules::{NodeKind, SignalNode};
use crate::persistence::{ConnectionRecord, NodeRecord, ParameterRecord, Patch};

/// What the control thread remembers about an installed node.
#[derive(Clone, Copy, Debug)]
struct NodeEntry {
    kind: NodeKind,
    active: bool,
}

pub struct EngineController {
    queue: ControlHandle,
    registry: Arc<PatchRegistry>,
    parameters: Arc<ParameterBus>,
    config: EngineConfig,
    nodes: Vec<Option<NodeEntry>>,
}

impl EngineController {
    pub(crate) fn new(
        config: EngineConfig,
        queue: ControlHandle,
        registry: Arc<PatchRegistry>,
        parameters: Arc<ParameterBus>,
    ) -> Self {
        let nodes = vec![None; config.max_nodes];
        Self {
            queue,
            registry,
            parameters,
            config,
            nodes,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn check_range(&self, id: NodeId) -> Result<()> {
        if (id as usize) < self.nodes.len() {
            Ok(())
        } else {
            Err(EngineError::NodeOutOfRange {
                node: id,
                max_nodes: self.nodes.len(),
            })
        }
    }

    fn entry(&self, id: NodeId) -> Result<NodeEntry> {
        self.check_range(id)?;
        self.nodes[id as usize].ok_or(EngineError::UnknownNode(id))
    }

    fn send(&mut self, command: EngineCommand) -> Result<()> {
        self.queue
            .send_command(command)
            .map_err(|_| EngineError::CommandQueueFull)
    }

    fn ensure_queue_room(&self) -> Result<()> {
        if self.queue.is_command_buffer_full() {
            Err(EngineError::CommandQueueFull)
        } else {
            Ok(())
        }
    }

    /// Kind of an installed node.
    pub fn node_kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id as usize).copied().flatten().map(|e| e.kind)
    }

    pub fn is_active(&self, id: NodeId) -> bool {
        self.nodes.get(id as usize).copied().flatten().is_some_and(|e| e.active)
    }

    /// Ids of every installed node, ascending.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_some())
            .map(|(id, _)| id as NodeId)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|entry| entry.is_some()).count()
    }

    /// Creates a node of `kind` under handle `id`.
    ///
    /// Its parameters are reset to the kind's defaults. Edges already naming
    /// `id` take effect as soon as the audio thread installs it.
    pub fn add_node(&mut self, id: NodeId, kind: NodeKind) -> Result<()> {
        self.check_range(id)?;
        if self.nodes[id as usize].is_some() {
            return Err(EngineError::NodeExists(id));
        }

        let channels = self.config.channels;
        let node = Box::new(SignalNode::new(kind, self.config.sample_rate, channels));
        let outputs = node_outputs(kind, self.config.max_block_frames, channels);

        self.ensure_queue_room()?;
        let generation = self.parameters.claim(id, kind);
        self.send(EngineCommand::AddNode {
            id,
            generation,
            node,
            outputs,
        })?;
        self.nodes[id as usize] = Some(NodeEntry { kind, active: true });

        info!(node = id, kind = %kind, "node added");
        Ok(())
    }

    /// Removes a node and every edge into or out of it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        self.entry(id)?;
        self.ensure_queue_room()?;

        self.parameters.vacate(id);
        let cleared = self.registry.clear_node(id);
        self.send(EngineCommand::RemoveNode { id })?;
        self.nodes[id as usize] = None;

        info!(node = id, edges = cleared, "node removed");
        Ok(())
    }

    /// Bypasses (or restores) a node. A bypassed node outputs silence and
    /// pulls nothing upstream.
    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<()> {
        let entry = self.entry(id)?;
        if entry.active == active {
            return Ok(());
        }
        self.send(EngineCommand::SetActive { id, active })?;
        self.nodes[id as usize] = Some(NodeEntry { active, ..entry });

        debug!(node = id, active, "node activity changed");
        Ok(())
    }

    /// Patches `output` into `input`, replacing any existing cable there.
    ///
    /// Ports are checked against the node's kind when the node exists;
    /// either node may also be missing, in which case the cable waits
    /// silently. Returns the replaced edge.
    pub fn connect(&mut self, output: OutputJack, input: InputJack) -> Result<Option<OutputJack>> {
        self.check_range(output.node)?;
        self.check_range(input.node)?;

        if let Some(kind) = self.node_kind(input.node) {
            if input.port >= kind.inputs().len() {
                return Err(EngineError::UnknownInputPort {
                    node: input.node,
                    port: input.port.to_string(),
                });
            }
        }
        if let Some(kind) = self.node_kind(output.node) {
            if output.port >= kind.outputs().len() {
                return Err(EngineError::UnknownOutputPort {
                    node: output.node,
                    port: output.port.to_string(),
                });
            }
        }

        let previous = self.registry.connect(output, input)?;
        debug!(
            from = output.node,
            from_port = output.port,
            to = input.node,
            to_port = input.port,
            "connected"
        );
        Ok(previous)
    }

    /// Patches by port name. Both nodes must exist.
    pub fn connect_ports(
        &mut self,
        from: NodeId,
        output_port: &str,
        to: NodeId,
        input_port: &str,
    ) -> Result<Option<OutputJack>> {
        let from_kind = self.entry(from)?.kind;
        let to_kind = self.entry(to)?.kind;

        let output = from_kind
            .output_index(output_port)
            .ok_or_else(|| EngineError::UnknownOutputPort {
                node: from,
                port: output_port.to_string(),
            })?;
        let input = to_kind
            .input_index(input_port)
            .ok_or_else(|| EngineError::UnknownInputPort {
                node: to,
                port: input_port.to_string(),
            })?;

        self.connect(OutputJack::new(from, output), InputJack::new(to, input))
    }

    /// Unpatches `input`. Returns the removed edge.
    pub fn disconnect(&mut self, input: InputJack) -> Result<Option<OutputJack>> {
        let previous = self.registry.disconnect(input)?;
        if previous.is_some() {
            debug!(node = input.node, port = input.port, "disconnected");
        }
        Ok(previous)
    }

    /// The output currently feeding `input`.
    pub fn resolve(&self, input: InputJack) -> Option<OutputJack> {
        self.registry.resolve(input)
    }

    /// Every live edge as `(output, input)`.
    pub fn connections(&self) -> Vec<(OutputJack, InputJack)> {
        self.registry.connections()
    }

    fn parameter_slot(&self, id: NodeId, parameter: &str) -> Result<(NodeKind, usize)> {
        let kind = self.entry(id)?.kind;
        let index = kind
            .parameter_index(parameter)
            .ok_or_else(|| EngineError::UnknownParameter {
                node: id,
                parameter: parameter.to_string(),
            })?;
        Ok((kind, index))
    }

    /// Publishes a parameter value, clamped to the parameter's domain.
    /// Returns the value actually published.
    pub fn set_parameter(&mut self, id: NodeId, parameter: &str, value: impl Into<ParamValue>) -> Result<f32> {
        let (kind, index) = self.parameter_slot(id, parameter)?;
        let value = kind.parameters()[index].clamp(value.into().as_f32());
        self.parameters.publish(id, index, value);
        Ok(value)
    }

    /// Publishes a parameter from a 0..1 dial position.
    pub fn set_parameter_normalized(&mut self, id: NodeId, parameter: &str, normalized: f32) -> Result<f32> {
        let (kind, index) = self.parameter_slot(id, parameter)?;
        let def = &kind.parameters()[index];
        let normalized = if normalized.is_finite() { normalized } else { 0.0 };
        let value = def.clamp(def.denormalize(normalized));
        self.parameters.publish(id, index, value);
        Ok(value)
    }

    /// Latest published value of a parameter.
    pub fn parameter(&self, id: NodeId, parameter: &str) -> Result<f32> {
        let (_, index) = self.parameter_slot(id, parameter)?;
        Ok(self.parameters.load(id, index))
    }

    /// Grows (or shrinks) the largest sub-block the evaluator processes.
    ///
    /// A new pool with fresh output buffers for every node is built here
    /// and swapped in by the audio thread; the old one comes back retired.
    pub fn set_max_block_frames(&mut self, frames: usize) -> Result<()> {
        let frames = frames.max(1);
        let channels = self.config.channels;
        let mut pool = BufferPool::new(
            self.config.max_nodes,
            frames,
            channels,
            self.config.scratch_buffers,
        );
        for (id, entry) in self.nodes.iter().enumerate() {
            if let Some(entry) = entry {
                // Ids come from the same max_nodes, so installs cannot miss
                let _ = pool.install(id as NodeId, node_outputs(entry.kind, frames, channels));
            }
        }

        self.send(EngineCommand::SwapPool(Box::new(pool)))?;
        self.config.max_block_frames = frames;

        info!(frames, "buffer pool swapped");
        Ok(())
    }

    /// Removes every node and edge.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_queue_room()?;
        for (id, entry) in self.nodes.iter().enumerate() {
            if entry.is_some() {
                self.parameters.vacate(id as NodeId);
            }
        }
        self.registry.clear();
        self.send(EngineCommand::ClearGraph)?;
        self.nodes.iter_mut().for_each(|entry| *entry = None);
        info!("graph cleared");
        Ok(())
    }

    /// Drains events from the audio thread.
    ///
    /// Retired nodes and pools are dropped here, faults are logged, and
    /// everything else is handed back to the caller.
    pub fn poll_events(&mut self) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        for event in self.queue.drain_events() {
            match event {
                EngineEvent::NodeRetired(retired) => {
                    debug!(node = retired.id, "retired node dropped");
                }
                EngineEvent::PoolRetired(pool) => {
                    debug!(frames = pool.max_frames(), "retired pool dropped");
                }
                EngineEvent::NodeFault { node } => {
                    warn!(node, "node panicked; output silenced for the pass");
                    events.push(EngineEvent::NodeFault { node });
                }
                other => events.push(other),
            }
        }
        events
    }

    /// Captures the graph as a patch.
    ///
    /// Edges naming nodes that do not exist are left out.
    pub fn capture(&self, name: impl Into<String>) -> Patch {
        let mut patch = Patch::new(name);

        for id in self.node_ids() {
            let Some(kind) = self.node_kind(id) else {
                continue;
            };
            let mut record = NodeRecord::new(id, kind).with_active(self.is_active(id));
            record.parameters = kind
                .parameters()
                .iter()
                .enumerate()
                .map(|(index, def)| ParameterRecord {
                    id: def.id.to_string(),
                    value: self.parameters.load(id, index),
                })
                .collect();
            patch.nodes.push(record);
        }

        for (output, input) in self.registry.connections() {
            let (Some(from_kind), Some(to_kind)) = (self.node_kind(output.node), self.node_kind(input.node)) else {
                continue;
            };
            let (Some(out_port), Some(in_port)) =
                (from_kind.outputs().get(output.port), to_kind.inputs().get(input.port))
            else {
                continue;
            };
            patch
                .connections
                .push(ConnectionRecord::new(output.node, out_port.id, input.node, in_port.id));
        }

        patch
    }

    /// Replaces the graph with `patch`.
    ///
    /// Records may come in any order: names are resolved through the kinds
    /// the patch itself declares, so cables are laid before their nodes
    /// exist. Everything is validated before the current graph is touched.
    pub fn restore(&mut self, patch: &Patch) -> Result<()> {
        patch.check_version()?;

        let mut nodes = Vec::with_capacity(patch.nodes.len());
        for record in &patch.nodes {
            self.check_range(record.id)?;
            let kind = record.node_kind()?;
            if nodes.iter().any(|(id, _, _)| *id == record.id) {
                return Err(EngineError::NodeExists(record.id));
            }
            let mut values = Vec::with_capacity(record.parameters.len());
            for param in &record.parameters {
                let index = kind
                    .parameter_index(&param.id)
                    .ok_or_else(|| EngineError::UnknownParameter {
                        node: record.id,
                        parameter: param.id.clone(),
                    })?;
                values.push((index, kind.parameters()[index].clamp(param.value)));
            }
            nodes.push((record.id, kind, values));
        }

        let mut edges = Vec::with_capacity(patch.connections.len());
        for connection in &patch.connections {
            let (output, input) = (&connection.output, &connection.input);
            self.check_range(output.node)?;
            self.check_range(input.node)?;

            let from_kind = patch.kind_of(output.node)?.ok_or(EngineError::UnknownNode(output.node))?;
            let to_kind = patch.kind_of(input.node)?.ok_or(EngineError::UnknownNode(input.node))?;
            let out_port = from_kind
                .output_index(&output.port)
                .ok_or_else(|| EngineError::UnknownOutputPort {
                    node: output.node,
                    port: output.port.clone(),
                })?;
            let in_port = to_kind
                .input_index(&input.port)
                .ok_or_else(|| EngineError::UnknownInputPort {
                    node: input.node,
                    port: input.port.clone(),
                })?;
            edges.push((OutputJack::new(output.node, out_port), InputJack::new(input.node, in_port)));
        }

        // One ClearGraph, one AddNode per node and one SetActive per bypass
        let bypassed = patch.nodes.iter().filter(|record| !record.active).count();
        let needed = 1 + nodes.len() + bypassed;
        if self.queue.command_slots_available() < needed {
            return Err(EngineError::CommandQueueFull);
        }

        self.clear()?;

        for (output, input) in edges {
            self.registry.connect(output, input)?;
        }
        for (id, kind, values) in nodes {
            self.add_node(id, kind)?;
            for (index, value) in values {
                self.parameters.publish(id, index, value);
            }
        }
        for record in patch.nodes.iter().filter(|record| !record.active) {
            self.set_active(record.id, false)?;
        }

        info!(
            name = %patch.name,
            nodes = patch.nodes.len(),
            connections = patch.connections.len(),
            "patch restored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::create;

    fn controller() -> EngineController {
        let (controller, _processor) = create(EngineConfig::default().with_max_nodes(16));
        controller
    }

    #[test]
    fn test_add_node_checks() {
        let mut ctl = controller();
        ctl.add_node(3, NodeKind::Gain).unwrap();
        assert_eq!(ctl.node_kind(3), Some(NodeKind::Gain));
        assert!(ctl.is_active(3));

        assert!(matches!(ctl.add_node(3, NodeKind::Dc), Err(EngineError::NodeExists(3))));
        assert!(matches!(
            ctl.add_node(16, NodeKind::Dc),
            Err(EngineError::NodeOutOfRange { node: 16, max_nodes: 16 })
        ));
    }

    #[test]
    fn test_add_publishes_defaults() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Clock).unwrap();
        let bpm = NodeKind::Clock.parameters()[NodeKind::Clock.parameter_index("bpm").unwrap()].default;
        assert_eq!(ctl.parameter(0, "bpm").unwrap(), bpm);
    }

    #[test]
    fn test_connect_validates_known_kinds() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Dc).unwrap();
        ctl.add_node(1, NodeKind::Gain).unwrap();

        assert!(ctl.connect(OutputJack::new(0, 0), InputJack::new(1, 0)).unwrap().is_none());
        assert!(matches!(
            ctl.connect(OutputJack::new(0, 0), InputJack::new(1, 3)),
            Err(EngineError::UnknownInputPort { .. })
        ));
        assert!(matches!(
            ctl.connect(OutputJack::new(0, 2), InputJack::new(1, 0)),
            Err(EngineError::UnknownOutputPort { .. })
        ));

        // Missing nodes only get range checks
        assert!(ctl.connect(OutputJack::new(7, 3), InputJack::new(8, 2)).is_ok());
    }

    #[test]
    fn test_connect_ports_by_name() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Clock).unwrap();
        ctl.add_node(1, NodeKind::Divider).unwrap();
        ctl.connect_ports(0, "out", 1, "in").unwrap();
        assert_eq!(ctl.resolve(InputJack::new(1, 0)), Some(OutputJack::new(0, 0)));

        assert!(matches!(
            ctl.connect_ports(0, "nope", 1, "in"),
            Err(EngineError::UnknownOutputPort { .. })
        ));
        assert!(matches!(
            ctl.connect_ports(0, "out", 5, "in"),
            Err(EngineError::UnknownNode(5))
        ));
    }

    #[test]
    fn test_remove_node_sweeps_edges() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Dc).unwrap();
        ctl.add_node(1, NodeKind::Gain).unwrap();
        ctl.add_node(2, NodeKind::Speaker).unwrap();
        ctl.connect_ports(0, "out", 1, "in").unwrap();
        ctl.connect_ports(1, "out", 2, "in").unwrap();

        ctl.remove_node(1).unwrap();
        assert!(ctl.connections().is_empty());
        assert_eq!(ctl.node_kind(1), None);
        assert!(matches!(ctl.remove_node(1), Err(EngineError::UnknownNode(1))));
    }

    #[test]
    fn test_set_parameter_clamps() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Dc).unwrap();
        assert_eq!(ctl.set_parameter(0, "level", 5.0).unwrap(), 1.0);
        assert_eq!(ctl.set_parameter(0, "level", f32::NAN).unwrap(), 0.0);
        assert_eq!(ctl.parameter(0, "level").unwrap(), 0.0);
        assert!(matches!(
            ctl.set_parameter(0, "color", 1.0),
            Err(EngineError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_choice_and_toggle_values() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Oscillator).unwrap();
        ctl.add_node(1, NodeKind::Clock).unwrap();

        let waveform = NodeKind::Oscillator.parameter_index("waveform").unwrap();
        let last = NodeKind::Oscillator.parameters()[waveform].max;
        assert_eq!(ctl.set_parameter(0, "waveform", 99usize).unwrap(), last);
        assert_eq!(ctl.set_parameter(1, "run", false).unwrap(), 0.0);
        assert_eq!(ctl.set_parameter(1, "run", 0.7).unwrap(), 1.0);
    }

    #[test]
    fn test_set_parameter_normalized() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Dc).unwrap();
        assert_eq!(ctl.set_parameter_normalized(0, "level", 0.5).unwrap(), 0.0);
        assert_eq!(ctl.set_parameter_normalized(0, "level", 1.0).unwrap(), 1.0);
    }

    #[test]
    fn test_set_active_round_trip() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Gain).unwrap();
        ctl.set_active(0, false).unwrap();
        assert!(!ctl.is_active(0));
        ctl.set_active(0, true).unwrap();
        assert!(ctl.is_active(0));
    }

    #[test]
    fn test_queue_full_is_reported() {
        let (mut ctl, _processor) = create(
            EngineConfig::default()
                .with_max_nodes(8)
                .with_queue_capacity(2, 8),
        );
        ctl.add_node(0, NodeKind::Dc).unwrap();
        ctl.add_node(1, NodeKind::Dc).unwrap();
        assert!(matches!(ctl.add_node(2, NodeKind::Dc), Err(EngineError::CommandQueueFull)));
        assert_eq!(ctl.node_kind(2), None);
        assert!(matches!(ctl.remove_node(0), Err(EngineError::CommandQueueFull)));
        assert_eq!(ctl.node_kind(0), Some(NodeKind::Dc));
    }

    #[test]
    fn test_capture_names_ports() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Clock).unwrap();
        ctl.add_node(1, NodeKind::Speaker).unwrap();
        ctl.connect_ports(0, "reset", 1, "in").unwrap();
        ctl.connect(OutputJack::new(9, 0), InputJack::new(1, 0)).unwrap();
        ctl.connect(OutputJack::new(0, 0), InputJack::new(12, 0)).unwrap();
        ctl.set_active(1, false).unwrap();

        let patch = ctl.capture("captured");
        assert_eq!(patch.nodes.len(), 2);
        assert!(!patch.nodes[1].active);
        // Only the edge between existing nodes is kept; the 9 -> 1 cable
        // replaced the clock edge on the same jack.
        assert!(patch.connections.is_empty());

        ctl.connect_ports(0, "reset", 1, "in").unwrap();
        let patch = ctl.capture("captured");
        assert_eq!(patch.connections, vec![ConnectionRecord::new(0, "reset", 1, "in")]);
    }

    #[test]
    fn test_restore_validates_before_clearing() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Dc).unwrap();

        let mut patch = Patch::new("broken");
        patch.nodes.push(NodeRecord::new(1, NodeKind::Gain));
        patch.connections.push(ConnectionRecord::new(1, "out", 2, "in"));

        assert!(matches!(ctl.restore(&patch), Err(EngineError::UnknownNode(2))));
        assert_eq!(ctl.node_kind(0), Some(NodeKind::Dc));
    }

    #[test]
    fn test_restore_needs_room_for_the_whole_patch() {
        let (mut ctl, _processor) = create(
            EngineConfig::default()
                .with_max_nodes(8)
                .with_queue_capacity(4, 8),
        );
        ctl.add_node(0, NodeKind::Dc).unwrap();
        ctl.connect(OutputJack::new(0, 0), InputJack::new(1, 0)).unwrap();

        let mut patch = Patch::new("too big");
        for id in 0..3 {
            patch.nodes.push(NodeRecord::new(id, NodeKind::Gain));
        }
        patch.nodes[2].active = false;

        // One slot used by the add; the patch needs five
        assert!(matches!(ctl.restore(&patch), Err(EngineError::CommandQueueFull)));
        assert_eq!(ctl.node_count(), 1);
        assert_eq!(ctl.node_kind(0), Some(NodeKind::Dc));
        assert_eq!(ctl.connections().len(), 1);

        let mut small = Patch::new("fits");
        small.nodes.push(NodeRecord::new(0, NodeKind::Gain));
        ctl.restore(&small).unwrap();
        assert_eq!(ctl.node_kind(0), Some(NodeKind::Gain));
    }

    #[test]
    fn test_set_max_block_frames() {
        let mut ctl = controller();
        ctl.add_node(0, NodeKind::Dc).unwrap();
        ctl.set_max_block_frames(2048).unwrap();
        assert_eq!(ctl.config().max_block_frames, 2048);
    }
}
