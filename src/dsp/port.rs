//! Port (jack) definitions for graph nodes.
//!
//! Ports are the connection points on nodes where patch cables attach.
//! Definitions are `const` so each node kind can publish a static table.

use super::SignalType;

/// Direction of a port on a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// An input jack that receives a signal.
    Input,
    /// An output jack that sends a signal.
    Output,
}

/// Definition of a jack on a node.
///
/// `id` is the stable name used by persisted patches; the jack's position in
/// its node kind's input or output table is the ordinal used at run time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortDefinition {
    /// Unique identifier for this port within the node kind.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Whether this is an input or output port.
    pub direction: PortDirection,
    /// The type of signal this port accepts or produces.
    pub signal_type: SignalType,
    /// Value a node substitutes when the input is unpatched, for nodes that
    /// substitute at all. Ignored for outputs.
    pub default_value: f32,
}

impl PortDefinition {
    /// Creates a new input port definition.
    pub const fn input(id: &'static str, name: &'static str, signal_type: SignalType) -> Self {
        Self {
            id,
            name,
            direction: PortDirection::Input,
            signal_type,
            default_value: 0.0,
        }
    }

    /// Creates a new input port definition with a custom unpatched value.
    pub const fn input_with_default(
        id: &'static str,
        name: &'static str,
        signal_type: SignalType,
        default_value: f32,
    ) -> Self {
        Self {
            id,
            name,
            direction: PortDirection::Input,
            signal_type,
            default_value,
        }
    }

    /// Creates a new output port definition.
    pub const fn output(id: &'static str, name: &'static str, signal_type: SignalType) -> Self {
        Self {
            id,
            name,
            direction: PortDirection::Output,
            signal_type,
            default_value: 0.0,
        }
    }

    /// Returns true if this is an input port.
    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    /// Returns true if this is an output port.
    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }
}

/// Finds the ordinal of the port named `id` in a port table.
pub fn position_of(ports: &[PortDefinition], id: &str) -> Option<usize> {
    ports.iter().position(|p| p.id == id)
}
