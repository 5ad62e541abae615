//! Patch records for save/load.
//!
//! A patch captures the complete state of the graph: every node with its
//! kind, bypass flag and parameter values, and every cable. Ports and
//! parameters are named by their string ids so a patch survives table
//! reordering. File I/O is left to the caller.

use serde::{Deserialize, Serialize};

use crate::engine::NodeId;
use crate::error::{EngineError, Result};
use crate::modules::NodeKind;

/// Current patch format version.
/// Increment this when making breaking changes to the format.
pub const PATCH_VERSION: u32 = 1;

/// A complete patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Human-readable name for the patch.
    pub name: String,
    /// Patch format version for future compatibility.
    pub version: u32,
    /// All nodes, in any order.
    pub nodes: Vec<NodeRecord>,
    /// All connections, in any order.
    pub connections: Vec<ConnectionRecord>,
}

impl Patch {
    /// Create a new empty patch with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: PATCH_VERSION,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Check if this patch version is compatible with the current format.
    pub fn is_compatible(&self) -> bool {
        self.version <= PATCH_VERSION
    }

    /// Rejects patches written by a newer format.
    pub fn check_version(&self) -> Result<()> {
        if self.is_compatible() {
            Ok(())
        } else {
            Err(EngineError::IncompatibleVersion {
                found: self.version,
                expected: PATCH_VERSION,
            })
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a patch and checks its version.
    pub fn from_json(json: &str) -> Result<Self> {
        let patch: Patch = serde_json::from_str(json)?;
        patch.check_version()?;
        Ok(patch)
    }

    /// The kind a record declares for `id`, if any.
    pub fn kind_of(&self, id: NodeId) -> Result<Option<NodeKind>> {
        self.nodes
            .iter()
            .find(|node| node.id == id)
            .map(NodeRecord::node_kind)
            .transpose()
    }
}

impl Default for Patch {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

fn default_active() -> bool {
    true
}

/// One node in a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    /// Kind id, e.g. "oscillator".
    pub kind: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Parameter values by parameter id. Missing parameters keep their default.
    #[serde(default)]
    pub parameters: Vec<ParameterRecord>,
}

impl NodeRecord {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind: kind.id().to_string(),
            active: true,
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, id: impl Into<String>, value: f32) -> Self {
        self.parameters.push(ParameterRecord {
            id: id.into(),
            value,
        });
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Resolves the kind id.
    pub fn node_kind(&self) -> Result<NodeKind> {
        NodeKind::from_id(&self.kind).ok_or_else(|| EngineError::UnknownKind(self.kind.clone()))
    }
}

/// A stored parameter value, in the parameter's own units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub id: String,
    pub value: f32,
}

/// One end of a cable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JackRecord {
    pub node: NodeId,
    /// Port id, e.g. "out" or "cv".
    pub port: String,
}

impl JackRecord {
    pub fn new(node: NodeId, port: impl Into<String>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

/// A cable from an output jack into an input jack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub input: JackRecord,
    pub output: JackRecord,
}

impl ConnectionRecord {
    pub fn new(
        from_node: NodeId,
        from_port: impl Into<String>,
        to_node: NodeId,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            input: JackRecord::new(to_node, to_port),
            output: JackRecord::new(from_node, from_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_creation() {
        let patch = Patch::new("Test Patch");
        assert_eq!(patch.name, "Test Patch");
        assert_eq!(patch.version, PATCH_VERSION);
        assert!(patch.nodes.is_empty());
        assert!(patch.connections.is_empty());
        assert_eq!(Patch::default().name, "Untitled");
    }

    #[test]
    fn test_patch_serialization() {
        let mut patch = Patch::new("Test");
        patch.nodes.push(
            NodeRecord::new(1, NodeKind::Oscillator)
                .with_parameter("frequency", 440.0)
                .with_active(false),
        );
        patch.connections.push(ConnectionRecord::new(1, "out", 2, "in"));

        let json = patch.to_json().unwrap();
        assert!(json.contains("\"oscillator\""));
        let loaded = Patch::from_json(&json).unwrap();
        assert_eq!(loaded, patch);
    }

    #[test]
    fn test_version_compatibility() {
        let patch = Patch::new("Test");
        assert!(patch.is_compatible());

        let mut future = Patch::new("Future");
        future.version = PATCH_VERSION + 1;
        assert!(!future.is_compatible());

        let json = serde_json::to_string(&future).unwrap();
        assert!(matches!(
            Patch::from_json(&json),
            Err(EngineError::IncompatibleVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let json = r#"{
            "name": "Sparse",
            "version": 1,
            "nodes": [{ "id": 4, "kind": "dc" }],
            "connections": []
        }"#;
        let patch = Patch::from_json(json).unwrap();
        assert!(patch.nodes[0].active);
        assert!(patch.nodes[0].parameters.is_empty());
    }

    #[test]
    fn test_kind_resolution() {
        let mut patch = Patch::new("Kinds");
        patch.nodes.push(NodeRecord::new(3, NodeKind::Speaker));
        patch.nodes.push(NodeRecord {
            id: 5,
            kind: "theremin".to_string(),
            active: true,
            parameters: Vec::new(),
        });

        assert_eq!(patch.kind_of(3).unwrap(), Some(NodeKind::Speaker));
        assert_eq!(patch.kind_of(4).unwrap(), None);
        assert!(matches!(patch.kind_of(5), Err(EngineError::UnknownKind(k)) if k == "theremin"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Patch::from_json("{ not json"),
            Err(EngineError::Serialization(_))
        ));
    }
}
