//! Error types for control-thread operations.
//!
//! The audio thread never returns these; it degrades to silence instead.

use thiserror::Error;

use crate::engine::NodeId;

#[cfg(feature = "cpal-output")]
use crate::engine::audio_engine::AudioError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("node {node} is out of range (max_nodes is {max_nodes})")]
    NodeOutOfRange { node: NodeId, max_nodes: usize },

    #[error("node {0} already exists")]
    NodeExists(NodeId),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("node {node} has no input port '{port}'")]
    UnknownInputPort { node: NodeId, port: String },

    #[error("node {node} has no output port '{port}'")]
    UnknownOutputPort { node: NodeId, port: String },

    #[error("node {node} has no parameter '{parameter}'")]
    UnknownParameter { node: NodeId, parameter: String },

    #[error("command queue is full")]
    CommandQueueFull,

    #[error("incompatible patch version: found {found}, expected <= {expected}")]
    IncompatibleVersion { found: u32, expected: u32 },

    #[error("unknown node kind: {0}")]
    UnknownKind(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "cpal-output")]
    #[error(transparent)]
    Audio(#[from] AudioError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::NodeOutOfRange {
            node: 300,
            max_nodes: 256,
        };
        assert_eq!(err.to_string(), "node 300 is out of range (max_nodes is 256)");

        let err = EngineError::UnknownInputPort {
            node: 2,
            port: "cv".to_string(),
        };
        assert!(err.to_string().contains("'cv'"));
    }

    #[test]
    fn test_serde_error_converts() {
        let err: EngineError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, EngineError::Serialization(_)));
    }
}
