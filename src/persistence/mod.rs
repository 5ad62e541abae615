//! Persistence module
//!
//! Patch records using serde and JSON.

pub mod patch;

pub use patch::{ConnectionRecord, JackRecord, NodeRecord, ParameterRecord, Patch, PATCH_VERSION};
