// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph.

use crate::identity::{IdentityError, CONNECTION_SEPARATOR};
use crate::port::{Port, PortKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node ID from any string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw ID
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that endpoint and connection ids built from this ID decode back to it.
    ///
    /// The ID must be non-empty, must not contain the connection separator and
    /// must not end with `_` (which would form a separator with the port suffix).
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.0.is_empty()
            || self.0.contains(CONNECTION_SEPARATOR)
            || self.0.ends_with('_')
        {
            return Err(IdentityError::InvalidNodeId(self.0.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A node instance, as supplied by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique instance ID
    pub id: NodeId,
    /// Node type name
    #[serde(rename = "type")]
    pub node_type: String,
    /// Fixed position on the canvas; `None` lets the layout planner place it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f32; 2]>,
    /// Whether the node starts collapsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_collapsed: Option<bool>,
    /// Input ports
    #[serde(default)]
    pub inputs: Vec<Port>,
    /// Output ports
    #[serde(default)]
    pub outputs: Vec<Port>,
    /// Opaque host data
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl Node {
    /// Create a node with no ports
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            position: None,
            is_collapsed: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: serde_json::Value::Null,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = Some([x, y]);
        self
    }

    /// Append an input port
    pub fn with_input(mut self, port: Port) -> Self {
        self.inputs.push(port);
        self
    }

    /// Append an output port
    pub fn with_output(mut self, port: Port) -> Self {
        self.outputs.push(port);
        self
    }

    /// Set the opaque properties
    pub fn with_properties(mut self, properties: serde_json::Value) -> Self {
        self.properties = properties;
        self
    }

    /// Get an input port by index
    pub fn input(&self, index: usize) -> Option<&Port> {
        self.inputs.get(index)
    }

    /// Get an output port by index
    pub fn output(&self, index: usize) -> Option<&Port> {
        self.outputs.get(index)
    }

    /// Ports on one side
    pub fn ports(&self, kind: PortKind) -> &[Port] {
        match kind {
            PortKind::Input => &self.inputs,
            PortKind::Output => &self.outputs,
        }
    }

    /// Mutable ports on one side
    pub fn ports_mut(&mut self, kind: PortKind) -> &mut Vec<Port> {
        match kind {
            PortKind::Input => &mut self.inputs,
            PortKind::Output => &mut self.outputs,
        }
    }

    /// Get a port by side and index
    pub fn port(&self, kind: PortKind, index: usize) -> Option<&Port> {
        self.ports(kind).get(index)
    }

    /// Get a mutable port by side and index
    pub fn port_mut(&mut self, kind: PortKind, index: usize) -> Option<&mut Port> {
        self.ports_mut(kind).get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_validation() {
        assert!(NodeId::from("math_ab12cd").validate().is_ok());
        assert!(NodeId::from("_leading").validate().is_ok());
        assert!(NodeId::from("").validate().is_err());
        assert!(NodeId::from("a__b").validate().is_err());
        assert!(NodeId::from("trailing_").validate().is_err());
    }

    #[test]
    fn test_node_serialization() {
        let node = Node::new("add_1", "add")
            .with_position(10.0, 20.0)
            .with_input(Port::single("a"))
            .with_output(Port::multi("sum"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "add");
        let loaded: Node = serde_json::from_value(json).unwrap();
        assert_eq!(loaded, node);
    }
}
