// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connection (edge) references stored inside port data.

use crate::identity::Endpoint;
use crate::node::NodeId;
use crate::port::PortKind;
use serde::{Deserialize, Serialize};

/// A reference from one port to its peer port.
///
/// Connections are stored on both sides: if input 0 of `b` holds
/// `{node_id: a, port: 1}`, then output 1 of `a` holds `{node_id: b, port: 0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Peer node ID
    pub node_id: NodeId,
    /// Peer port index
    pub port: usize,
    /// Free-form annotations shown along the edge
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Style class applied to the rendered edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl Connection {
    /// Create a new reference to `(node_id, port)`
    pub fn new(node_id: impl Into<NodeId>, port: usize) -> Self {
        Self {
            node_id: node_id.into(),
            port,
            notes: Vec::new(),
            class_name: None,
        }
    }

    /// Attach an annotation
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Set the style class
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Check if this reference targets `(node_id, port)`
    pub fn points_to(&self, node_id: &NodeId, port: usize) -> bool {
        &self.node_id == node_id && self.port == port
    }
}

/// One side of a connection as reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    /// Node ID
    pub node_id: NodeId,
    /// Port index within the node's inputs or outputs
    pub port: usize,
    /// Port name, when the port could be resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PortRef {
    /// Create a reference without a name
    pub fn new(node_id: impl Into<NodeId>, port: usize) -> Self {
        Self {
            node_id: node_id.into(),
            port,
            name: None,
        }
    }

    /// Endpoint of this reference, given which side it is on
    pub fn endpoint(&self, kind: PortKind) -> Endpoint {
        Endpoint::new(self.node_id.clone(), self.port, kind)
    }
}

impl From<&Endpoint> for PortRef {
    fn from(endpoint: &Endpoint) -> Self {
        Self::new(endpoint.node_id.clone(), endpoint.port)
    }
}
