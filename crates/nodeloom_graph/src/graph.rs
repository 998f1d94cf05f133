// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure holding the host's nodes.
//!
//! Connections are not a separate collection: they live inside port data and
//! are stored on both ends. Every mutation here keeps both ends in step.

use crate::connection::Connection;
use crate::identity::{ConnectionKey, Endpoint, IdentityError};
use crate::node::{Node, NodeId};
use crate::port::{Port, PortKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node graph, in host order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Node>", into = "Vec<Node>")]
pub struct Graph {
    nodes: IndexMap<NodeId, Node>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a host node list
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        graph.replace_nodes(nodes)?;
        Ok(graph)
    }

    /// Replace every node. On error the graph is left unchanged.
    pub fn replace_nodes(&mut self, nodes: Vec<Node>) -> Result<(), GraphError> {
        let mut replacement = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            node.id.validate()?;
            if replacement.contains_key(&node.id) {
                return Err(GraphError::DuplicateNode(node.id));
            }
            replacement.insert(node.id.clone(), node);
        }
        self.nodes = replacement;
        Ok(())
    }

    /// Load a host node list from RON
    pub fn from_ron(s: &str) -> Result<Self, GraphError> {
        let nodes: Vec<Node> = ron::from_str(s)?;
        Self::from_nodes(nodes)
    }

    /// Write the node list as RON
    pub fn to_ron(&self) -> Result<String, GraphError> {
        let nodes: Vec<&Node> = self.nodes.values().collect();
        Ok(ron::ser::to_string_pretty(&nodes, ron::ser::PrettyConfig::default())?)
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        node.id.validate()?;
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node after stripping every reference to it from its peers
    pub fn remove_node(&mut self, node_id: &NodeId) -> Option<Node> {
        if !self.nodes.contains_key(node_id) {
            return None;
        }
        for key in self.incident_connections(node_id) {
            self.remove_connection(&key);
        }
        // One-sided references left behind by stale host data
        for node in self.nodes.values_mut() {
            if &node.id == node_id {
                continue;
            }
            for port in node.inputs.iter_mut().chain(node.outputs.iter_mut()) {
                port.connection.remove_where(|c| &c.node_id == node_id);
            }
        }
        self.nodes.shift_remove(node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: &NodeId) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    /// Check whether a node exists
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve the port behind an endpoint
    pub fn port(&self, endpoint: &Endpoint) -> Option<&Port> {
        self.node(&endpoint.node_id)?.port(endpoint.kind, endpoint.port)
    }

    fn port_mut(&mut self, endpoint: &Endpoint) -> Option<&mut Port> {
        self.node_mut(&endpoint.node_id)?
            .port_mut(endpoint.kind, endpoint.port)
    }

    /// Every connection touching `node_id`, in either direction, without duplicates
    pub fn incident_connections(&self, node_id: &NodeId) -> Vec<ConnectionKey> {
        let Some(node) = self.node(node_id) else {
            return Vec::new();
        };

        let mut keys = Vec::new();
        for (index, port) in node.inputs.iter().enumerate() {
            for c in port.connections() {
                let key = ConnectionKey::new(
                    Endpoint::input(node_id.clone(), index),
                    Endpoint::output(c.node_id.clone(), c.port),
                );
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        for (index, port) in node.outputs.iter().enumerate() {
            for c in port.connections() {
                let key = ConnectionKey::new(
                    Endpoint::input(c.node_id.clone(), c.port),
                    Endpoint::output(node_id.clone(), index),
                );
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }

    /// Validate a candidate connection between two endpoints.
    ///
    /// Checks, in order: the endpoints are of opposite kinds, both ports exist,
    /// neither is a full single-valued port, and the pair is not already connected.
    /// Returns the key with the input endpoint first.
    pub fn check_connection(
        &self,
        a: &Endpoint,
        b: &Endpoint,
    ) -> Result<ConnectionKey, ConnectionError> {
        if a.kind == b.kind {
            return Err(ConnectionError::SameKind(a.kind));
        }
        let (input, output) = if a.kind == PortKind::Input { (a, b) } else { (b, a) };

        let input_port = self.resolve(input)?;
        let output_port = self.resolve(output)?;

        if input_port.references(&output.node_id, output.port) {
            return Err(ConnectionError::AlreadyConnected);
        }
        if input_port.connection.is_full() {
            return Err(ConnectionError::PortAlreadyConnected(input.clone()));
        }
        if output_port.connection.is_full() {
            return Err(ConnectionError::PortAlreadyConnected(output.clone()));
        }

        Ok(ConnectionKey::new(input.clone(), output.clone()))
    }

    fn resolve(&self, endpoint: &Endpoint) -> Result<&Port, ConnectionError> {
        let node = self
            .node(&endpoint.node_id)
            .ok_or_else(|| ConnectionError::NodeNotFound(endpoint.node_id.clone()))?;
        node.port(endpoint.kind, endpoint.port)
            .ok_or_else(|| ConnectionError::PortNotFound(endpoint.clone()))
    }

    /// Add a connection, storing it on both ports
    pub fn connect(
        &mut self,
        a: &Endpoint,
        b: &Endpoint,
    ) -> Result<ConnectionKey, ConnectionError> {
        let key = self.check_connection(a, b)?;
        let ConnectionKey { input, output } = &key;

        if let Some(port) = self.port_mut(input) {
            port.connection
                .insert(Connection::new(output.node_id.clone(), output.port));
        }
        if let Some(port) = self.port_mut(output) {
            port.connection
                .insert(Connection::new(input.node_id.clone(), input.port));
        }
        Ok(key)
    }

    /// Remove a connection from both ports.
    ///
    /// Returns `false` when neither side held the reference.
    pub fn remove_connection(&mut self, key: &ConnectionKey) -> bool {
        let ConnectionKey { input, output } = key;
        let mut removed = 0;
        if let Some(port) = self.port_mut(input) {
            removed += port
                .connection
                .remove_where(|c| c.points_to(&output.node_id, output.port));
        }
        if let Some(port) = self.port_mut(output) {
            removed += port
                .connection
                .remove_where(|c| c.points_to(&input.node_id, input.port));
        }
        removed > 0
    }

    /// Whether either side of the connection is stored.
    ///
    /// Unlike [`Graph::is_connected`] this also holds for stale references
    /// kept on one port only, which still render and can be removed.
    pub fn has_connection(&self, key: &ConnectionKey) -> bool {
        let input_side = self
            .port(&key.input)
            .is_some_and(|p| p.references(&key.output.node_id, key.output.port));
        let output_side = self
            .port(&key.output)
            .is_some_and(|p| p.references(&key.input.node_id, key.input.port));
        input_side || output_side
    }

    /// Whether both sides of the connection are stored
    pub fn is_connected(&self, key: &ConnectionKey) -> bool {
        let input_side = self
            .port(&key.input)
            .is_some_and(|p| p.references(&key.output.node_id, key.output.port));
        let output_side = self
            .port(&key.output)
            .is_some_and(|p| p.references(&key.input.node_id, key.input.port));
        input_side && output_side
    }
}

impl TryFrom<Vec<Node>> for Graph {
    type Error = GraphError;

    fn try_from(nodes: Vec<Node>) -> Result<Self, Self::Error> {
        Self::from_nodes(nodes)
    }
}

impl From<Graph> for Vec<Node> {
    fn from(graph: Graph) -> Self {
        graph.nodes.into_values().collect()
    }
}

/// Error when building or loading a graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node ID cannot be encoded
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Two nodes share an ID
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// RON parse error
    #[error("RON parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON write error
    #[error("RON write error: {0}")]
    Write(#[from] ron::Error),
}

/// Reason a connection was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Both endpoints are inputs, or both are outputs
    #[error("Cannot connect two {0} ports")]
    SameKind(PortKind),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Port not found
    #[error("Port not found: {0}")]
    PortNotFound(Endpoint),

    /// Single-valued port already holds its connection
    #[error("Port already connected: {0}")]
    PortAlreadyConnected(Endpoint),

    /// The same pair is already connected
    #[error("Ports are already connected")]
    AlreadyConnected,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes() -> Graph {
        Graph::from_nodes(vec![
            Node::new("a", "source").with_output(Port::single("out")),
            Node::new("b", "sink")
                .with_input(Port::multi("in"))
                .with_input(Port::single("gain")),
        ])
        .unwrap()
    }

    #[test]
    fn test_connect_is_mirrored() {
        let mut graph = two_nodes();
        let key = graph
            .connect(&Endpoint::output("a", 0), &Endpoint::input("b", 0))
            .unwrap();

        assert_eq!(key.input, Endpoint::input("b", 0));
        assert_eq!(key.output, Endpoint::output("a", 0));
        assert!(graph.is_connected(&key));
        let a_out = graph.port(&Endpoint::output("a", 0)).unwrap();
        assert!(a_out.references(&NodeId::from("b"), 0));
    }

    #[test]
    fn test_connect_refusals() {
        let mut graph = two_nodes();
        assert_eq!(
            graph.connect(&Endpoint::input("b", 0), &Endpoint::input("b", 1)),
            Err(ConnectionError::SameKind(PortKind::Input))
        );
        assert!(matches!(
            graph.connect(&Endpoint::output("a", 3), &Endpoint::input("b", 0)),
            Err(ConnectionError::PortNotFound(_))
        ));
        assert!(matches!(
            graph.connect(&Endpoint::output("zz", 0), &Endpoint::input("b", 0)),
            Err(ConnectionError::NodeNotFound(_))
        ));

        graph
            .connect(&Endpoint::output("a", 0), &Endpoint::input("b", 0))
            .unwrap();
        // a's single output is now full
        assert_eq!(
            graph.connect(&Endpoint::output("a", 0), &Endpoint::input("b", 1)),
            Err(ConnectionError::PortAlreadyConnected(Endpoint::output("a", 0)))
        );
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut graph = two_nodes();
        graph
            .connect(&Endpoint::output("a", 0), &Endpoint::input("b", 0))
            .unwrap();

        let incident = graph.incident_connections(&NodeId::from("a"));
        assert_eq!(incident.len(), 1);

        assert!(graph.remove_node(&NodeId::from("a")).is_some());
        assert!(!graph.contains(&NodeId::from("a")));
        let b_in = graph.port(&Endpoint::input("b", 0)).unwrap();
        assert!(b_in.connection.is_empty());
    }

    #[test]
    fn test_remove_node_strips_one_sided_references() {
        let mut graph = two_nodes();
        // Stale host data: only b remembers a
        graph
            .node_mut(&NodeId::from("b"))
            .unwrap()
            .inputs[0]
            .connection
            .insert(Connection::new("a", 0));

        graph.remove_node(&NodeId::from("a"));
        for node in graph.nodes() {
            for port in node.inputs.iter().chain(&node.outputs) {
                assert!(!port.references_node(&NodeId::from("a")));
            }
        }
    }

    #[test]
    fn test_self_loop_listed_once() {
        let mut graph = Graph::from_nodes(vec![Node::new("n", "loop")
            .with_input(Port::multi("in"))
            .with_output(Port::multi("out"))])
        .unwrap();
        graph
            .connect(&Endpoint::output("n", 0), &Endpoint::input("n", 0))
            .unwrap();
        assert_eq!(graph.incident_connections(&NodeId::from("n")).len(), 1);
    }

    #[test]
    fn test_replace_nodes_rejects_bad_ids() {
        let mut graph = two_nodes();
        let result = graph.replace_nodes(vec![Node::new("x", "t"), Node::new("x", "t")]);
        assert!(matches!(result, Err(GraphError::DuplicateNode(_))));
        assert_eq!(graph.node_count(), 2);

        let result = graph.add_node(Node::new("bad__id", "t"));
        assert!(matches!(result, Err(GraphError::Identity(_))));
    }

    #[test]
    fn test_ron_round_trip() {
        let mut graph = two_nodes();
        graph
            .connect(&Endpoint::output("a", 0), &Endpoint::input("b", 0))
            .unwrap();
        let ron = graph.to_ron().unwrap();
        let loaded = Graph::from_ron(&ron).unwrap();
        assert_eq!(loaded, graph);
    }

    #[test]
    fn test_deserialize_rejects_bad_and_duplicate_ids() {
        let json = serde_json::to_string(&two_nodes()).unwrap();
        assert!(serde_json::from_str::<Graph>(&json).is_ok());

        let bad = json.replace(r#""id":"a""#, r#""id":"bad__id""#);
        assert!(serde_json::from_str::<Graph>(&bad).is_err());

        let duplicate = json.replace(r#""id":"b""#, r#""id":"a""#);
        assert!(serde_json::from_str::<Graph>(&duplicate).is_err());
    }

    #[test]
    fn test_one_sided_reference_is_known_but_not_connected() {
        let mut graph = two_nodes();
        graph
            .node_mut(&NodeId::from("b"))
            .unwrap()
            .inputs[0]
            .connection
            .insert(Connection::new("a", 0));

        let key = ConnectionKey::new(Endpoint::input("b", 0), Endpoint::output("a", 0));
        assert!(graph.has_connection(&key));
        assert!(!graph.is_connected(&key));
        assert!(graph.remove_connection(&key));
        assert!(!graph.has_connection(&key));
    }
}
