// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rebuilds the renderable edge list from per-port connection data.

use crate::connection::Connection;
use crate::graph::Graph;
use crate::identity::{ConnectionKey, Endpoint};
use crate::node::NodeId;

/// One directed edge ready for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedEdge {
    /// Output side
    pub output: Endpoint,
    /// Input side
    pub input: Endpoint,
    /// Annotations from whichever side defines them first (input side wins)
    pub notes: Vec<String>,
    /// Style class from whichever side defines one first
    pub class_name: Option<String>,
}

impl DerivedEdge {
    /// Identity of this edge
    pub fn key(&self) -> ConnectionKey {
        ConnectionKey::new(self.input.clone(), self.output.clone())
    }
}

/// Walk every input port once and emit one edge per live reference.
///
/// References to nodes or ports that no longer exist are skipped, so a
/// partially stale graph still yields every edge it can resolve.
pub fn derive_edges(graph: &Graph) -> Vec<DerivedEdge> {
    let mut edges = Vec::new();

    for node in graph.nodes() {
        for (index, port) in node.inputs.iter().enumerate() {
            for reference in port.connections() {
                let Some(peer) = graph.node(&reference.node_id) else {
                    tracing::warn!(
                        "Skipping edge into {}:{} from missing node {}",
                        node.id,
                        index,
                        reference.node_id
                    );
                    continue;
                };
                let Some(peer_port) = peer.output(reference.port) else {
                    tracing::warn!(
                        "Skipping edge into {}:{} from missing output {} of {}",
                        node.id,
                        index,
                        reference.port,
                        peer.id
                    );
                    continue;
                };

                let mirror = mirrored(peer_port.connections(), &node.id, index);
                edges.push(DerivedEdge {
                    output: Endpoint::output(peer.id.clone(), reference.port),
                    input: Endpoint::input(node.id.clone(), index),
                    notes: first_notes(reference, mirror),
                    class_name: reference
                        .class_name
                        .clone()
                        .or_else(|| mirror.and_then(|m| m.class_name.clone())),
                });
            }
        }
    }
    edges
}

fn mirrored<'a>(
    mut references: impl Iterator<Item = &'a Connection>,
    node_id: &NodeId,
    port: usize,
) -> Option<&'a Connection> {
    references.find(|c| c.points_to(node_id, port))
}

fn first_notes(input_side: &Connection, output_side: Option<&Connection>) -> Vec<String> {
    if !input_side.notes.is_empty() {
        return input_side.notes.clone();
    }
    output_side.map(|c| c.notes.clone()).unwrap_or_default()
}
