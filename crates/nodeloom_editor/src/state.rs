// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine-owned state of one editor surface.

use crate::geometry::EndpointOffsetCache;
use crate::selection::SelectionState;
use crate::transform::Transformation;
use egui::{Pos2, Vec2};
use indexmap::IndexMap;
use nodeloom_graph::{
    initial_layout, Direction, Endpoint, Graph, LayoutPlanner, NodeId, NodeLayoutState,
};

/// Graph, layout, view and selection, owned together and borrowed exclusively
/// by whichever transition is running.
#[derive(Debug, Clone)]
pub struct GraphState {
    /// The host's nodes
    pub graph: Graph,
    /// Per-node layout, in host order
    pub layout: IndexMap<NodeId, NodeLayoutState>,
    /// Committed pan/zoom
    pub transformation: Transformation,
    /// Host-reported anchor offsets
    pub offsets: EndpointOffsetCache,
    /// Active selection
    pub selection: SelectionState,
}

impl GraphState {
    /// Build state for a graph, laying out unpositioned nodes
    pub fn new(graph: Graph, transformation: Transformation) -> Self {
        let layout = initial_layout(&graph);
        Self {
            graph,
            layout,
            transformation,
            offsets: EndpointOffsetCache::new(),
            selection: SelectionState::new(),
        }
    }

    /// Swap in a new node list and rebuild all layout state from it
    pub fn reinitialize(&mut self, graph: Graph) {
        self.layout = initial_layout(&graph);
        self.graph = graph;
        self.offsets.clear();
        self.selection.clear();
    }

    /// Position for a new node of `size` that avoids every existing node
    pub fn free_position(&self, size: Vec2) -> Pos2 {
        let mut planner = LayoutPlanner::new();
        for state in self.layout.values() {
            planner.reserve(state.rect());
        }
        planner.place(size)
    }

    /// Canvas position of an endpoint's anchor.
    ///
    /// Uses the host-reported offset when known, the default stacked anchor
    /// otherwise. Collapsed nodes always use the default.
    pub fn anchor(&self, endpoint: &Endpoint, direction: Direction) -> Option<Pos2> {
        let layout = self.layout.get(&endpoint.node_id)?;
        self.graph.port(endpoint)?;

        let offset = if layout.is_collapsed {
            layout.default_anchor(endpoint.kind, endpoint.port, direction)
        } else {
            self.offsets.get(endpoint).unwrap_or_else(|| {
                layout.default_anchor(endpoint.kind, endpoint.port, direction)
            })
        };
        Some(layout.pos + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeloom_graph::layout::{NODE_HEADER_HEIGHT, NODE_WIDTH, PORT_SPACING};
    use nodeloom_graph::{Node, Port};
    use std::time::Instant;

    fn state() -> GraphState {
        let graph = Graph::from_nodes(vec![Node::new("n", "t")
            .with_position(100.0, 50.0)
            .with_input(Port::single("in"))
            .with_output(Port::multi("out"))])
        .unwrap();
        GraphState::new(graph, Transformation::IDENTITY)
    }

    #[test]
    fn test_default_anchor() {
        let state = state();
        let anchor = state.anchor(&Endpoint::output("n", 0), Direction::WestEast).unwrap();
        assert_eq!(
            anchor,
            Pos2::new(100.0 + NODE_WIDTH, 50.0 + NODE_HEADER_HEIGHT + PORT_SPACING / 2.0)
        );
        assert!(state.anchor(&Endpoint::output("n", 1), Direction::WestEast).is_none());
    }

    #[test]
    fn test_reported_offset_wins_unless_collapsed() {
        let mut state = state();
        let endpoint = Endpoint::input("n", 0);
        let now = Instant::now();
        state.offsets.report(endpoint.clone(), Vec2::new(-4.0, 30.0), now);
        state.offsets.flush(now + crate::geometry::GEOMETRY_DEBOUNCE);
        assert_eq!(
            state.anchor(&endpoint, Direction::WestEast),
            Some(Pos2::new(96.0, 80.0))
        );

        state.layout[0].is_collapsed = true;
        assert_eq!(
            state.anchor(&endpoint, Direction::WestEast),
            Some(Pos2::new(100.0, 50.0 + NODE_HEADER_HEIGHT / 2.0))
        );
    }

    #[test]
    fn test_free_position_avoids_existing_nodes() {
        let state = state();
        let pos = state.free_position(Vec2::new(50.0, 50.0));
        let rect = egui::Rect::from_min_size(pos, Vec2::new(50.0, 50.0));
        assert!(!rect.intersects(state.layout[0].rect()));
    }
}
