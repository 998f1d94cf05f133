// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-node layout state and the initial placement of unpositioned nodes.

use crate::graph::Graph;
use crate::node::{Node, NodeId};
use crate::port::PortKind;
use egui::{Pos2, Rect, Vec2};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default node width
pub const NODE_WIDTH: f32 = 180.0;
/// Height of the draggable header strip
pub const NODE_HEADER_HEIGHT: f32 = 24.0;
/// Vertical spacing between consecutive port anchors
pub const PORT_SPACING: f32 = 22.0;
/// Padding below the last port
pub const NODE_PADDING: f32 = 8.0;
/// Gap kept between auto-placed nodes, and from the origin
pub const LAYOUT_MARGIN: f32 = 40.0;

/// Which side inputs are drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Inputs on the left (west), outputs on the right (east)
    #[default]
    #[serde(rename = "we")]
    WestEast,
    /// Inputs on the right, outputs on the left
    #[serde(rename = "ew")]
    EastWest,
}

impl Direction {
    /// Horizontal sign of the direction data flows in
    pub fn flow_sign(self) -> f32 {
        match self {
            Self::WestEast => 1.0,
            Self::EastWest => -1.0,
        }
    }

    /// Whether ports of `kind` sit on the node's left edge
    pub fn is_left(self, kind: PortKind) -> bool {
        matches!(
            (self, kind),
            (Self::WestEast, PortKind::Input) | (Self::EastWest, PortKind::Output)
        )
    }
}

/// Engine-owned layout of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeLayoutState {
    /// Top-left corner in canvas space
    pub pos: Pos2,
    /// Expanded size
    pub size: Vec2,
    /// Whether only the header is shown
    pub is_collapsed: bool,
}

impl NodeLayoutState {
    /// Rectangle currently occupied on the canvas
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.pos, self.visible_size())
    }

    /// Size taking collapse into account
    pub fn visible_size(&self) -> Vec2 {
        if self.is_collapsed {
            Vec2::new(self.size.x, NODE_HEADER_HEIGHT)
        } else {
            self.size
        }
    }

    /// Header strip in canvas space
    pub fn header_rect(&self) -> Rect {
        Rect::from_min_size(self.pos, Vec2::new(self.size.x, NODE_HEADER_HEIGHT))
    }

    /// Default anchor of a port, relative to the node origin.
    ///
    /// Anchors stack below the header at [`PORT_SPACING`]. A collapsed node
    /// gathers every anchor of a side at the header's vertical centre.
    pub fn default_anchor(&self, kind: PortKind, index: usize, direction: Direction) -> Vec2 {
        let x = if direction.is_left(kind) { 0.0 } else { self.size.x };
        let y = if self.is_collapsed {
            NODE_HEADER_HEIGHT / 2.0
        } else {
            NODE_HEADER_HEIGHT + PORT_SPACING * index as f32 + PORT_SPACING / 2.0
        };
        Vec2::new(x, y)
    }
}

/// Size a node gets before the host reports its rendered size
pub fn default_size(node: &Node) -> Vec2 {
    let rows = node.inputs.len().max(node.outputs.len());
    Vec2::new(
        NODE_WIDTH,
        NODE_HEADER_HEIGHT + rows as f32 * PORT_SPACING + NODE_PADDING,
    )
}

/// Collision-avoiding placement of nodes without a fixed position
#[derive(Debug, Clone, Default)]
pub struct LayoutPlanner {
    placed: Vec<Rect>,
}

impl LayoutPlanner {
    /// Create a planner with nothing placed
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rectangle the planner must avoid
    pub fn reserve(&mut self, rect: Rect) {
        self.placed.push(rect);
    }

    /// Place a node of `size`, starting at the base position and stepping right
    /// past every placed rectangle the candidate point falls inside.
    pub fn place(&mut self, size: Vec2) -> Pos2 {
        let mut pos = Pos2::new(LAYOUT_MARGIN, LAYOUT_MARGIN);
        for rect in &self.placed {
            if rect.contains(pos) {
                pos = Pos2::new(rect.max.x + LAYOUT_MARGIN, rect.min.y);
            }
        }
        self.placed.push(Rect::from_min_size(pos, size));
        pos
    }
}

/// Build layout state for every node of the graph, in host order.
///
/// Nodes with a fixed position keep it; the others are placed by a
/// [`LayoutPlanner`] that avoids everything placed before them.
pub fn initial_layout(graph: &Graph) -> IndexMap<NodeId, NodeLayoutState> {
    let mut planner = LayoutPlanner::new();
    let mut layout = IndexMap::with_capacity(graph.node_count());

    for node in graph.nodes() {
        let size = default_size(node);
        let pos = match node.position {
            Some([x, y]) => {
                let pos = Pos2::new(x, y);
                planner.reserve(Rect::from_min_size(pos, size));
                pos
            }
            None => planner.place(size),
        };
        layout.insert(
            node.id.clone(),
            NodeLayoutState {
                pos,
                size,
                is_collapsed: node.is_collapsed.unwrap_or(false),
            },
        );
    }
    layout
}
