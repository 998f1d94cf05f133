// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pointer drag state machine.
//!
//! Every gesture starts from [`DragState::Idle`] on a pointer-down and ends
//! back in `Idle` on pointer-up or when the pointer leaves the surface. While
//! a gesture runs nothing structural changes: node drags and pans only keep a
//! transient offset. The finished gesture is returned as a [`GestureOutcome`]
//! for the editor to propose.

use crate::state::GraphState;
use crate::transform::Transformation;
use egui::{PointerButton, Pos2, Vec2};
use nodeloom_graph::{Endpoint, NodeId};

/// What the pointer is over, as resolved by hit testing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HitTarget {
    /// Empty canvas
    Background,
    /// The draggable header strip of a node
    NodeHeader(NodeId),
    /// The host-rendered body of a node
    NodeBody(NodeId),
    /// A port's anchor
    Port(Endpoint),
}

/// Current gesture
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No gesture
    #[default]
    Idle,
    /// Moving a node by its header
    DraggingNode {
        /// Node being moved
        node_id: NodeId,
        /// Canvas-space delta since the gesture started
        accumulated_delta: Vec2,
    },
    /// Drawing a connection out of a port
    DraggingConnection {
        /// Port the gesture started on
        origin: Endpoint,
        /// Free end of the preview, in canvas space
        free_point: Pos2,
    },
    /// Panning the canvas
    PanningCanvas {
        /// Transformation when the gesture started
        origin: Transformation,
        /// Transformation including the pan so far
        current: Transformation,
        /// Whether the gesture began on empty background
        from_background: bool,
    },
}

/// A finished gesture that should become a mutation
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Move a node by a canvas-space delta
    MoveNode {
        /// Node to move
        node_id: NodeId,
        /// Canvas-space delta
        delta: Vec2,
    },
    /// Connect two endpoints of opposite kinds
    Connect {
        /// Endpoint the gesture started on
        origin: Endpoint,
        /// Endpoint it was released over
        target: Endpoint,
    },
    /// Commit a new transformation
    Transform(Transformation),
}

/// Drag state plus the last pointer position
#[derive(Debug, Clone, Default)]
pub struct GestureMachine {
    state: DragState,
    last_pointer: Pos2,
}

impl GestureMachine {
    /// Idle machine
    pub fn new() -> Self {
        Self::default()
    }

    /// Current gesture
    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Whether a gesture is running
    pub fn is_active(&self) -> bool {
        self.state != DragState::Idle
    }

    /// Transient canvas offset applied to a node being dragged
    pub fn node_offset(&self, node_id: &NodeId) -> Vec2 {
        match &self.state {
            DragState::DraggingNode {
                node_id: dragged,
                accumulated_delta,
            } if dragged == node_id => *accumulated_delta,
            _ => Vec2::ZERO,
        }
    }

    /// Transformation to draw with, including an ongoing pan
    pub fn view_transformation(&self, committed: Transformation) -> Transformation {
        match &self.state {
            DragState::PanningCanvas { current, .. } => *current,
            _ => committed,
        }
    }

    /// Start a gesture. Ignored while another gesture runs.
    pub fn pointer_down(
        &mut self,
        button: PointerButton,
        screen_pos: Pos2,
        target: &HitTarget,
        graph: &mut GraphState,
    ) {
        if self.is_active() {
            tracing::trace!("Ignoring pointer-down during {:?}", self.state);
            return;
        }
        self.last_pointer = screen_pos;

        if button == PointerButton::Primary && *target == HitTarget::Background {
            graph.selection.clear();
        }

        self.state = match (button, target) {
            (PointerButton::Middle, _) => DragState::PanningCanvas {
                origin: graph.transformation,
                current: graph.transformation,
                from_background: *target == HitTarget::Background,
            },
            (PointerButton::Primary, HitTarget::Background) => DragState::PanningCanvas {
                origin: graph.transformation,
                current: graph.transformation,
                from_background: true,
            },
            (PointerButton::Primary, HitTarget::NodeHeader(node_id)) => {
                graph.selection.select_node(node_id.clone());
                DragState::DraggingNode {
                    node_id: node_id.clone(),
                    accumulated_delta: Vec2::ZERO,
                }
            }
            // Port anchors swallow the event so no pan starts underneath.
            (PointerButton::Primary, HitTarget::Port(endpoint)) => DragState::DraggingConnection {
                origin: endpoint.clone(),
                free_point: graph.transformation.screen_to_canvas(screen_pos),
            },
            _ => DragState::Idle,
        };
        tracing::trace!("Pointer down on {:?} -> {:?}", target, self.state);
    }

    /// Track the pointer
    pub fn pointer_move(&mut self, screen_pos: Pos2, graph: &mut GraphState) {
        let delta = screen_pos - self.last_pointer;
        self.last_pointer = screen_pos;

        match &mut self.state {
            DragState::Idle => {}
            DragState::DraggingNode {
                accumulated_delta, ..
            } => {
                *accumulated_delta += graph.transformation.delta_to_canvas(delta);
            }
            DragState::DraggingConnection { free_point, .. } => {
                *free_point = graph.transformation.screen_to_canvas(screen_pos);
            }
            DragState::PanningCanvas {
                current,
                from_background,
                ..
            } => {
                *current = current.panned(delta);
                if *from_background {
                    graph.selection.clear();
                }
            }
        }
    }

    /// Finish the gesture over `target`
    pub fn pointer_up(
        &mut self,
        screen_pos: Pos2,
        target: Option<&HitTarget>,
        graph: &mut GraphState,
    ) -> Option<GestureOutcome> {
        if self.is_active() {
            self.pointer_move(screen_pos, graph);
        }
        let finished = std::mem::take(&mut self.state);
        tracing::trace!("Pointer up on {:?} ending {:?}", target, finished);

        match finished {
            DragState::Idle => None,
            DragState::DraggingNode {
                node_id,
                accumulated_delta,
            } => (accumulated_delta != Vec2::ZERO).then_some(GestureOutcome::MoveNode {
                node_id,
                delta: accumulated_delta,
            }),
            DragState::DraggingConnection { origin, .. } => match target {
                Some(HitTarget::Port(endpoint)) if endpoint.kind != origin.kind => {
                    Some(GestureOutcome::Connect {
                        origin,
                        target: endpoint.clone(),
                    })
                }
                _ => None,
            },
            DragState::PanningCanvas {
                origin, current, ..
            } => (current != origin).then_some(GestureOutcome::Transform(current)),
        }
    }

    /// The pointer left the surface: finish as a release over nothing
    pub fn pointer_leave(&mut self, graph: &mut GraphState) -> Option<GestureOutcome> {
        let pos = self.last_pointer;
        self.pointer_up(pos, None, graph)
    }

    /// Abandon the gesture without any outcome
    pub fn cancel(&mut self) {
        if self.is_active() {
            tracing::trace!("Cancelled {:?}", self.state);
        }
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeloom_graph::{Graph, Node, Port};

    fn graph_state() -> GraphState {
        let graph = Graph::from_nodes(vec![
            Node::new("a", "t").with_output(Port::single("out")),
            Node::new("b", "t").with_input(Port::multi("in")),
        ])
        .unwrap();
        GraphState::new(graph, Transformation::new(0.0, 0.0, 2.0))
    }

    #[test]
    fn test_node_drag_accumulates_canvas_delta() {
        let mut graph = graph_state();
        let mut machine = GestureMachine::new();
        let a = NodeId::from("a");

        let header = HitTarget::NodeHeader(a.clone());
        machine.pointer_down(PointerButton::Primary, Pos2::new(10.0, 10.0), &header, &mut graph);
        assert!(graph.selection.is_node_selected(&a));
        machine.pointer_move(Pos2::new(30.0, 10.0), &mut graph);
        machine.pointer_move(Pos2::new(30.0, 50.0), &mut graph);
        assert_eq!(machine.node_offset(&a), Vec2::new(10.0, 20.0));
        assert_eq!(machine.node_offset(&NodeId::from("b")), Vec2::ZERO);

        let outcome = machine.pointer_up(Pos2::new(30.0, 50.0), None, &mut graph);
        assert_eq!(
            outcome,
            Some(GestureOutcome::MoveNode {
                node_id: a,
                delta: Vec2::new(10.0, 20.0)
            })
        );
        assert!(!machine.is_active());
    }

    #[test]
    fn test_click_without_motion_moves_nothing() {
        let mut graph = graph_state();
        let mut machine = GestureMachine::new();
        let target = HitTarget::NodeHeader(NodeId::from("a"));
        machine.pointer_down(PointerButton::Primary, Pos2::ZERO, &target, &mut graph);
        assert_eq!(machine.pointer_up(Pos2::ZERO, Some(&target), &mut graph), None);
    }

    #[test]
    fn test_connection_drag_from_input_side() {
        let mut graph = graph_state();
        let mut machine = GestureMachine::new();
        let origin = Endpoint::input("b", 0);

        let port = HitTarget::Port(origin.clone());
        machine.pointer_down(PointerButton::Primary, Pos2::new(4.0, 4.0), &port, &mut graph);
        machine.pointer_move(Pos2::new(40.0, 20.0), &mut graph);
        assert_eq!(
            machine.state(),
            &DragState::DraggingConnection {
                origin: origin.clone(),
                free_point: Pos2::new(20.0, 10.0)
            }
        );
        // No pan started underneath the port
        assert_eq!(machine.view_transformation(graph.transformation), graph.transformation);

        let target = HitTarget::Port(Endpoint::output("a", 0));
        let outcome = machine.pointer_up(Pos2::new(40.0, 20.0), Some(&target), &mut graph);
        assert_eq!(
            outcome,
            Some(GestureOutcome::Connect {
                origin,
                target: Endpoint::output("a", 0)
            })
        );
    }

    #[test]
    fn test_connection_drop_on_same_kind_or_nothing_cancels() {
        let mut graph = graph_state();
        let mut machine = GestureMachine::new();
        let origin = HitTarget::Port(Endpoint::output("a", 0));

        machine.pointer_down(PointerButton::Primary, Pos2::ZERO, &origin, &mut graph);
        assert_eq!(machine.pointer_up(Pos2::ZERO, Some(&origin), &mut graph), None);

        machine.pointer_down(PointerButton::Primary, Pos2::ZERO, &origin, &mut graph);
        assert_eq!(machine.pointer_up(Pos2::ZERO, Some(&HitTarget::Background), &mut graph), None);

        machine.pointer_down(PointerButton::Primary, Pos2::ZERO, &origin, &mut graph);
        assert_eq!(machine.pointer_leave(&mut graph), None);
        assert!(!machine.is_active());
    }

    #[test]
    fn test_background_pan_clears_selection_and_commits_on_change() {
        let mut graph = graph_state();
        let mut machine = GestureMachine::new();
        graph.selection.select_node(NodeId::from("a"));

        let background = HitTarget::Background;
        machine.pointer_down(PointerButton::Primary, Pos2::ZERO, &background, &mut graph);
        assert!(graph.selection.current().is_none());

        machine.pointer_move(Pos2::new(15.0, -5.0), &mut graph);
        let view = machine.view_transformation(graph.transformation);
        assert_eq!(view, Transformation::new(15.0, -5.0, 2.0));
        // Committed transformation is untouched until the host applies it
        assert_eq!(graph.transformation, Transformation::new(0.0, 0.0, 2.0));

        let outcome = machine.pointer_up(Pos2::new(15.0, -5.0), None, &mut graph);
        assert_eq!(outcome, Some(GestureOutcome::Transform(view)));
    }

    #[test]
    fn test_middle_button_pan_keeps_selection() {
        let mut graph = graph_state();
        let mut machine = GestureMachine::new();
        let a = NodeId::from("a");
        graph.selection.select_node(a.clone());

        let target = HitTarget::NodeBody(a.clone());
        machine.pointer_down(PointerButton::Middle, Pos2::ZERO, &target, &mut graph);
        machine.pointer_move(Pos2::new(1.0, 1.0), &mut graph);
        assert!(graph.selection.is_node_selected(&a));

        machine.pointer_move(Pos2::ZERO, &mut graph);
        assert_eq!(machine.pointer_up(Pos2::ZERO, None, &mut graph), None);
    }

    #[test]
    fn test_second_pointer_down_is_ignored() {
        let mut graph = graph_state();
        let mut machine = GestureMachine::new();
        let header = HitTarget::NodeHeader(NodeId::from("a"));
        machine.pointer_down(PointerButton::Primary, Pos2::ZERO, &header, &mut graph);
        machine.pointer_down(PointerButton::Middle, Pos2::ZERO, &HitTarget::Background, &mut graph);
        assert!(matches!(machine.state(), DragState::DraggingNode { .. }));
        machine.cancel();
        assert_eq!(machine.state(), &DragState::Idle);
    }
}
