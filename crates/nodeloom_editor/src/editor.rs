// SPDX-License-Identifier: MIT OR Apache-2.0
//! The editor facade: pointer input in, proposed mutations out.
//!
//! A [`NodeEditor`] owns one surface's [`GraphState`] and gesture machine.
//! Hosts feed it pointer, wheel and key events, read back layout and edges for
//! rendering, and decide the fate of every change through the protocol in
//! [`crate::protocol`].

use crate::config::{Candidate, ConnectionValidator, EditorConfig, EditorSettings, NodeResolver};
use crate::gesture::{DragState, GestureMachine, GestureOutcome, HitTarget};
use crate::protocol::{
    ApplyError, ChangeAction, ChangeHook, ConnectionEnds, HookVerdict, PendingMutation, Proposal,
};
use crate::selection::Selection;
use crate::state::GraphState;
use crate::transform::{wheel_zoom_factor, Transformation};
use egui::{PointerButton, Pos2, Rect, Vec2};
use indexmap::IndexMap;
use nodeloom_graph::layout::default_size;
use nodeloom_graph::{
    derive_edges, ConnectionKey, ConnectionPath, DerivedEdge, Endpoint, Graph, GraphError, Node,
    NodeId, NodeLayoutState, PortKind, PortRef,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::time::Instant;

/// Length of the random suffix of generated node IDs
pub const ID_SUFFIX_LEN: usize = 6;
/// Pick radius around port anchors, in screen pixels
pub const PORT_HIT_RADIUS: f32 = 8.0;

const MAX_ID_ATTEMPTS: usize = 16;

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    /// Remove the selection
    Delete,
    /// Remove the selection
    Backspace,
    /// Abandon the current gesture
    Escape,
}

/// Preview of a connection being drawn
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingConnection {
    /// Port the gesture started on
    pub origin: Endpoint,
    /// Anchor of the origin port, in canvas space
    pub from: Pos2,
    /// Free pointer position, in canvas space
    pub to: Pos2,
    /// Path to draw
    pub path: ConnectionPath,
}

/// Error when creating a node programmatically
#[derive(Debug, thiserror::Error)]
pub enum CreateNodeError {
    /// Position is not inside the visible part of the canvas
    #[error("Position {0:?} is outside the visible editor bounds")]
    OutsideViewport(Pos2),

    /// No unused, encodable ID could be generated
    #[error("Could not generate a usable id for node type {0:?}")]
    NoUsableId(String),
}

/// Interactive node graph editor engine
pub struct NodeEditor {
    state: GraphState,
    gesture: GestureMachine,
    settings: EditorSettings,
    resolver: Option<NodeResolver>,
    validator: Option<ConnectionValidator>,
    change_hook: Option<Box<dyn ChangeHook>>,
    viewport: Option<Vec2>,
}

impl NodeEditor {
    /// Create an editor over the host's node list
    pub fn new(nodes: Vec<Node>, config: EditorConfig) -> Result<Self, GraphError> {
        let graph = Graph::from_nodes(nodes)?;
        let EditorConfig {
            settings,
            resolver,
            validator,
            change_hook,
        } = config;
        tracing::debug!("Editor created with {} nodes", graph.node_count());
        Ok(Self {
            state: GraphState::new(graph, settings.initial_transformation.clamped()),
            gesture: GestureMachine::new(),
            settings,
            resolver,
            validator,
            change_hook,
            viewport: None,
        })
    }

    /// Replace the node list. All layout state is rebuilt and any gesture is dropped.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> Result<(), GraphError> {
        let graph = Graph::from_nodes(nodes)?;
        self.gesture.cancel();
        self.state.reinitialize(graph);
        tracing::debug!("Editor reinitialized with {} nodes", self.state.graph.node_count());
        Ok(())
    }

    // === Read access ===

    /// The graph
    pub fn graph(&self) -> &Graph {
        &self.state.graph
    }

    /// Settings in effect
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// Engine state
    pub fn state(&self) -> &GraphState {
        &self.state
    }

    /// Current gesture
    pub fn drag_state(&self) -> &DragState {
        self.gesture.state()
    }

    /// Committed transformation
    pub fn transformation(&self) -> Transformation {
        self.state.transformation
    }

    /// Transformation to render with, including an ongoing pan
    pub fn view_transformation(&self) -> Transformation {
        self.gesture.view_transformation(self.state.transformation)
    }

    /// Active selection
    pub fn selection(&self) -> Option<&Selection> {
        self.state.selection.current()
    }

    /// Stored layout of a node
    pub fn layout(&self, node_id: &NodeId) -> Option<&NodeLayoutState> {
        self.state.layout.get(node_id)
    }

    /// Where to draw a node, including a transient drag offset
    pub fn node_position(&self, node_id: &NodeId) -> Option<Pos2> {
        let layout = self.state.layout.get(node_id)?;
        Some(layout.pos + self.gesture.node_offset(node_id))
    }

    /// Snapshot of every node's stored position
    pub fn positions(&self) -> IndexMap<NodeId, Pos2> {
        self.state
            .layout
            .iter()
            .map(|(id, layout)| (id.clone(), layout.pos))
            .collect()
    }

    /// Canvas position of an endpoint's anchor, following a dragged node
    pub fn anchor(&self, endpoint: &Endpoint) -> Option<Pos2> {
        let anchor = self.state.anchor(endpoint, self.settings.direction)?;
        Some(anchor + self.gesture.node_offset(&endpoint.node_id))
    }

    /// Renderable edges
    pub fn edges(&self) -> Vec<DerivedEdge> {
        derive_edges(&self.state.graph)
    }

    /// Renderable edges with their paths; edges whose anchors cannot be resolved are skipped
    pub fn edge_paths(&self) -> Vec<(DerivedEdge, ConnectionPath)> {
        self.edges()
            .into_iter()
            .filter_map(|edge| {
                let from = self.anchor(&edge.output)?;
                let to = self.anchor(&edge.input)?;
                let path = ConnectionPath::between(
                    from,
                    to,
                    self.settings.connection_type,
                    self.settings.connection_anchors_length,
                    self.settings.direction,
                );
                Some((edge, path))
            })
            .collect()
    }

    /// Preview segment of a connection being drawn
    pub fn working_connection(&self) -> Option<WorkingConnection> {
        let DragState::DraggingConnection { origin, free_point } = self.gesture.state() else {
            return None;
        };
        let from = self.anchor(origin)?;
        let path = ConnectionPath::working(
            from,
            origin.kind,
            *free_point,
            self.settings.connection_type,
            self.settings.connection_anchors_length,
            self.settings.direction,
        );
        Some(WorkingConnection {
            origin: origin.clone(),
            from,
            to: *free_point,
            path,
        })
    }

    /// Body content for a node, from the host resolver
    pub fn node_content(&self, node_id: &NodeId) -> Option<serde_json::Value> {
        let resolver = self.resolver.as_ref()?;
        self.state.graph.node(node_id).map(resolver)
    }

    /// Style class for a built-in name
    pub fn style_name(&self, key: &str) -> String {
        self.settings.style_name(key)
    }

    // === Surface geometry ===

    /// Report the size of the editor surface in screen pixels
    pub fn set_viewport_size(&mut self, size: Vec2) {
        self.viewport = Some(size);
    }

    /// Visible part of the canvas, if the surface size is known
    pub fn visible_rect(&self) -> Option<Rect> {
        let size = self.viewport?;
        let t = self.view_transformation();
        Some(Rect::from_min_max(
            t.screen_to_canvas(Pos2::ZERO),
            t.screen_to_canvas(size.to_pos2()),
        ))
    }

    /// Report the rendered size of a node. Default anchors follow the new size.
    pub fn set_node_size(&mut self, node_id: &NodeId, size: Vec2) {
        if let Some(layout) = self.state.layout.get_mut(node_id) {
            layout.size = size;
        }
    }

    /// Queue a host-measured anchor offset; see [`NodeEditor::flush_geometry`]
    pub fn report_endpoint_offset(&mut self, endpoint: Endpoint, offset: Vec2, now: Instant) {
        self.state.offsets.report(endpoint, offset, now);
    }

    /// Commit anchor offsets that have settled. Returns how many changed.
    pub fn flush_geometry(&mut self, now: Instant) -> usize {
        self.state.offsets.flush(now)
    }

    /// Resolve a screen position to what lies under it, topmost node first
    pub fn hit_test(&self, screen_pos: Pos2) -> HitTarget {
        let t = self.view_transformation();
        let pos = t.screen_to_canvas(screen_pos);
        let radius = PORT_HIT_RADIUS / t.zoom;

        for (node_id, layout) in self.state.layout.iter().rev() {
            let Some(node) = self.state.graph.node(node_id) else {
                continue;
            };
            for kind in [PortKind::Input, PortKind::Output] {
                for index in 0..node.ports(kind).len() {
                    let endpoint = Endpoint::new(node_id.clone(), index, kind);
                    if self
                        .anchor(&endpoint)
                        .is_some_and(|anchor| anchor.distance(pos) <= radius)
                    {
                        return HitTarget::Port(endpoint);
                    }
                }
            }

            let offset = self.gesture.node_offset(node_id);
            if layout.header_rect().translate(offset).contains(pos) {
                return HitTarget::NodeHeader(node_id.clone());
            }
            if layout.rect().translate(offset).contains(pos) {
                return HitTarget::NodeBody(node_id.clone());
            }
        }
        HitTarget::Background
    }

    // === Pointer and keyboard input ===

    /// Pointer pressed over `target`
    pub fn pointer_down(&mut self, button: PointerButton, screen_pos: Pos2, target: &HitTarget) {
        self.gesture
            .pointer_down(button, screen_pos, target, &mut self.state);
    }

    /// Pointer moved
    pub fn pointer_move(&mut self, screen_pos: Pos2) {
        self.gesture.pointer_move(screen_pos, &mut self.state);
    }

    /// Pointer released over `target`; proposes whatever the gesture produced
    pub fn pointer_up(&mut self, screen_pos: Pos2, target: Option<&HitTarget>) -> Option<Proposal> {
        let outcome = self.gesture.pointer_up(screen_pos, target, &mut self.state)?;
        Some(self.propose_outcome(outcome))
    }

    /// Pointer left the surface
    pub fn pointer_leave(&mut self) -> Option<Proposal> {
        let outcome = self.gesture.pointer_leave(&mut self.state)?;
        Some(self.propose_outcome(outcome))
    }

    /// Wheel turned at `screen_pos`; positive `delta_y` zooms out
    pub fn wheel(&mut self, screen_pos: Pos2, delta_y: f32) -> Option<Proposal> {
        if self.settings.disable_zoom || self.gesture.is_active() {
            return None;
        }
        let factor = wheel_zoom_factor(delta_y)?;
        let current = self.state.transformation;
        let zoomed = current.zoomed_at(screen_pos, factor);
        if zoomed == current {
            return None;
        }
        Some(self.set_transformation(zoomed))
    }

    /// Key pressed
    pub fn key_pressed(&mut self, key: EditorKey) -> Option<Proposal> {
        match key {
            EditorKey::Delete | EditorKey::Backspace => self.delete_selection(),
            EditorKey::Escape => {
                self.gesture.cancel();
                None
            }
        }
    }

    fn propose_outcome(&mut self, outcome: GestureOutcome) -> Proposal {
        match outcome {
            GestureOutcome::MoveNode { node_id, delta } => {
                match self.state.layout.get(&node_id) {
                    Some(layout) => {
                        let target = layout.pos + delta;
                        self.move_node(&node_id, target)
                    }
                    None => Proposal::Refused,
                }
            }
            GestureOutcome::Connect { origin, target } => {
                // Input first, output second, whichever side the drag started from
                let (input, output) = if origin.kind == PortKind::Input {
                    (origin, target)
                } else {
                    (target, origin)
                };
                self.connect(&input, &output)
            }
            GestureOutcome::Transform(transformation) => self.set_transformation(transformation),
        }
    }

    // === Selection ===

    /// Select a node
    pub fn select_node(&mut self, node_id: &NodeId) {
        if self.state.graph.contains(node_id) {
            self.state.selection.select_node(node_id.clone());
        }
    }

    /// Select a connection
    pub fn select_connection(&mut self, key: &ConnectionKey) {
        if self.state.graph.has_connection(key) {
            self.state.selection.select_connection(key.clone());
        }
    }

    /// Clear the selection
    pub fn clear_selection(&mut self) {
        self.state.selection.clear();
    }

    /// Propose removal of the selected node or connection
    pub fn delete_selection(&mut self) -> Option<Proposal> {
        let selection = self.state.selection.current()?.clone();
        Some(match selection {
            Selection::Node(node_id) => self.remove_node(&node_id),
            Selection::Connection(key) => self.remove_connection(&key),
        })
    }

    // === Operations ===

    /// Create a node from a prototype at a canvas position inside the visible area.
    ///
    /// The ID is the prototype's type name plus a random alphanumeric suffix.
    pub fn create_node(
        &mut self,
        display_name: &str,
        factory: impl FnOnce(&str) -> Node,
        pos: Pos2,
    ) -> Result<Proposal, CreateNodeError> {
        if self.visible_rect().is_some_and(|visible| !visible.contains(pos)) {
            return Err(CreateNodeError::OutsideViewport(pos));
        }

        let mut node = factory(display_name);
        if node.node_type.is_empty() {
            node.node_type = display_name.to_string();
        }
        node.id = self.generate_id(&node.node_type)?;
        node.position = Some([pos.x, pos.y]);

        Ok(self.propose(ChangeAction::NodeCreated { node }))
    }

    fn generate_id(&self, node_type: &str) -> Result<NodeId, CreateNodeError> {
        let mut rng = rand::thread_rng();
        for _ in 0..MAX_ID_ATTEMPTS {
            let suffix: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(ID_SUFFIX_LEN)
                .map(char::from)
                .collect();
            let id = NodeId::new(format!("{node_type}_{suffix}"));
            if id.validate().is_ok() && !self.state.graph.contains(&id) {
                return Ok(id);
            }
        }
        Err(CreateNodeError::NoUsableId(node_type.to_string()))
    }

    /// Propose removal of a node together with every connection touching it
    pub fn remove_node(&mut self, node_id: &NodeId) -> Proposal {
        if !self.state.graph.contains(node_id) {
            tracing::debug!("Refusing to remove unknown node {}", node_id);
            return Proposal::Refused;
        }
        let corresponding_connections = self
            .state
            .graph
            .incident_connections(node_id)
            .iter()
            .map(|key| self.connection_ends(key))
            .collect();
        self.propose(ChangeAction::NodeRemoved {
            id: node_id.clone(),
            corresponding_connections,
        })
    }

    /// Propose moving a node to a canvas position (snapped to the grid if configured)
    pub fn move_node(&mut self, node_id: &NodeId, pos: Pos2) -> Proposal {
        let (Some(layout), Some(node)) = (
            self.state.layout.get(node_id),
            self.state.graph.node(node_id),
        ) else {
            return Proposal::Refused;
        };
        let pos = self.settings.snap(pos);
        if pos == layout.pos {
            return Proposal::Refused;
        }

        let node_layout_state = NodeLayoutState { pos, ..*layout };
        let mut node = node.clone();
        node.position = Some([pos.x, pos.y]);
        self.propose(ChangeAction::NodeMoved {
            id: node_id.clone(),
            node,
            node_layout_state,
        })
    }

    /// Propose flipping a node between collapsed and expanded
    pub fn toggle_collapsed(&mut self, node_id: &NodeId) -> Proposal {
        let Some(layout) = self.state.layout.get(node_id) else {
            return Proposal::Refused;
        };
        let should_be_collapsed = !layout.is_collapsed;
        self.propose(ChangeAction::NodeCollapseChanged {
            id: node_id.clone(),
            should_be_collapsed,
        })
    }

    /// Propose a connection between two endpoints.
    ///
    /// Refused silently when both are the same kind, when a single-valued port
    /// is already connected, or when the host validator rejects the pair.
    pub fn connect(&mut self, a: &Endpoint, b: &Endpoint) -> Proposal {
        let key = match self.state.graph.check_connection(a, b) {
            Ok(key) => key,
            Err(err) => {
                tracing::debug!("Connection {} -> {} refused: {}", a, b, err);
                return Proposal::Refused;
            }
        };
        if !self.validator_accepts(&key) {
            tracing::debug!("Connection {} refused by validator", key);
            return Proposal::Refused;
        }
        let ConnectionEnds { input, output } = self.connection_ends(&key);
        self.propose(ChangeAction::ConnectionCreated { input, output })
    }

    fn validator_accepts(&self, key: &ConnectionKey) -> bool {
        let Some(validator) = &self.validator else {
            return true;
        };
        let graph = &self.state.graph;
        match (candidate(graph, &key.output), candidate(graph, &key.input)) {
            (Some(output), Some(input)) => validator(output, input),
            _ => false,
        }
    }

    /// Propose removal of a connection
    pub fn remove_connection(&mut self, key: &ConnectionKey) -> Proposal {
        if !self.state.graph.has_connection(key) {
            tracing::debug!("Refusing to remove unknown connection {}", key);
            return Proposal::Refused;
        }
        let ConnectionEnds { input, output } = self.connection_ends(key);
        self.propose(ChangeAction::ConnectionRemoved {
            id: key.clone(),
            input,
            output,
        })
    }

    /// Propose a new committed transformation. Zoom is clamped to the supported range.
    pub fn set_transformation(&mut self, transformation: Transformation) -> Proposal {
        self.propose(ChangeAction::TransformationChanged {
            transformation: transformation.clamped(),
        })
    }

    fn connection_ends(&self, key: &ConnectionKey) -> ConnectionEnds {
        ConnectionEnds {
            input: self.port_ref(&key.input),
            output: self.port_ref(&key.output),
        }
    }

    fn port_ref(&self, endpoint: &Endpoint) -> PortRef {
        PortRef {
            name: self.state.graph.port(endpoint).map(|p| p.name.clone()),
            ..PortRef::from(endpoint)
        }
    }

    // === Protocol ===

    // Demo mode skips the hook entirely and applies at once.
    fn propose(&mut self, action: ChangeAction) -> Proposal {
        let pending = PendingMutation::new(action);
        tracing::debug!("Proposing {} ({})", pending.action().name(), pending.id());

        let id = pending.id();
        let verdict = match self.change_hook.as_mut() {
            Some(hook) if !self.settings.demo_mode => hook.on_changed(pending),
            _ => HookVerdict::Apply(pending),
        };
        match verdict {
            HookVerdict::Apply(pending) => self.apply_now(pending),
            HookVerdict::Deferred => {
                tracing::trace!("Mutation {} deferred by host", id);
                Proposal::Deferred(id)
            }
        }
    }

    fn apply_now(&mut self, pending: PendingMutation) -> Proposal {
        let id = pending.id();
        match self.commit(pending) {
            Ok(()) => Proposal::Applied,
            Err(err) => {
                tracing::warn!("Mutation {} could not be applied: {}", id, err);
                Proposal::Refused
            }
        }
    }

    /// Apply a pending mutation. State may have changed since it was proposed,
    /// so targets are looked up again and connections re-validated.
    pub fn commit(&mut self, pending: PendingMutation) -> Result<(), ApplyError> {
        let id = pending.id();
        let action = pending.into_action();
        let name = action.name();
        self.apply(action)?;
        tracing::debug!("Applied {} ({})", name, id);
        Ok(())
    }

    fn apply(&mut self, action: ChangeAction) -> Result<(), ApplyError> {
        let state = &mut self.state;
        match action {
            ChangeAction::NodeCreated { node } => {
                let size = default_size(&node);
                let pos = match node.position {
                    Some([x, y]) => Pos2::new(x, y),
                    None => state.free_position(size),
                };
                let layout = NodeLayoutState {
                    pos,
                    size,
                    is_collapsed: node.is_collapsed.unwrap_or(false),
                };
                let node_id = node.id.clone();
                state.graph.add_node(node)?;
                state.layout.insert(node_id, layout);
            }
            ChangeAction::NodeRemoved { id, .. } => {
                // Cascades over the connections present now, not only those listed.
                if state.graph.remove_node(&id).is_none() {
                    return Err(ApplyError::NodeNotFound(id));
                }
                state.layout.shift_remove(&id);
                state.offsets.forget_node(&id);
                state.selection.forget_node(&id);
                let dragging_removed = match self.gesture.state() {
                    DragState::DraggingNode { node_id, .. } => node_id == &id,
                    DragState::DraggingConnection { origin, .. } => origin.node_id == id,
                    _ => false,
                };
                if dragging_removed {
                    self.gesture.cancel();
                }
            }
            ChangeAction::NodeMoved {
                id,
                node_layout_state,
                ..
            } => {
                let (Some(layout), Some(node)) =
                    (state.layout.get_mut(&id), state.graph.node_mut(&id))
                else {
                    return Err(ApplyError::NodeNotFound(id));
                };
                layout.pos = node_layout_state.pos;
                node.position = Some([layout.pos.x, layout.pos.y]);
            }
            ChangeAction::NodeCollapseChanged {
                id,
                should_be_collapsed,
            } => {
                let (Some(layout), Some(node)) =
                    (state.layout.get_mut(&id), state.graph.node_mut(&id))
                else {
                    return Err(ApplyError::NodeNotFound(id));
                };
                layout.is_collapsed = should_be_collapsed;
                node.is_collapsed = Some(should_be_collapsed);
            }
            ChangeAction::ConnectionCreated { input, output } => {
                state.graph.connect(
                    &input.endpoint(PortKind::Input),
                    &output.endpoint(PortKind::Output),
                )?;
            }
            ChangeAction::ConnectionRemoved { id, .. } => {
                if !state.graph.remove_connection(&id) {
                    return Err(ApplyError::ConnectionNotFound(id));
                }
                state.selection.forget_connection(&id);
            }
            ChangeAction::TransformationChanged { transformation } => {
                state.transformation = transformation.clamped();
            }
        }
        Ok(())
    }
}

fn candidate<'a>(graph: &'a Graph, endpoint: &'a Endpoint) -> Option<Candidate<'a>> {
    let node = graph.node(&endpoint.node_id)?;
    let port = node.port(endpoint.kind, endpoint.port)?;
    Some(Candidate {
        endpoint,
        node,
        port,
    })
}

impl std::fmt::Debug for NodeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeEditor")
            .field("state", &self.state)
            .field("gesture", &self.gesture)
            .field("settings", &self.settings)
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}
