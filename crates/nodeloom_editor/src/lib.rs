// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interaction engine for `nodeloom`.
//!
//! Turns pointer, wheel and key input over a node graph into proposed
//! mutations, and applies them once the host agrees:
//! - Pan/zoom transformation between screen and canvas space
//! - Node, connection and pan gestures as one explicit state machine
//! - Single selection with delete-key removal
//! - Debounced anchor geometry reported by the host renderer
//! - The propose/confirm/apply change protocol
//!
//! ## Example
//!
//! ```
//! use nodeloom_editor::{EditorConfig, HookVerdict, NodeEditor, PendingMutation, Proposal};
//! use nodeloom_graph::{Endpoint, Node, Port};
//!
//! let nodes = vec![
//!     Node::new("a", "source").with_output(Port::single("out")),
//!     Node::new("b", "sink").with_input(Port::multi("in")),
//! ];
//! let config = EditorConfig::default()
//!     .with_change_hook(|pending: PendingMutation| HookVerdict::Apply(pending));
//! let mut editor = NodeEditor::new(nodes, config).unwrap();
//!
//! let proposal = editor.connect(&Endpoint::output("a", 0), &Endpoint::input("b", 0));
//! assert_eq!(proposal, Proposal::Applied);
//! assert_eq!(editor.edges().len(), 1);
//! ```

pub mod transform;
pub mod geometry;
pub mod protocol;
pub mod config;
pub mod selection;
pub mod state;
pub mod gesture;
pub mod editor;

pub use transform::{wheel_zoom_factor, Transformation, MAX_ZOOM, MIN_ZOOM};
pub use geometry::{EndpointOffsetCache, GEOMETRY_DEBOUNCE};
pub use protocol::{
    ApplyError, ChangeAction, ChangeHook, ConnectionEnds, HookVerdict, MutationId,
    PendingMutation, Proposal,
};
pub use config::{
    Candidate, ConfigError, ConnectionValidator, EditorConfig, EditorSettings, GridSettings,
    NodeResolver,
};
pub use selection::{Selection, SelectionState};
pub use state::GraphState;
pub use gesture::{DragState, GestureMachine, GestureOutcome, HitTarget};
pub use editor::{CreateNodeError, EditorKey, NodeEditor, WorkingConnection};
