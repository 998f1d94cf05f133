// SPDX-License-Identifier: MIT OR Apache-2.0
//! Propose/confirm/apply handshake gating every structural change.
//!
//! The editor never mutates the graph directly in response to input. It builds
//! a [`ChangeAction`], wraps it in a [`PendingMutation`] and hands that to the
//! host's [`ChangeHook`]. The hook either applies it right away or keeps it and
//! commits it later with [`PendingMutation::commit`]. Dropping or cancelling a
//! pending mutation is a veto.
//!
//! Without a hook, or in demo mode, the editor applies the mutation itself.

use crate::editor::NodeEditor;
use crate::transform::Transformation;
use nodeloom_graph::{
    ConnectionError, ConnectionKey, GraphError, Node, NodeId, NodeLayoutState, PortRef,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one proposed mutation, for correlating deferred confirmations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationId(pub Uuid);

impl MutationId {
    /// Create a new random mutation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MutationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Both ends of a connection as reported to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionEnds {
    /// Input side
    pub input: PortRef,
    /// Output side
    pub output: PortRef,
}

/// Every structural change the editor can make
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeAction {
    /// A node was added
    NodeCreated {
        /// The new node, with its final ID and position
        node: Node,
    },
    /// A node and every connection touching it were removed
    NodeRemoved {
        /// Removed node
        id: NodeId,
        /// Connections removed along with it
        corresponding_connections: Vec<ConnectionEnds>,
    },
    /// A node was dragged to a new position
    NodeMoved {
        /// Moved node
        id: NodeId,
        /// Node data with the new position
        node: Node,
        /// Layout state after the move
        node_layout_state: NodeLayoutState,
    },
    /// A node was collapsed or expanded
    NodeCollapseChanged {
        /// Affected node
        id: NodeId,
        /// New collapse state
        should_be_collapsed: bool,
    },
    /// Two ports were connected
    ConnectionCreated {
        /// Input side
        input: PortRef,
        /// Output side
        output: PortRef,
    },
    /// A connection was removed
    ConnectionRemoved {
        /// Connection identity
        id: ConnectionKey,
        /// Input side
        input: PortRef,
        /// Output side
        output: PortRef,
    },
    /// The canvas was panned or zoomed
    TransformationChanged {
        /// New transformation, serialized as flat `dx`, `dy` and `zoom`
        #[serde(flatten)]
        transformation: Transformation,
    },
}

impl ChangeAction {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::NodeCreated { .. } => "NodeCreated",
            Self::NodeRemoved { .. } => "NodeRemoved",
            Self::NodeMoved { .. } => "NodeMoved",
            Self::NodeCollapseChanged { .. } => "NodeCollapseChanged",
            Self::ConnectionCreated { .. } => "ConnectionCreated",
            Self::ConnectionRemoved { .. } => "ConnectionRemoved",
            Self::TransformationChanged { .. } => "TransformationChanged",
        }
    }
}

/// A proposed change waiting for the host's decision
#[derive(Debug)]
#[must_use = "dropping a pending mutation discards the change"]
pub struct PendingMutation {
    id: MutationId,
    action: ChangeAction,
}

impl PendingMutation {
    pub(crate) fn new(action: ChangeAction) -> Self {
        Self {
            id: MutationId::new(),
            action,
        }
    }

    /// Mutation ID
    pub fn id(&self) -> MutationId {
        self.id
    }

    /// The proposed change
    pub fn action(&self) -> &ChangeAction {
        &self.action
    }

    /// Consume the pending mutation, keeping only its action
    pub fn into_action(self) -> ChangeAction {
        self.action
    }

    /// Apply the change to the editor it was proposed by
    pub fn commit(self, editor: &mut NodeEditor) -> Result<(), ApplyError> {
        editor.commit(self)
    }

    /// Veto the change
    pub fn cancel(self) {
        tracing::debug!("Mutation {} ({}) cancelled", self.id, self.action.name());
    }
}

/// What the host did with a proposed mutation
#[derive(Debug)]
pub enum HookVerdict {
    /// Apply now
    Apply(PendingMutation),
    /// The host kept the mutation (or dropped it); nothing happens now
    Deferred,
}

/// Host callback invoked with every proposed change
pub trait ChangeHook {
    /// Decide what happens to `pending`
    fn on_changed(&mut self, pending: PendingMutation) -> HookVerdict;
}

impl<F> ChangeHook for F
where
    F: FnMut(PendingMutation) -> HookVerdict,
{
    fn on_changed(&mut self, pending: PendingMutation) -> HookVerdict {
        self(pending)
    }
}

/// Result of proposing a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proposal {
    /// The change was invalid and nothing was proposed
    Refused,
    /// The change was applied synchronously
    Applied,
    /// The host holds the change
    Deferred(MutationId),
}

impl Proposal {
    /// Whether an action was emitted
    pub fn was_proposed(&self) -> bool {
        !matches!(self, Self::Refused)
    }
}

/// Error when applying a committed mutation
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// The node disappeared while the mutation was outstanding
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The connection disappeared while the mutation was outstanding
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionKey),

    /// The connection is no longer valid
    #[error("Connection refused: {0}")]
    Connection(#[from] ConnectionError),

    /// The node could not be inserted
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serializes_with_tag() {
        let action = ChangeAction::ConnectionCreated {
            input: PortRef::new("b", 0),
            output: PortRef::new("a", 0),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "connection_created");
        assert_eq!(json["input"]["node_id"], "b");
        assert_eq!(action.name(), "ConnectionCreated");
    }

    #[test]
    fn test_transformation_payload_is_flat() {
        let action = ChangeAction::TransformationChanged {
            transformation: Transformation::new(10.0, -4.0, 2.0),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "transformation_changed",
                "dx": 10.0,
                "dy": -4.0,
                "zoom": 2.0,
            })
        );
        let back: ChangeAction = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_closure_hook_defers() {
        let mut held = Vec::new();
        let mut hook = |pending: PendingMutation| {
            held.push(pending);
            HookVerdict::Deferred
        };
        let verdict = hook.on_changed(PendingMutation::new(ChangeAction::TransformationChanged {
            transformation: Transformation::IDENTITY,
        }));
        assert!(matches!(verdict, HookVerdict::Deferred));
        assert_eq!(held.len(), 1);
        assert_ne!(held[0].id(), MutationId::new());
    }
}
