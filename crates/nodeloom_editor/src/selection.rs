// SPDX-License-Identifier: MIT OR Apache-2.0
//! Single active selection: one node or one connection.

use nodeloom_graph::{ConnectionKey, NodeId};

/// The selected element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// A node
    Node(NodeId),
    /// A connection
    Connection(ConnectionKey),
}

impl Selection {
    /// Whether removing `node_id` invalidates this selection
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        match self {
            Self::Node(id) => id == node_id,
            Self::Connection(key) => key.involves_node(node_id),
        }
    }
}

/// Holder of at most one [`Selection`]
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    current: Option<Selection>,
}

impl SelectionState {
    /// Nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Current selection
    pub fn current(&self) -> Option<&Selection> {
        self.current.as_ref()
    }

    /// Select a node, replacing any previous selection
    pub fn select_node(&mut self, node_id: NodeId) {
        self.current = Some(Selection::Node(node_id));
    }

    /// Select a connection, replacing any previous selection
    pub fn select_connection(&mut self, key: ConnectionKey) {
        self.current = Some(Selection::Connection(key));
    }

    /// Clear selection
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Check if a node is selected
    pub fn is_node_selected(&self, node_id: &NodeId) -> bool {
        matches!(&self.current, Some(Selection::Node(id)) if id == node_id)
    }

    /// Check if a connection is selected
    pub fn is_connection_selected(&self, key: &ConnectionKey) -> bool {
        matches!(&self.current, Some(Selection::Connection(k)) if k == key)
    }

    /// Drop the selection if it refers to a removed node
    pub fn forget_node(&mut self, node_id: &NodeId) {
        if self.current.as_ref().is_some_and(|s| s.involves_node(node_id)) {
            self.current = None;
        }
    }

    /// Drop the selection if it is the removed connection
    pub fn forget_connection(&mut self, key: &ConnectionKey) {
        if self.is_connection_selected(key) {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeloom_graph::Endpoint;

    #[test]
    fn test_selection_is_exclusive() {
        let mut selection = SelectionState::new();
        selection.select_node(NodeId::from("a"));
        assert!(selection.is_node_selected(&NodeId::from("a")));

        let key = ConnectionKey::new(Endpoint::input("b", 0), Endpoint::output("a", 0));
        selection.select_connection(key.clone());
        assert!(!selection.is_node_selected(&NodeId::from("a")));
        assert!(selection.is_connection_selected(&key));
    }

    #[test]
    fn test_removing_endpoint_node_clears_connection_selection() {
        let mut selection = SelectionState::new();
        let key = ConnectionKey::new(Endpoint::input("b", 0), Endpoint::output("a", 0));
        selection.select_connection(key);
        selection.forget_node(&NodeId::from("c"));
        assert!(selection.current().is_some());
        selection.forget_node(&NodeId::from("a"));
        assert!(selection.current().is_none());
    }
}
