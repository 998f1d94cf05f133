// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::connection::Connection;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of a node a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    /// Input port
    Input,
    /// Output port
    Output,
}

impl PortKind {
    /// Name used inside encoded endpoint ids
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }

    /// The kind a port of this kind connects to
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PortKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            _ => Err(()),
        }
    }
}

/// How many connections a port admits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arity {
    /// Exactly zero or one connection
    Single,
    /// Any number of connections
    Multi,
}

/// Connection storage of a port.
///
/// The variant is chosen when the port is built and never changes afterwards,
/// so a multi-valued port holds a sequence even when it has one entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortConnection {
    /// Single-valued port
    Single(Option<Connection>),
    /// Multi-valued port
    Multi(Vec<Connection>),
}

impl PortConnection {
    /// Empty storage for the given arity
    pub fn empty(arity: Arity) -> Self {
        match arity {
            Arity::Single => Self::Single(None),
            Arity::Multi => Self::Multi(Vec::new()),
        }
    }

    /// Declared arity
    pub fn arity(&self) -> Arity {
        match self {
            Self::Single(_) => Arity::Single,
            Self::Multi(_) => Arity::Multi,
        }
    }

    /// Iterate over stored references
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        let stored: &[Connection] = match self {
            Self::Single(c) => c.as_slice(),
            Self::Multi(list) => list,
        };
        stored.iter()
    }

    /// Number of stored references
    pub fn len(&self) -> usize {
        match self {
            Self::Single(c) => usize::from(c.is_some()),
            Self::Multi(list) => list.len(),
        }
    }

    /// Whether no reference is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A single-valued port that already holds its one connection
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Single(Some(_)))
    }

    /// Store a reference. Returns `false` when a single-valued port is full.
    pub fn insert(&mut self, connection: Connection) -> bool {
        match self {
            Self::Single(slot @ None) => {
                *slot = Some(connection);
                true
            }
            Self::Single(Some(_)) => false,
            Self::Multi(list) => {
                list.push(connection);
                true
            }
        }
    }

    /// Drop every reference matching the predicate, returning how many were removed
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Connection) -> bool) -> usize {
        match self {
            Self::Single(slot) => {
                if slot.as_ref().is_some_and(&mut predicate) {
                    *slot = None;
                    1
                } else {
                    0
                }
            }
            Self::Multi(list) => {
                let before = list.len();
                list.retain(|c| !predicate(c));
                before - list.len()
            }
        }
    }
}

/// A port on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port name
    pub name: String,
    /// Descriptive type tags
    #[serde(default)]
    pub types: Vec<String>,
    /// Stored peer references
    pub connection: PortConnection,
}

impl Port {
    /// Create a new port with empty storage of the given arity
    pub fn new(name: impl Into<String>, arity: Arity) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            connection: PortConnection::empty(arity),
        }
    }

    /// Create a single-valued port
    pub fn single(name: impl Into<String>) -> Self {
        Self::new(name, Arity::Single)
    }

    /// Create a multi-valued port
    pub fn multi(name: impl Into<String>) -> Self {
        Self::new(name, Arity::Multi)
    }

    /// Add a type tag
    pub fn with_type(mut self, tag: impl Into<String>) -> Self {
        self.types.push(tag.into());
        self
    }

    /// Declared arity
    pub fn arity(&self) -> Arity {
        self.connection.arity()
    }

    /// Iterate over stored references
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connection.iter()
    }

    /// Whether this port stores a reference to `(node_id, port)`
    pub fn references(&self, node_id: &NodeId, port: usize) -> bool {
        self.connections().any(|c| c.points_to(node_id, port))
    }

    /// Whether this port stores any reference into `node_id`
    pub fn references_node(&self, node_id: &NodeId) -> bool {
        self.connections().any(|c| &c.node_id == node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_port_admits_one() {
        let mut port = Port::single("in");
        assert!(port.connection.insert(Connection::new("a", 0)));
        assert!(port.connection.is_full());
        assert!(!port.connection.insert(Connection::new("b", 0)));
        assert_eq!(port.connection.len(), 1);
    }

    #[test]
    fn test_multi_port_stays_a_sequence() {
        let mut port = Port::multi("in");
        assert!(port.connection.insert(Connection::new("a", 0)));
        assert!(matches!(&port.connection, PortConnection::Multi(list) if list.len() == 1));
        assert!(port.connection.insert(Connection::new("b", 2)));
        assert!(!port.connection.is_full());

        let removed = port.connection.remove_where(|c| c.node_id.as_str() == "a");
        assert_eq!(removed, 1);
        assert!(port.references(&NodeId::from("b"), 2));
        assert!(!port.references_node(&NodeId::from("a")));
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("input".parse::<PortKind>(), Ok(PortKind::Input));
        assert_eq!(PortKind::Output.opposite(), PortKind::Input);
        assert!("Input".parse::<PortKind>().is_err());
    }
}
