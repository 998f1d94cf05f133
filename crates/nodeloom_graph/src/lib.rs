// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph data model for `nodeloom`.
//!
//! This crate holds everything about the graph that does not depend on
//! pointer interaction:
//! - Stable endpoint and connection identities
//! - Nodes with ordered, arity-typed input/output ports
//! - Mirrored connection storage inside port data
//! - Edge derivation for rendering
//! - Initial collision-avoiding layout
//!
//! ## Architecture
//!
//! The host owns the node list. Connections are never a separate
//! collection: each one is a pair of references stored on both ports, and
//! [`derive_edges`] turns them into a flat edge list on demand.

pub mod node;
pub mod port;
pub mod connection;
pub mod identity;
pub mod graph;
pub mod derive;
pub mod layout;
pub mod path;

pub use node::{Node, NodeId};
pub use port::{Arity, Port, PortConnection, PortKind};
pub use connection::{Connection, PortRef};
pub use identity::{ConnectionKey, Endpoint, IdentityError, CONNECTION_SEPARATOR};
pub use graph::{ConnectionError, Graph, GraphError};
pub use derive::{derive_edges, DerivedEdge};
pub use layout::{initial_layout, Direction, LayoutPlanner, NodeLayoutState};
pub use path::{ConnectionPath, ConnectionType};
