// SPDX-License-Identifier: MIT OR Apache-2.0
//! Stable string identities for endpoints and connections.
//!
//! An endpoint encodes as `<nodeId>_<portIndex>_<kind>`, for example
//! `add_x81kq2_0_input`. A connection key joins the input endpoint and the
//! output endpoint with [`CONNECTION_SEPARATOR`]:
//! `add_x81kq2_0_input__const_7hd0aa_0_output`.
//!
//! Decoding is strict. A string that does not match the scheme is a
//! [`IdentityError`], never a silent default.

use crate::node::NodeId;
use crate::port::PortKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between the input and output halves of a connection key
pub const CONNECTION_SEPARATOR: &str = "__";

/// Error when decoding an identity string
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// String is not `<nodeId>_<portIndex>_<kind>`
    #[error("Malformed endpoint id: {0:?}")]
    MalformedEndpoint(String),

    /// String has no connection separator
    #[error("Malformed connection id: {0:?}")]
    MalformedConnection(String),

    /// Node ID cannot be encoded unambiguously
    #[error("Invalid node id: {0:?}")]
    InvalidNodeId(String),
}

/// Runtime identity of one port occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Owning node
    pub node_id: NodeId,
    /// Port index within the node's inputs or outputs
    pub port: usize,
    /// Input or output side
    pub kind: PortKind,
}

impl Endpoint {
    /// Create a new endpoint
    pub fn new(node_id: impl Into<NodeId>, port: usize, kind: PortKind) -> Self {
        Self {
            node_id: node_id.into(),
            port,
            kind,
        }
    }

    /// Input endpoint
    pub fn input(node_id: impl Into<NodeId>, port: usize) -> Self {
        Self::new(node_id, port, PortKind::Input)
    }

    /// Output endpoint
    pub fn output(node_id: impl Into<NodeId>, port: usize) -> Self {
        Self::new(node_id, port, PortKind::Output)
    }

    /// Encode as `<nodeId>_<portIndex>_<kind>`
    pub fn encode(&self) -> String {
        format!("{}_{}_{}", self.node_id, self.port, self.kind)
    }

    /// Decode a string produced by [`Endpoint::encode`]
    pub fn decode(id: &str) -> Result<Self, IdentityError> {
        let malformed = || IdentityError::MalformedEndpoint(id.to_string());

        // The node ID may itself contain `_`, so split from the right.
        let mut parts = id.rsplitn(3, '_');
        let (Some(kind), Some(port), Some(node_id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        if node_id.is_empty() || port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let kind = kind.parse::<PortKind>().map_err(|()| malformed())?;
        let port = port.parse::<usize>().map_err(|_| malformed())?;

        Ok(Self::new(node_id, port, kind))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.node_id, self.port, self.kind)
    }
}

impl FromStr for Endpoint {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// Identity of a connection: the ordered pair (input endpoint, output endpoint)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionKey {
    /// Input side
    pub input: Endpoint,
    /// Output side
    pub output: Endpoint,
}

impl ConnectionKey {
    /// Create a new key
    pub fn new(input: Endpoint, output: Endpoint) -> Self {
        Self { input, output }
    }

    /// Encode as `<input>__<output>`
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.input, CONNECTION_SEPARATOR, self.output)
    }

    /// Decode a string produced by [`ConnectionKey::encode`].
    ///
    /// Splits once on the first separator and decodes each half on its own.
    pub fn decode(id: &str) -> Result<Self, IdentityError> {
        let (input, output) = id
            .split_once(CONNECTION_SEPARATOR)
            .ok_or_else(|| IdentityError::MalformedConnection(id.to_string()))?;
        Ok(Self::new(Endpoint::decode(input)?, Endpoint::decode(output)?))
    }

    /// Whether either side belongs to `node_id`
    pub fn involves_node(&self, node_id: &NodeId) -> bool {
        &self.input.node_id == node_id || &self.output.node_id == node_id
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.input, CONNECTION_SEPARATOR, self.output)
    }
}

impl FromStr for ConnectionKey {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encoding() {
        let endpoint = Endpoint::input("add_x81kq2", 3);
        assert_eq!(endpoint.encode(), "add_x81kq2_3_input");
        assert_eq!(endpoint.to_string(), endpoint.encode());
        assert_eq!(Endpoint::decode("add_x81kq2_3_input"), Ok(endpoint));
    }

    #[test]
    fn test_endpoint_round_trip_with_underscored_ids() {
        for id in ["a", "_a", "snake_case_id", "9", "x_1_input"] {
            for kind in [PortKind::Input, PortKind::Output] {
                let endpoint = Endpoint::new(id, 12, kind);
                assert_eq!(Endpoint::decode(&endpoint.encode()), Ok(endpoint));
            }
        }
    }

    #[test]
    fn test_malformed_endpoints_fail() {
        for bad in [
            "",
            "node",
            "node_0",
            "_0_input",
            "node__input",
            "node_x_input",
            "node_+1_input",
            "node_0_sideways",
            "node_99999999999999999999999_output",
        ] {
            assert!(
                matches!(Endpoint::decode(bad), Err(IdentityError::MalformedEndpoint(_))),
                "{bad:?} decoded"
            );
        }
    }

    #[test]
    fn test_connection_key_round_trip() {
        let key = ConnectionKey::new(Endpoint::input("b_node", 0), Endpoint::output("a_node", 2));
        let encoded = key.encode();
        assert_eq!(encoded, "b_node_0_input__a_node_2_output");
        assert_eq!(ConnectionKey::decode(&encoded), Ok(key.clone()));
        assert_eq!(encoded.parse::<ConnectionKey>(), Ok(key));
    }

    #[test]
    fn test_connection_key_keeps_pair_order() {
        // Kinds are not checked on decode; the pair comes back as encoded.
        let key = ConnectionKey::new(Endpoint::output("a", 0), Endpoint::output("b", 1));
        assert_eq!(ConnectionKey::decode(&key.encode()), Ok(key));
    }

    #[test]
    fn test_malformed_connection_fails() {
        assert!(matches!(
            ConnectionKey::decode("a_0_input-b_0_output"),
            Err(IdentityError::MalformedConnection(_))
        ));
        assert!(matches!(
            ConnectionKey::decode("a_0_input__b_0"),
            Err(IdentityError::MalformedEndpoint(_))
        ));
    }
}
