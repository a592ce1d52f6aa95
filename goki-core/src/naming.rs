//! Resource naming.
//!
//! Labeled resources are the only record of a cluster, so every name is
//! derived here from a [`Resource`] (kind + optional ordinal) and the
//! configured prefix.

use crate::error::{GokiError, Result};
use std::fmt;

/// The max number of cockroaches of Goki.
pub const MAX_NODES: u8 = 9;

/// CockroachDB listens on this port inside each node sandbox.
pub const NODE_SQL_PORT: u16 = 26257;

/// CockroachDB web UI port inside each node sandbox.
pub const NODE_HTTP_PORT: u16 = 8080;

/// Node ordinal in `1..=MAX_NODES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u8);

impl NodeId {
    pub fn new(id: i64) -> Result<Self> {
        if (1..=i64::from(MAX_NODES)).contains(&id) {
            Ok(Self(id as u8))
        } else {
            Err(GokiError::InvalidNodeId { id, max: MAX_NODES })
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Every possible node id, in order.
    pub fn all() -> impl Iterator<Item = NodeId> {
        (1..=MAX_NODES).map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kinds of labeled resources understood by the sandbox client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Sandbox,
    Network,
    Volume,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sandbox => write!(f, "containers"),
            Self::Network => write!(f, "networks"),
            Self::Volume => write!(f, "volumes"),
        }
    }
}

/// A named resource owned by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Network,
    HelperSandbox,
    CredentialVolume,
    NodeSandbox(NodeId),
    NodeVolume(NodeId),
}

/// Canonical names for a given prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    prefix: String,
}

impl Naming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn name(&self, resource: Resource) -> String {
        match resource {
            Resource::Network => format!("{}-net", self.prefix),
            Resource::HelperSandbox => format!("{}-client", self.prefix),
            Resource::CredentialVolume => format!("{}-volume-client", self.prefix),
            Resource::NodeSandbox(id) => format!("{}-{}", self.prefix, id),
            Resource::NodeVolume(id) => format!("{}-volume-{}", self.prefix, id),
        }
    }

    pub fn node(&self, id: NodeId) -> String {
        self.name(Resource::NodeSandbox(id))
    }

    pub fn helper(&self) -> String {
        self.name(Resource::HelperSandbox)
    }

    pub fn network(&self) -> String {
        self.name(Resource::Network)
    }

    /// `host:port` a node advertises inside the network.
    pub fn node_address(&self, id: NodeId) -> String {
        format!("{}:{}", self.node(id), NODE_SQL_PORT)
    }

    /// Comma separated join list naming every intended node.
    pub fn join_list(&self, nodes: &[NodeId]) -> String {
        nodes.iter().map(|id| self.node(*id)).collect::<Vec<_>>().join(",")
    }
}
