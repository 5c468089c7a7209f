//! Node naming for the ring.
//!
//! Nodes are identified by name (typically a hostname). Plans refer to nodes
//! by name only; connection state and other heavy per-node data live
//! elsewhere.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a physical node participating in the ring.
///
/// Newtype over `String` so node names are not confused with other strings
/// (service names, keys) in signatures.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeName(String);

impl NodeName {
    /// Construct a node name from anything string-like.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}
