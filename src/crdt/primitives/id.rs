//! Node identifiers.
//!
//! A `NodeId` is the only way one node refers to another, both inside a
//! list and across replicas. IDs are:
//! - Globally unique: each replica mints clocks from its own Lamport
//!   clock and stamps them with its replica id
//! - Totally ordered: by clock, then by replica
//! - Hashable: used directly as the list table key

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Identifies a replica (one client session).
pub type ReplicaId = u64;

/// A node identifier: the Lamport time it was minted at, plus the
/// replica that minted it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    pub clock: u64,
    pub replica: ReplicaId,
}

impl NodeId {
    /// Create a new node ID.
    pub fn new(clock: u64, replica: ReplicaId) -> NodeId {
        return NodeId { clock, replica };
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        return match self.clock.cmp(&other.clock) {
            Ordering::Equal => self.replica.cmp(&other.replica),
            other => other,
        };
    }
}

/// Canonical key form, `"<clock>:<replica>"`.
impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}:{}", self.clock, self.replica);
    }
}

/// Error returned when a canonical key does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node key {0:?}")]
pub struct ParseNodeIdError(pub String);

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<NodeId, ParseNodeIdError> {
        let err = || ParseNodeIdError(s.to_string());
        let (clock, replica) = s.split_once(':').ok_or_else(err)?;
        let clock = clock.parse().map_err(|_| err())?;
        let replica = replica.parse().map_err(|_| err())?;
        return Ok(NodeId { clock, replica });
    }
}
