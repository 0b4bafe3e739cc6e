//! Replica state shared by the document and paragraph replicas.
//!
//! A `Replica` owns a Lamport clock, a replica id and one list. New ids are
//! minted as `(clock + 1, replica)`; remote operations merge the clock with
//! `max(local, remote) + 1`.
//!
//! Every public mutation runs inside [`Replica::transact`]: the clock is
//! remembered and the list journals its writes, and an error puts both
//! back before it reaches the caller. The `*_local`/`*_remote` helpers
//! are the untransacted building blocks, for wrappers that compose
//! several steps into one transaction.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::list::LinkedList;
use super::node::Node;
use super::primitives::LamportClock;
use super::primitives::NodeId;
use super::primitives::ReplicaId;
use crate::config::ReplicaConfig;
use crate::error::Error;
use crate::error::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "N: Serialize", deserialize = "N: Deserialize<'de>"))]
pub struct Replica<N: Node> {
    clock: LamportClock,
    replica: ReplicaId,
    sequence: LinkedList<N>,
    #[serde(skip)]
    config: ReplicaConfig,
}

impl<N: Node> Replica<N> {
    /// Create an empty replica with the default configuration.
    pub fn new(replica: ReplicaId) -> Replica<N> {
        return Replica::with_config(replica, ReplicaConfig::default());
    }

    pub fn with_config(replica: ReplicaId, config: ReplicaConfig) -> Replica<N> {
        return Replica {
            clock: LamportClock::new(),
            replica,
            sequence: LinkedList::new(),
            config,
        };
    }

    pub fn clock(&self) -> u64 {
        return self.clock.time();
    }

    pub fn replica_id(&self) -> ReplicaId {
        return self.replica;
    }

    pub fn config(&self) -> &ReplicaConfig {
        return &self.config;
    }

    pub(crate) fn adopt(&mut self, replica: ReplicaId, config: ReplicaConfig) {
        self.replica = replica;
        self.config = config;
    }

    pub fn list(&self) -> &LinkedList<N> {
        return &self.sequence;
    }

    pub(crate) fn list_mut(&mut self) -> &mut LinkedList<N> {
        return &mut self.sequence;
    }

    pub fn len(&self) -> usize {
        return self.sequence.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.sequence.is_empty();
    }

    /// The concatenated value of every node.
    pub fn read(&self) -> Result<String> {
        return self.sequence.to_text();
    }

    /// Every node in order.
    pub fn spread(&self) -> Result<Vec<&N>> {
        return self.sequence.to_vec();
    }

    /// Run `f` as one atomic operation.
    ///
    /// On error the clock and the list are restored to their state before
    /// the call and the error is returned unchanged. Transactions nest, so
    /// `f` may call the public entry points: their writes are undone along
    /// with everything else if `f` fails.
    pub fn transact<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let clock = self.clock;
        self.sequence.begin();
        match f(self) {
            Ok(result) => {
                self.sequence.commit();
                return Ok(result);
            }
            Err(err) => {
                self.sequence.rollback();
                self.clock = clock;
                tracing::debug!(replica = self.replica, error = %err, "rolled back operation");
                return Err(err);
            }
        }
    }

    pub(crate) fn tick(&mut self) -> u64 {
        return self.clock.tick();
    }

    pub(crate) fn observe(&mut self, remote_time: u64) -> u64 {
        return self.clock.update(remote_time);
    }

    // --- Untransacted steps ---

    /// Mint an id and insert a node at `index`.
    pub(crate) fn insert_local(&mut self, index: usize, value: String) -> Result<NodeId> {
        let id = NodeId::new(self.clock.peek(), self.replica);
        self.sequence.insert_at_index(index, value, id)?;
        self.clock.tick();
        return Ok(id);
    }

    /// Delete the node at `index`, returning its id and the clock the
    /// deletion is stamped with.
    pub(crate) fn delete_local(&mut self, index: usize) -> Result<(NodeId, u64)> {
        let target = self.sequence.find_by_index(index)?.id();
        let clock = self.clock.time();
        self.sequence.delete_node(&target)?;
        self.clock.tick();
        return Ok((target, clock));
    }

    /// Insert a node minted elsewhere. Duplicates still merge the clock.
    pub(crate) fn insert_remote(&mut self, node: N) -> Result<bool> {
        let id = node.id();
        let inserted = self.sequence.insert_by_id(node, self.config.merge_policy)?;
        self.clock.update(id.clock);
        if inserted {
            tracing::trace!(replica = self.replica, %id, "applied remote insert");
        } else {
            tracing::debug!(replica = self.replica, %id, "ignored duplicate insert");
        }
        return Ok(inserted);
    }

    pub(crate) fn delete_remote(&mut self, target: &NodeId, clock: u64) -> Result<N> {
        let node = self.sequence.delete_node(target)?;
        self.clock.update(clock);
        tracing::trace!(replica = self.replica, id = %target, "applied remote delete");
        return Ok(node);
    }

    // --- Transacted entry points ---

    /// Insert `value` so that it lands at `index`. Returns the new node,
    /// whose links are what other replicas need to place it.
    pub fn local_insert(&mut self, index: usize, value: impl Into<String>) -> Result<N> {
        let value = value.into();
        return self.transact(|replica| {
            let id = replica.insert_local(index, value)?;
            return Ok(replica.sequence.get(&id)?.clone());
        });
    }

    /// Delete the node at `index`. Returns the removed id and the clock
    /// stamp for the outgoing operation.
    pub fn local_delete(&mut self, index: usize) -> Result<(NodeId, u64)> {
        return self.transact(|replica| replica.delete_local(index));
    }

    /// Apply an insert from another replica. Returns `false` if the node
    /// was already present.
    pub fn remote_insert(&mut self, node: N) -> Result<bool> {
        return self.transact(|replica| replica.insert_remote(node));
    }

    /// Apply a delete from another replica.
    pub fn remote_delete(&mut self, target: &NodeId, clock: u64) -> Result<N> {
        return self.transact(|replica| replica.delete_remote(target, clock));
    }

    /// Highest clock among the ids in the list.
    pub fn max_node_clock(&self) -> u64 {
        return self
            .sequence
            .iter()
            .filter_map(|node| node.ok())
            .map(|node| node.id().clock)
            .max()
            .unwrap_or(0);
    }

    /// Reject state whose clock is behind an id it holds: minting from it
    /// could reuse an id.
    pub(crate) fn check_clock(&self) -> Result<()> {
        let max = self.max_node_clock();
        if self.clock.time() < max {
            return Err(Error::Inconsistent(format!(
                "clock {} is behind node clock {}",
                self.clock.time(),
                max
            )));
        }
        return Ok(());
    }
}

impl<N: Node + Serialize> Replica<N> {
    /// Serialize as `{ clock, replica, sequence: { head, table } }`.
    pub fn to_json(&self) -> Result<Value> {
        return Ok(serde_json::to_value(self)?);
    }
}

impl<N: Node + for<'de> Deserialize<'de>> Replica<N> {
    /// Rebuild a replica from `to_json` output.
    pub fn from_json(value: Value) -> Result<Replica<N>> {
        let replica: Replica<N> = serde_json::from_value(value)?;
        replica.check_clock()?;
        return Ok(replica);
    }

    /// Replace this replica's state with a serialized one, keeping the
    /// configuration. The payload is decoded and checked in full before
    /// anything is replaced, so a bad payload leaves the replica as it was.
    pub fn restore(&mut self, value: Value) -> Result<()> {
        let restored = match Replica::<N>::from_json(value) {
            Ok(restored) => restored,
            Err(err) => {
                tracing::warn!(replica = self.replica, error = %err, "rejected replica state");
                return Err(err);
            }
        };
        self.clock = restored.clock;
        self.replica = restored.replica;
        self.sequence = restored.sequence;
        return Ok(());
    }
}
