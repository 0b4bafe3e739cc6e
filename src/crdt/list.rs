//! An id-addressed doubly linked list.
//!
//! Nodes live in a table keyed by `NodeId`; `next`/`prev` are ids rather
//! than references. Every traversal walks from `head` and gives up with
//! `CycleDetected` after visiting more nodes than the table holds.
//!
//! Mutations can be journaled. While a journal is open, the first write
//! to any table entry records its previous value (or its absence), and
//! `rollback` puts those values back along with the old head. The cost of
//! a transaction is proportional to the entries it touches, not to the
//! size of the list. Journals nest: an inner `commit` folds its entries
//! into the enclosing journal, so the outer `rollback` still undoes them.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;

use super::node::Block;
use super::node::Node;
use super::primitives::NodeId;
use crate::config::MergePolicy;
use crate::error::Error;
use crate::error::Result;

/// Saved state for an open transaction.
#[derive(Clone, Debug)]
struct Journal<N> {
    head: Option<NodeId>,
    /// First-touch copies. `None` means the entry did not exist.
    saved: FxHashMap<NodeId, Option<N>>,
}

#[derive(Clone, Debug)]
pub struct LinkedList<N: Node> {
    head: Option<NodeId>,
    nodes: FxHashMap<NodeId, N>,
    journals: Vec<Journal<N>>,
}

impl<N: Node> Default for LinkedList<N> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<N: Node> LinkedList<N> {
    /// Create an empty list.
    pub fn new() -> LinkedList<N> {
        return LinkedList {
            head: None,
            nodes: FxHashMap::default(),
            journals: Vec::new(),
        };
    }

    pub fn head(&self) -> Option<NodeId> {
        return self.head;
    }

    /// Number of nodes in the table.
    pub fn len(&self) -> usize {
        return self.nodes.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.nodes.is_empty();
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        return self.nodes.contains_key(id);
    }

    /// Look up a node by id.
    pub fn get(&self, id: &NodeId) -> Result<&N> {
        return self.nodes.get(id).ok_or(Error::NotFound(*id));
    }

    /// Look up a node by id for writing. Journaled.
    pub fn get_mut(&mut self, id: &NodeId) -> Result<&mut N> {
        if !self.nodes.contains_key(id) {
            return Err(Error::NotFound(*id));
        }
        self.record(*id);
        return self.nodes.get_mut(id).ok_or(Error::NotFound(*id));
    }

    // --- Journal ---

    /// Start recording writes so they can be undone. Opens a nested
    /// journal if one is already open.
    pub(crate) fn begin(&mut self) {
        self.journals.push(Journal {
            head: self.head,
            saved: FxHashMap::default(),
        });
    }

    /// Keep every write since the matching `begin`.
    pub(crate) fn commit(&mut self) {
        let Some(journal) = self.journals.pop() else {
            return;
        };
        if let Some(outer) = self.journals.last_mut() {
            for (id, saved) in journal.saved {
                outer.saved.entry(id).or_insert(saved);
            }
        }
    }

    /// Undo every write since the matching `begin`.
    pub(crate) fn rollback(&mut self) {
        let Some(journal) = self.journals.pop() else {
            return;
        };
        self.head = journal.head;
        for (id, saved) in journal.saved {
            match saved {
                Some(node) => {
                    self.nodes.insert(id, node);
                }
                None => {
                    self.nodes.remove(&id);
                }
            }
        }
    }

    fn record(&mut self, id: NodeId) {
        if let Some(journal) = self.journals.last_mut() {
            if !journal.saved.contains_key(&id) {
                journal.saved.insert(id, self.nodes.get(&id).cloned());
            }
        }
    }

    fn put(&mut self, node: N) {
        let id = node.id();
        self.record(id);
        self.nodes.insert(id, node);
    }

    fn take(&mut self, id: &NodeId) -> Result<N> {
        if !self.nodes.contains_key(id) {
            return Err(Error::NotFound(*id));
        }
        self.record(*id);
        return self.nodes.remove(id).ok_or(Error::NotFound(*id));
    }

    // --- Traversal ---

    /// Walk the list from the head.
    ///
    /// Yields an error and stops on a dangling link or a cycle.
    pub fn iter(&self) -> Iter<'_, N> {
        return Iter {
            list: self,
            cursor: self.head,
            visited: 0,
        };
    }

    /// Find the node at a position.
    pub fn find_by_index(&self, index: usize) -> Result<&N> {
        for (i, node) in self.iter().enumerate() {
            let node = node?;
            if i == index {
                return Ok(node);
            }
        }
        return Err(Error::IndexOutOfBounds {
            index,
            len: self.len(),
        });
    }

    /// Nodes in positions `[start, end)`.
    pub fn range(&self, start: usize, end: usize) -> Result<Vec<&N>> {
        if start > end {
            return Err(Error::InvalidArgument("range start is past range end"));
        }
        if end > self.len() {
            return Err(Error::IndexOutOfBounds {
                index: end,
                len: self.len(),
            });
        }
        let mut result = Vec::with_capacity(end - start);
        let mut walked = 0;
        for node in self.iter().take(end) {
            let node = node?;
            if walked >= start {
                result.push(node);
            }
            walked += 1;
        }
        if walked < end {
            return Err(Error::IndexOutOfBounds {
                index: end,
                len: self.len(),
            });
        }
        return Ok(result);
    }

    /// Concatenate the value of every node in order.
    pub fn to_text(&self) -> Result<String> {
        return self.iter().map(|node| node.map(|n| n.value())).collect();
    }

    /// Every node in order.
    pub fn to_vec(&self) -> Result<Vec<&N>> {
        return self.iter().collect();
    }

    fn tail(&self) -> Result<Option<NodeId>> {
        let mut tail = None;
        for node in self.iter() {
            tail = Some(node?.id());
        }
        return Ok(tail);
    }

    /// Check the structural invariants: the nodes reachable from the head
    /// are exactly the table, `prev` mirrors `next`, and every key names
    /// its own node.
    pub fn validate(&self) -> Result<()> {
        let mut prev = None;
        let mut reachable = 0;
        for node in self.iter() {
            let node = node?;
            if node.prev() != prev {
                return Err(Error::Inconsistent(format!(
                    "{} links back to {:?}, expected {:?}",
                    node.id(),
                    node.prev(),
                    prev
                )));
            }
            prev = Some(node.id());
            reachable += 1;
        }
        if reachable != self.nodes.len() {
            return Err(Error::Inconsistent(format!(
                "{} of {} nodes unreachable from head",
                self.nodes.len() - reachable,
                self.nodes.len()
            )));
        }
        for (key, node) in &self.nodes {
            if *key != node.id() {
                return Err(Error::Inconsistent(format!(
                    "key {} holds node {}",
                    key,
                    node.id()
                )));
            }
        }
        return Ok(());
    }

    // --- Mutation ---

    /// Link `node` between `prev` and `next`, which must be adjacent.
    fn splice(&mut self, mut node: N, prev: Option<NodeId>, next: Option<NodeId>) -> Result<()> {
        let id = node.id();
        if let Some(prev) = prev {
            self.get(&prev)?;
        }
        if let Some(next) = next {
            self.get(&next)?;
        }

        node.set_prev(prev);
        node.set_next(next);
        match prev {
            Some(prev) => self.get_mut(&prev)?.set_next(Some(id)),
            None => self.head = Some(id),
        }
        if let Some(next) = next {
            self.get_mut(&next)?.set_prev(Some(id));
        }
        self.put(node);
        return Ok(());
    }

    /// Join a node's neighbours across it. The node stays in the table with
    /// its stale links.
    fn unlink(&mut self, id: &NodeId) -> Result<()> {
        let node = self.get(id)?;
        let prev = node.prev();
        let next = node.next();
        if let Some(prev) = prev {
            self.get(&prev)?;
        }
        if let Some(next) = next {
            self.get(&next)?;
        }

        if self.head == Some(*id) {
            self.head = next;
        }
        if let Some(prev) = prev {
            self.get_mut(&prev)?.set_next(next);
        }
        if let Some(next) = next {
            self.get_mut(&next)?.set_prev(prev);
        }
        return Ok(());
    }

    /// Insert a new node so that it ends up at `index`.
    ///
    /// The returned node's `prev`/`next` describe where it was placed and
    /// are sent to other replicas verbatim.
    pub fn insert_at_index(&mut self, index: usize, value: String, id: NodeId) -> Result<&N> {
        if index > self.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        if self.contains(&id) {
            return Err(Error::InvalidArgument("node id already in use"));
        }

        let (prev, next) = if index == 0 {
            (None, self.head)
        } else {
            let prev = self.find_by_index(index - 1)?;
            (Some(prev.id()), prev.next())
        };
        self.splice(N::create(id, value), prev, next)?;
        return self.get(&id);
    }

    /// Insert a node received from another replica.
    ///
    /// Returns `false` without touching the list if the id is already
    /// present. The node is placed after its `prev` (or at the head when
    /// it has none), then, under `MergePolicy::Ordered`, moved past any
    /// following nodes with greater ids. Its links are overwritten with
    /// wherever it actually landed.
    pub fn insert_by_id(&mut self, node: N, policy: MergePolicy) -> Result<bool> {
        let id = node.id();
        if self.contains(&id) {
            return Ok(false);
        }

        let (mut prev, mut next) = match node.prev() {
            Some(prev) => (Some(prev), self.get(&prev)?.next()),
            None => (None, self.head),
        };

        if policy == MergePolicy::Ordered {
            let mut skipped = 0;
            while let Some(candidate) = next {
                if candidate < id {
                    break;
                }
                skipped += 1;
                if skipped > self.len() {
                    return Err(Error::CycleDetected(candidate));
                }
                prev = Some(candidate);
                next = self.get(&candidate)?.next();
            }
        }

        self.splice(node, prev, next)?;
        return Ok(true);
    }

    /// Remove a node from the list and the table.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<N> {
        self.unlink(id)?;
        return self.take(id);
    }
}

/// Iterator over a list, see [`LinkedList::iter`].
pub struct Iter<'a, N: Node> {
    list: &'a LinkedList<N>,
    cursor: Option<NodeId>,
    visited: usize,
}

impl<'a, N: Node> Iterator for Iter<'a, N> {
    type Item = Result<&'a N>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = None;
        let node = match self.list.get(&id) {
            Ok(node) => node,
            Err(err) => return Some(Err(err)),
        };
        if self.visited >= self.list.len() {
            return Some(Err(Error::CycleDetected(id)));
        }
        self.visited += 1;
        self.cursor = node.next();
        return Some(Ok(node));
    }
}

// --- Blocks ---

impl LinkedList<Block> {
    /// Move `target` to a new position.
    ///
    /// With no `before` the block becomes the head; with no `after` it
    /// becomes the tail; otherwise it is placed directly after `before`.
    pub fn reorder(
        &mut self,
        target: &NodeId,
        before: Option<&NodeId>,
        after: Option<&NodeId>,
    ) -> Result<()> {
        if before.is_none() && after.is_none() {
            return Err(Error::InvalidArgument("reorder needs a before or after neighbour"));
        }
        if before == Some(target) || after == Some(target) {
            return Err(Error::InvalidArgument("block cannot be its own neighbour"));
        }
        self.get(target)?;
        if let Some(before) = before {
            self.get(before)?;
        }
        if let Some(after) = after {
            self.get(after)?;
        }

        self.unlink(target)?;
        let node = self.take(target)?;

        let (prev, next) = match (before, after) {
            (None, _) => (None, self.head),
            (Some(_), None) => (self.tail()?, None),
            (Some(before), Some(_)) => (Some(*before), self.get(before)?.next()),
        };
        return self.splice(node, prev, next);
    }

    /// Recompute `list_index` for every block.
    ///
    /// An ordered item starts at 1 after a non-ordered block or when it is
    /// indented deeper than the item before it. When it is indented less,
    /// it continues the nearest earlier ordered item at its own indent.
    /// At equal indent it continues the item before it. Other blocks get
    /// no index.
    pub fn renumber_ordered_lists(&mut self) -> Result<()> {
        let mut order = Vec::with_capacity(self.len());
        for block in self.iter() {
            let block = block?;
            order.push((block.id, block.is_ordered_item(), block.indent));
        }

        let mut computed: Vec<Option<u32>> = Vec::with_capacity(order.len());
        for (i, &(_, ordered, indent)) in order.iter().enumerate() {
            if !ordered {
                computed.push(None);
                continue;
            }
            let index = match i.checked_sub(1).map(|p| (order[p], computed[p])) {
                Some(((_, true, prev_indent), prev_index)) => {
                    if indent > prev_indent {
                        1
                    } else if indent < prev_indent {
                        (0..i)
                            .rev()
                            .find(|&j| order[j].1 && order[j].2 == indent)
                            .and_then(|j| computed[j])
                            .map_or(1, |n| n + 1)
                    } else {
                        prev_index.map_or(1, |n| n + 1)
                    }
                }
                _ => 1,
            };
            computed.push(Some(index));
        }

        for ((id, _, _), index) in order.into_iter().zip(computed) {
            if self.get(&id)?.list_index != index {
                self.get_mut(&id)?.list_index = index;
            }
        }
        return Ok(());
    }
}

// --- Serialization ---

/// Wire layout: `{ head, table: { "<clock>:<replica>": node } }`.
#[derive(Serialize, Deserialize)]
struct ListWire<T> {
    head: Option<NodeId>,
    table: BTreeMap<String, T>,
}

impl<N: Node + Serialize> Serialize for LinkedList<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let table: BTreeMap<String, &N> = self
            .nodes
            .iter()
            .map(|(id, node)| (id.to_string(), node))
            .collect();
        return ListWire { head: self.head, table }.serialize(serializer);
    }
}

/// Decoding validates the structure, so a list that deserializes is
/// always well formed.
impl<'de, N: Node + Deserialize<'de>> Deserialize<'de> for LinkedList<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = ListWire::<N>::deserialize(deserializer)?;
        let mut nodes = FxHashMap::default();
        for (key, node) in wire.table {
            let id: NodeId = key.parse().map_err(de::Error::custom)?;
            nodes.insert(id, node);
        }
        let list = LinkedList {
            head: wire.head,
            nodes,
            journals: Vec::new(),
        };
        list.validate().map_err(de::Error::custom)?;
        return Ok(list);
    }
}
