//! Block-level replica: an ordered sequence of blocks, each owning the
//! paragraph replica that holds its text.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::node::Block;
use super::op::BlockCheckbox;
use super::op::BlockDelete;
use super::op::BlockInsert;
use super::op::BlockReorder;
use super::op::BlockUpdate;
use super::op::Operation;
use super::paragraph::ParagraphReplica;
use super::primitives::NodeId;
use super::primitives::ReplicaId;
use super::replica::Replica;
use crate::config::ReplicaConfig;
use crate::error::Result;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReplica {
    #[serde(flatten)]
    crdt: Replica<Block>,
    /// Block under the local cursor. Never replicated.
    #[serde(default)]
    current_block: Option<Block>,
}

impl Replica<Block> {
    fn renumber(&mut self) -> Result<()> {
        if self.config().renumber_lists {
            self.list_mut().renumber_ordered_lists()?;
        }
        return Ok(());
    }

    /// Point a block's paragraph at this replica's id and configuration.
    /// Fails if the paragraph's clock is behind its own chars.
    fn adopt_paragraph(&mut self, id: &NodeId) -> Result<()> {
        self.list().get(id)?.paragraph.crdt().check_clock()?;
        let replica = self.replica_id();
        let config = self.config().clone();
        self.list_mut().get_mut(id)?.paragraph.adopt(replica, config);
        return Ok(());
    }
}

impl DocumentReplica {
    pub fn new(replica: ReplicaId) -> DocumentReplica {
        return DocumentReplica::with_config(replica, ReplicaConfig::default());
    }

    pub fn with_config(replica: ReplicaId, config: ReplicaConfig) -> DocumentReplica {
        return DocumentReplica {
            crdt: Replica::with_config(replica, config),
            current_block: None,
        };
    }

    pub fn crdt(&self) -> &Replica<Block> {
        return &self.crdt;
    }

    pub fn replica_id(&self) -> ReplicaId {
        return self.crdt.replica_id();
    }

    pub fn clock(&self) -> u64 {
        return self.crdt.clock();
    }

    pub fn len(&self) -> usize {
        return self.crdt.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.crdt.is_empty();
    }

    /// Blocks in document order.
    pub fn spread(&self) -> Result<Vec<&Block>> {
        return self.crdt.spread();
    }

    pub fn block(&self, id: &NodeId) -> Result<&Block> {
        return self.crdt.list().get(id);
    }

    pub fn paragraph(&self, id: &NodeId) -> Result<&ParagraphReplica> {
        return Ok(&self.block(id)?.paragraph);
    }

    pub fn paragraph_mut(&mut self, id: &NodeId) -> Result<&mut ParagraphReplica> {
        return Ok(&mut self.crdt.list_mut().get_mut(id)?.paragraph);
    }

    /// The text of every block, one line per block.
    pub fn plain_text(&self) -> Result<String> {
        let mut lines = Vec::with_capacity(self.len());
        for block in self.crdt.list().iter() {
            lines.push(block?.text()?);
        }
        return Ok(lines.join("\n"));
    }

    pub fn current_block(&self) -> Option<&Block> {
        return self.current_block.as_ref();
    }

    pub fn set_current_block(&mut self, block: Option<Block>) {
        self.current_block = block;
    }

    // --- Local operations ---

    /// Insert a block with an empty paragraph at `index`.
    pub fn local_insert(
        &mut self,
        index: usize,
        value: impl Into<String>,
        page_id: &str,
    ) -> Result<BlockInsert> {
        let value = value.into();
        return self.crdt.transact(|crdt| {
            let id = crdt.insert_local(index, value)?;
            crdt.adopt_paragraph(&id)?;
            crdt.renumber()?;
            return Ok(BlockInsert {
                node: crdt.list().get(&id)?.clone(),
                page_id: page_id.to_string(),
            });
        });
    }

    pub fn local_delete(&mut self, index: usize, page_id: &str) -> Result<BlockDelete> {
        return self.crdt.transact(|crdt| {
            let (target_id, clock) = crdt.delete_local(index)?;
            crdt.renumber()?;
            return Ok(BlockDelete {
                target_id,
                clock,
                page_id: page_id.to_string(),
            });
        });
    }

    /// Merge the presentation fields of `node` into the stored block.
    pub fn local_update(&mut self, node: &Block, page_id: &str) -> Result<BlockUpdate> {
        return self.crdt.transact(|crdt| {
            crdt.list_mut().get_mut(&node.id)?.merge_fields(node);
            crdt.renumber()?;
            return Ok(BlockUpdate {
                node: crdt.list().get(&node.id)?.clone(),
                page_id: page_id.to_string(),
            });
        });
    }

    /// Move `target`. See [`LinkedList::reorder`](super::list::LinkedList::reorder)
    /// for how `before` and `after` are read.
    pub fn local_reorder(
        &mut self,
        target: NodeId,
        before: Option<NodeId>,
        after: Option<NodeId>,
        page_id: &str,
    ) -> Result<BlockReorder> {
        return self.crdt.transact(|crdt| {
            crdt.list_mut()
                .reorder(&target, before.as_ref(), after.as_ref())?;
            let clock = crdt.clock();
            crdt.tick();
            crdt.renumber()?;
            return Ok(BlockReorder {
                target_id: target,
                before_id: before,
                after_id: after,
                clock,
                replica: crdt.replica_id(),
                page_id: page_id.to_string(),
            });
        });
    }

    pub fn local_checkbox(&mut self, block: NodeId, checked: bool, page_id: &str) -> Result<BlockCheckbox> {
        return self.crdt.transact(|crdt| {
            crdt.list_mut().get_mut(&block)?.checked = checked;
            return Ok(BlockCheckbox {
                block_id: block,
                is_checked: checked,
                page_id: page_id.to_string(),
            });
        });
    }

    // --- Remote operations ---

    pub fn remote_insert(&mut self, op: &BlockInsert) -> Result<()> {
        return self.crdt.transact(|crdt| {
            if crdt.insert_remote(op.node.clone())? {
                crdt.adopt_paragraph(&op.node.id)?;
            }
            crdt.renumber()?;
            return Ok(());
        });
    }

    pub fn remote_delete(&mut self, op: &BlockDelete) -> Result<()> {
        return self.crdt.transact(|crdt| {
            crdt.delete_remote(&op.target_id, op.clock)?;
            crdt.renumber()?;
            return Ok(());
        });
    }

    pub fn remote_update(&mut self, op: &BlockUpdate) -> Result<()> {
        return self.crdt.transact(|crdt| {
            crdt.list_mut().get_mut(&op.node.id)?.merge_fields(&op.node);
            crdt.renumber()?;
            return Ok(());
        });
    }

    pub fn remote_reorder(&mut self, op: &BlockReorder) -> Result<()> {
        return self.crdt.transact(|crdt| {
            crdt.list_mut()
                .reorder(&op.target_id, op.before_id.as_ref(), op.after_id.as_ref())?;
            crdt.observe(op.clock);
            crdt.renumber()?;
            tracing::trace!(replica = crdt.replica_id(), id = %op.target_id, "applied remote reorder");
            return Ok(());
        });
    }

    pub fn remote_checkbox(&mut self, op: &BlockCheckbox) -> Result<()> {
        return self.crdt.transact(|crdt| {
            crdt.list_mut().get_mut(&op.block_id)?.checked = op.is_checked;
            return Ok(());
        });
    }

    /// Apply an operation received from another replica. Char operations
    /// go to the paragraph of the block they name.
    pub fn apply(&mut self, op: &Operation) -> Result<()> {
        tracing::trace!(replica = self.replica_id(), page = op.page_id(), "applying operation");
        return match op {
            Operation::BlockInsert(op) => self.remote_insert(op),
            Operation::BlockDelete(op) => self.remote_delete(op),
            Operation::BlockUpdate(op) => self.remote_update(op),
            Operation::BlockReorder(op) => self.remote_reorder(op),
            Operation::BlockCheckbox(op) => self.remote_checkbox(op),
            Operation::CharInsert(op) => self.paragraph_mut(&op.block_id)?.remote_insert(op),
            Operation::CharDelete(op) => self.paragraph_mut(&op.block_id)?.remote_delete(op),
            Operation::CharUpdate(op) => self.paragraph_mut(&op.block_id)?.remote_update(op),
        };
    }

    // --- Serialization ---

    /// Serialize as `{ clock, replica, sequence, currentBlock }`.
    pub fn to_json(&self) -> Result<Value> {
        return Ok(serde_json::to_value(self)?);
    }

    pub fn from_json(value: Value) -> Result<DocumentReplica> {
        let mut document: DocumentReplica = serde_json::from_value(value)?;
        document.crdt.check_clock()?;
        document.adopt_paragraphs()?;
        return Ok(document);
    }

    /// Replace this document's state with a serialized one, keeping the
    /// configuration. A bad payload leaves the document untouched.
    pub fn restore(&mut self, value: Value) -> Result<()> {
        let mut restored = match DocumentReplica::from_json(value) {
            Ok(restored) => restored,
            Err(err) => {
                tracing::warn!(replica = self.replica_id(), error = %err, "rejected document state");
                return Err(err);
            }
        };
        let replica = restored.replica_id();
        restored.crdt.adopt(replica, self.crdt.config().clone());
        restored.adopt_paragraphs()?;
        *self = restored;
        return Ok(());
    }

    fn adopt_paragraphs(&mut self) -> Result<()> {
        let mut ids = Vec::with_capacity(self.len());
        for block in self.crdt.list().iter() {
            ids.push(block?.id);
        }
        for id in ids {
            self.crdt.adopt_paragraph(&id)?;
        }
        return Ok(());
    }
}
