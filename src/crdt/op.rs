//! Operations exchanged between replicas.
//!
//! Each local entry point returns one of these payloads and the matching
//! remote entry point consumes it. They carry ids, never positions: an
//! insert names the node it was placed after, a delete names its target,
//! so they still mean the same thing after concurrent edits have shifted
//! every index.
//!
//! On the wire an `Operation` is a JSON object tagged by `type`:
//!
//! ```text
//! { "type": "charDelete", "targetId": { "clock": 3, "replica": 1 },
//!   "clock": 5, "blockId": { "clock": 1, "replica": 1 }, "pageId": "p" }
//! ```

use serde::Deserialize;
use serde::Serialize;

use super::node::BackgroundColor;
use super::node::Block;
use super::node::Char;
use super::node::Styles;
use super::node::TextColor;
use super::primitives::NodeId;
use super::primitives::ReplicaId;

/// Opaque id of the page a document belongs to.
pub type PageId = String;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInsert {
    /// The new block, including its paragraph state.
    pub node: Block,
    pub page_id: PageId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDelete {
    pub target_id: NodeId,
    pub clock: u64,
    pub page_id: PageId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockUpdate {
    /// The block with the fields to merge.
    pub node: Block,
    pub page_id: PageId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockReorder {
    pub target_id: NodeId,
    pub before_id: Option<NodeId>,
    pub after_id: Option<NodeId>,
    pub clock: u64,
    pub replica: ReplicaId,
    pub page_id: PageId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCheckbox {
    pub block_id: NodeId,
    pub is_checked: bool,
    pub page_id: PageId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharInsert {
    pub node: Char,
    pub block_id: NodeId,
    pub page_id: PageId,
    #[serde(default)]
    pub style: Styles,
    #[serde(default)]
    pub color: Option<TextColor>,
    #[serde(default)]
    pub background_color: Option<BackgroundColor>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharDelete {
    pub target_id: NodeId,
    pub clock: u64,
    pub block_id: NodeId,
    pub page_id: PageId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharUpdate {
    pub node: Char,
    pub block_id: NodeId,
    pub page_id: PageId,
}

/// Any operation a document replica can apply.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    BlockInsert(BlockInsert),
    BlockDelete(BlockDelete),
    BlockUpdate(BlockUpdate),
    BlockReorder(BlockReorder),
    BlockCheckbox(BlockCheckbox),
    CharInsert(CharInsert),
    CharDelete(CharDelete),
    CharUpdate(CharUpdate),
}

impl Operation {
    pub fn page_id(&self) -> &str {
        return match self {
            Operation::BlockInsert(op) => &op.page_id,
            Operation::BlockDelete(op) => &op.page_id,
            Operation::BlockUpdate(op) => &op.page_id,
            Operation::BlockReorder(op) => &op.page_id,
            Operation::BlockCheckbox(op) => &op.page_id,
            Operation::CharInsert(op) => &op.page_id,
            Operation::CharDelete(op) => &op.page_id,
            Operation::CharUpdate(op) => &op.page_id,
        };
    }

    /// The block whose paragraph a char operation edits.
    pub fn block_id(&self) -> Option<NodeId> {
        return match self {
            Operation::CharInsert(op) => Some(op.block_id),
            Operation::CharDelete(op) => Some(op.block_id),
            Operation::CharUpdate(op) => Some(op.block_id),
            _ => None,
        };
    }
}

macro_rules! impl_from_payload {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Operation {
                fn from(op: $variant) -> Operation {
                    return Operation::$variant(op);
                }
            }
        )*
    };
}

impl_from_payload!(
    BlockInsert,
    BlockDelete,
    BlockUpdate,
    BlockReorder,
    BlockCheckbox,
    CharInsert,
    CharDelete,
    CharUpdate
);
