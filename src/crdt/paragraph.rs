//! Character-level replica holding one block's text.

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::node::BackgroundColor;
use super::node::Char;
use super::node::Styles;
use super::node::TextColor;
use super::op::CharDelete;
use super::op::CharInsert;
use super::op::CharUpdate;
use super::primitives::NodeId;
use super::primitives::ReplicaId;
use super::replica::Replica;
use crate::config::ReplicaConfig;
use crate::error::Result;

/// Decorations applied to a newly typed character.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharAttributes {
    pub style: Styles,
    pub color: Option<TextColor>,
    pub background_color: Option<BackgroundColor>,
}

impl CharAttributes {
    fn apply(&self, node: &mut Char) {
        if !self.style.is_empty() {
            node.style = self.style.clone();
        }
        if self.color.is_some() {
            node.color = self.color;
        }
        if self.background_color.is_some() {
            node.background_color = self.background_color;
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphReplica {
    #[serde(flatten)]
    crdt: Replica<Char>,
    #[serde(default)]
    current_caret: usize,
}

impl ParagraphReplica {
    pub fn new(replica: ReplicaId) -> ParagraphReplica {
        return ParagraphReplica::with_config(replica, ReplicaConfig::default());
    }

    pub fn with_config(replica: ReplicaId, config: ReplicaConfig) -> ParagraphReplica {
        return ParagraphReplica {
            crdt: Replica::with_config(replica, config),
            current_caret: 0,
        };
    }

    pub fn crdt(&self) -> &Replica<Char> {
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

    pub fn read(&self) -> Result<String> {
        return self.crdt.read();
    }

    pub fn spread(&self) -> Result<Vec<&Char>> {
        return self.crdt.spread();
    }

    pub fn current_caret(&self) -> usize {
        return self.current_caret;
    }

    pub fn set_current_caret(&mut self, caret: usize) {
        self.current_caret = caret;
    }

    /// Take over a paragraph that arrived inside a block: ids minted from
    /// here on carry the hosting replica's id.
    pub(crate) fn adopt(&mut self, replica: ReplicaId, config: ReplicaConfig) {
        self.crdt.adopt(replica, config);
    }

    /// Type `value` at `index`.
    pub fn local_insert(
        &mut self,
        index: usize,
        value: impl Into<String>,
        block_id: NodeId,
        page_id: &str,
        attributes: &CharAttributes,
    ) -> Result<CharInsert> {
        let value = value.into();
        return self.crdt.transact(|crdt| {
            let id = crdt.insert_local(index, value)?;
            let node = crdt.list_mut().get_mut(&id)?;
            attributes.apply(node);
            let node = node.clone();
            return Ok(CharInsert {
                style: node.style.clone(),
                color: node.color,
                background_color: node.background_color,
                node,
                block_id,
                page_id: page_id.to_string(),
            });
        });
    }

    /// Delete the character at `index`.
    pub fn local_delete(&mut self, index: usize, block_id: NodeId, page_id: &str) -> Result<CharDelete> {
        let (target_id, clock) = self.crdt.local_delete(index)?;
        return Ok(CharDelete {
            target_id,
            clock,
            block_id,
            page_id: page_id.to_string(),
        });
    }

    /// Restyle a character. Not clock-gated.
    pub fn local_update(&mut self, node: &Char, block_id: NodeId, page_id: &str) -> Result<CharUpdate> {
        return self.crdt.transact(|crdt| {
            let stored = crdt.list_mut().get_mut(&node.id)?;
            stored.merge_attributes(node);
            return Ok(CharUpdate {
                node: stored.clone(),
                block_id,
                page_id: page_id.to_string(),
            });
        });
    }

    pub fn remote_insert(&mut self, op: &CharInsert) -> Result<()> {
        let mut node = op.node.clone();
        let attributes = CharAttributes {
            style: op.style.clone(),
            color: op.color,
            background_color: op.background_color,
        };
        attributes.apply(&mut node);
        self.crdt.remote_insert(node)?;
        return Ok(());
    }

    pub fn remote_delete(&mut self, op: &CharDelete) -> Result<()> {
        self.crdt.remote_delete(&op.target_id, op.clock)?;
        return Ok(());
    }

    pub fn remote_update(&mut self, op: &CharUpdate) -> Result<()> {
        return self.crdt.transact(|crdt| {
            crdt.list_mut().get_mut(&op.node.id)?.merge_attributes(&op.node);
            return Ok(());
        });
    }

    /// Serialize as `{ clock, replica, sequence, currentCaret }`.
    pub fn to_json(&self) -> Result<Value> {
        return Ok(serde_json::to_value(self)?);
    }

    pub fn from_json(value: Value) -> Result<ParagraphReplica> {
        let paragraph: ParagraphReplica = serde_json::from_value(value)?;
        paragraph.crdt.check_clock()?;
        return Ok(paragraph);
    }

    /// Replace this paragraph's state with a serialized one, keeping the
    /// configuration. A bad payload leaves the paragraph untouched.
    pub fn restore(&mut self, value: Value) -> Result<()> {
        let config = self.crdt.config().clone();
        let mut restored = match ParagraphReplica::from_json(value) {
            Ok(restored) => restored,
            Err(err) => {
                tracing::warn!(replica = self.replica_id(), error = %err, "rejected paragraph state");
                return Err(err);
            }
        };
        let replica = restored.replica_id();
        restored.adopt(replica, config);
        *self = restored;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::node::TextStyle;
    use crate::error::Error;

    const PAGE: &str = "page";

    fn block() -> NodeId {
        return NodeId::new(1, 1);
    }

    fn type_text(p: &mut ParagraphReplica, text: &str) -> Vec<CharInsert> {
        let start = p.len();
        return text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                p.local_insert(start + i, c.to_string(), block(), PAGE, &CharAttributes::default())
                    .unwrap()
            })
            .collect();
    }

    #[test]
    fn insert_delete_and_round_trip() {
        let mut p = ParagraphReplica::new(1);
        type_text(&mut p, "abc");
        assert_eq!(p.read().unwrap(), "abc");

        let op = p.local_delete(1, block(), PAGE).unwrap();
        assert_eq!(op.target_id, NodeId::new(2, 1));
        assert_eq!(p.read().unwrap(), "ac");

        let clock = p.clock();
        let back = ParagraphReplica::from_json(p.to_json().unwrap()).unwrap();
        assert_eq!(back.read().unwrap(), "ac");
        assert_eq!(back.clock(), clock);
    }

    #[test]
    fn insert_carries_attributes() {
        let mut p = ParagraphReplica::new(1);
        let mut attributes = CharAttributes::default();
        attributes.style.push(TextStyle::Bold);
        attributes.color = Some(TextColor::Blue);
        let op = p.local_insert(0, "a", block(), PAGE, &attributes).unwrap();

        assert_eq!(op.style.as_slice(), &[TextStyle::Bold]);
        assert_eq!(op.color, Some(TextColor::Blue));
        assert_eq!(op.node.style.as_slice(), &[TextStyle::Bold]);
        assert_eq!(op.background_color, None);

        let mut other = ParagraphReplica::new(2);
        other.remote_insert(&op).unwrap();
        let c = other.spread().unwrap()[0].clone();
        assert_eq!(c.color, Some(TextColor::Blue));
        assert_eq!(c.style.as_slice(), &[TextStyle::Bold]);
    }

    #[test]
    fn remote_insert_takes_op_level_attributes() {
        let mut p = ParagraphReplica::new(1);
        let mut op = type_text(&mut p, "a").remove(0);
        op.background_color = Some(BackgroundColor::Yellow);

        let mut other = ParagraphReplica::new(2);
        other.remote_insert(&op).unwrap();
        assert_eq!(
            other.spread().unwrap()[0].background_color,
            Some(BackgroundColor::Yellow)
        );
    }

    #[test]
    fn update_propagates() {
        let mut a = ParagraphReplica::new(1);
        let mut b = ParagraphReplica::new(2);
        for op in type_text(&mut a, "hi") {
            b.remote_insert(&op).unwrap();
        }

        let mut restyled = a.spread().unwrap()[1].clone();
        restyled.style = Styles::from_slice(&[TextStyle::Italic, TextStyle::Underline]);
        restyled.background_color = Some(BackgroundColor::Green);
        let update = a.local_update(&restyled, block(), PAGE).unwrap();
        b.remote_update(&update).unwrap();

        let c = b.spread().unwrap()[1].clone();
        assert_eq!(c.style.as_slice(), &[TextStyle::Italic, TextStyle::Underline]);
        assert_eq!(c.background_color, Some(BackgroundColor::Green));
    }

    #[test]
    fn update_of_missing_char_fails() {
        let mut p = ParagraphReplica::new(1);
        let ghost = crate::crdt::node::Node::create(NodeId::new(9, 9), "g".to_string());
        let err = p.local_update(&ghost, block(), PAGE).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn caret_round_trips() {
        let mut p = ParagraphReplica::new(3);
        type_text(&mut p, "xyz");
        p.set_current_caret(2);
        let json = p.to_json().unwrap();
        assert_eq!(json["currentCaret"], 2);

        let mut q = ParagraphReplica::new(9);
        q.restore(json).unwrap();
        assert_eq!(q.current_caret(), 2);
        assert_eq!(q.read().unwrap(), "xyz");
    }

    #[test]
    fn restore_rejects_clock_behind_chars() {
        let mut source = ParagraphReplica::new(1);
        type_text(&mut source, "abc");
        let mut json = source.to_json().unwrap();
        json["clock"] = serde_json::json!(0);

        let mut target = ParagraphReplica::new(2);
        type_text(&mut target, "z");
        assert!(matches!(target.restore(json), Err(Error::Inconsistent(_))));
        assert_eq!(target.read().unwrap(), "z");
        assert_eq!(target.replica_id(), 2);
    }
}
