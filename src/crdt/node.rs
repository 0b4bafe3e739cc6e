//! List nodes: characters and blocks.
//!
//! Nodes never hold references to each other. `next` and `prev` are ids
//! resolved through the owning list's table, so a node decoded from a
//! remote payload is addressable exactly like one created locally.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use smallvec::SmallVec;

use super::paragraph::ParagraphReplica;
use super::primitives::NodeId;

/// Text decorations. Most characters carry zero or one.
pub type Styles = SmallVec<[TextStyle; 4]>;

/// The operations a list needs from the nodes it links together.
pub trait Node: Clone + fmt::Debug {
    /// Create an unlinked node.
    fn create(id: NodeId, value: String) -> Self;

    fn id(&self) -> NodeId;

    fn value(&self) -> &str;

    fn next(&self) -> Option<NodeId>;

    fn prev(&self) -> Option<NodeId>;

    fn set_next(&mut self, next: Option<NodeId>);

    fn set_prev(&mut self, prev: Option<NodeId>);
}

macro_rules! impl_links {
    () => {
        fn id(&self) -> NodeId {
            return self.id;
        }

        fn value(&self) -> &str {
            return &self.value;
        }

        fn next(&self) -> Option<NodeId> {
            return self.next;
        }

        fn prev(&self) -> Option<NodeId> {
            return self.prev;
        }

        fn set_next(&mut self, next: Option<NodeId>) {
            self.next = next;
        }

        fn set_prev(&mut self, prev: Option<NodeId>) {
            self.prev = prev;
        }
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    Black,
    Red,
    Green,
    Blue,
    White,
    Yellow,
    Purple,
    Brown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundColor {
    Black,
    Red,
    Green,
    Blue,
    White,
    Yellow,
    Purple,
    Brown,
    Transparent,
}

/// What kind of block this is. Wire names match the editor's markup tags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    #[default]
    P,
    H1,
    H2,
    H3,
    Ul,
    Ol,
    Li,
    Checkbox,
    Blockquote,
    Hr,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationType {
    #[default]
    None,
    Highlight,
    Rainbow,
    FadeIn,
    SlideIn,
    Pulse,
    Gradation,
    Bounce,
}

/// A single character in a paragraph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Char {
    pub id: NodeId,
    pub value: String,
    pub next: Option<NodeId>,
    pub prev: Option<NodeId>,
    #[serde(default)]
    pub style: Styles,
    #[serde(default)]
    pub color: Option<TextColor>,
    #[serde(default)]
    pub background_color: Option<BackgroundColor>,
}

impl Node for Char {
    fn create(id: NodeId, value: String) -> Char {
        return Char {
            id,
            value,
            next: None,
            prev: None,
            style: Styles::new(),
            color: None,
            background_color: None,
        };
    }

    impl_links!();
}

impl Char {
    /// Copy the decorations of `other` onto this character.
    ///
    /// Style is replaced only when `other` carries some, colour only when
    /// set. The background colour is always taken so that clearing it
    /// propagates.
    pub fn merge_attributes(&mut self, other: &Char) {
        if !other.style.is_empty() {
            self.style = other.style.clone();
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        self.background_color = other.background_color;
    }
}

/// A block in a document. Its text lives in its own paragraph replica.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: NodeId,
    pub value: String,
    pub next: Option<NodeId>,
    pub prev: Option<NodeId>,
    #[serde(rename = "type", default)]
    pub kind: ElementType,
    #[serde(default)]
    pub indent: u32,
    #[serde(default)]
    pub animation: AnimationType,
    #[serde(default)]
    pub icon: String,
    /// Display number inside an ordered list. Recomputed, never trusted.
    #[serde(default)]
    pub list_index: Option<u32>,
    #[serde(default)]
    pub style: Styles,
    #[serde(default)]
    pub checked: bool,
    pub paragraph: ParagraphReplica,
}

impl Node for Block {
    fn create(id: NodeId, value: String) -> Block {
        return Block {
            id,
            value,
            next: None,
            prev: None,
            kind: ElementType::P,
            indent: 0,
            animation: AnimationType::None,
            icon: String::new(),
            list_index: None,
            style: Styles::new(),
            checked: false,
            paragraph: ParagraphReplica::new(id.replica),
        };
    }

    impl_links!();
}

impl Block {
    /// Merge the presentation fields of `other` into this block.
    ///
    /// Links, value, the checkbox flag and the paragraph are left alone.
    pub fn merge_fields(&mut self, other: &Block) {
        self.kind = other.kind;
        self.indent = other.indent;
        self.style = other.style.clone();
        self.animation = other.animation;
        self.icon = other.icon.clone();
        self.list_index = other.list_index;
    }

    /// The block's text, read from its paragraph.
    pub fn text(&self) -> crate::Result<String> {
        return self.paragraph.read();
    }

    pub fn is_ordered_item(&self) -> bool {
        return self.kind == ElementType::Ol;
    }
}
