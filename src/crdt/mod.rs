//! Sequence CRDTs for structured documents.
//!
//! [`LinkedList`] is the id-addressed sequence, [`Replica`] adds a Lamport
//! clock and transactional apply, and [`DocumentReplica`] composes a list
//! of blocks whose text lives in per-block [`ParagraphReplica`]s.

pub mod document;
pub mod list;
pub mod node;
pub mod op;
pub mod paragraph;
pub mod primitives;
pub mod replica;

pub use document::DocumentReplica;
pub use list::LinkedList;
pub use node::Block;
pub use node::Char;
pub use node::Node;
pub use op::Operation;
pub use paragraph::CharAttributes;
pub use paragraph::ParagraphReplica;
pub use primitives::NodeId;
pub use primitives::ReplicaId;
pub use replica::Replica;
