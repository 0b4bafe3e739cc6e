//! Quire - replicated block documents built on sequence CRDTs.
//!
//! # Quick Start
//!
//! ```
//! use quire::crdt::CharAttributes;
//! use quire::crdt::DocumentReplica;
//!
//! let mut alice = DocumentReplica::new(1);
//! let mut bob = DocumentReplica::new(2);
//!
//! // Alice adds a block and types into it
//! let insert = alice.local_insert(0, "", "page").unwrap();
//! let block = insert.node.id;
//! bob.apply(&insert.into()).unwrap();
//!
//! for (i, c) in "hi".chars().enumerate() {
//!     let op = alice
//!         .paragraph_mut(&block)
//!         .unwrap()
//!         .local_insert(i, c.to_string(), block, "page", &CharAttributes::default())
//!         .unwrap();
//!     bob.apply(&op.into()).unwrap();
//! }
//!
//! assert_eq!(bob.plain_text().unwrap(), "hi");
//! ```

pub mod config;
pub mod crdt;
pub mod error;

pub use config::MergePolicy;
pub use config::ReplicaConfig;
pub use error::Error;
pub use error::Result;
