//! Shared primitives for the block and character replicas.
//!
//! ## Clocks
//! - `LamportClock`: monotonic counter with the `max + 1` merge rule
//!
//! ## IDs
//! - `ReplicaId`: identifies one client session
//! - `NodeId`: `(clock, replica)` name of one list node

pub mod clock;
pub mod id;

pub use clock::LamportClock;
pub use id::NodeId;
pub use id::ReplicaId;
