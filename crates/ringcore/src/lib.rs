//! Core types for the partitioned consistent-hash ring.
//!
//! This crate provides the fundamental abstractions the coverage planner
//! consumes:
//! - Keyspace arithmetic over the 160-bit hash space
//! - Immutable ring snapshots (partition owners, index lookups)
//! - A snapshot manager for installing membership changes
//! - Key placement via hashing

pub mod error;
pub mod hash;
pub mod keyspace;
pub mod manager;
pub mod node;
pub mod ring;

pub use error::{Error, Result};
pub use keyspace::{PartitionId, RingIndex, RING_BITS};
pub use manager::RingManager;
pub use node::NodeName;
pub use ring::RingSnapshot;
