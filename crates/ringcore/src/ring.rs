//! Immutable ring snapshot.
//!
//! A [`RingSnapshot`] is a read-only view of ring metadata captured at a
//! point in time: the partition count and the node owning each partition.
//! Consumers (the coverage planner in particular) capture one snapshot at
//! the start of an operation; later membership changes never affect work in
//! flight.

use crate::error::{Error, Result};
use crate::keyspace::{self, PartitionId, RingIndex};
use crate::node::NodeName;
use primitive_types::U256;
use std::collections::BTreeSet;

/// Read-only view of the ring: partition count and partition owners.
///
/// Owners are stored densely, indexed by partition ID, so every lookup is
/// O(1). Snapshots are cheap to share behind an `Arc` and are never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSnapshot {
    partition_count: u32,
    increment: U256,
    owners: Vec<NodeName>,
}

impl RingSnapshot {
    /// Build a snapshot from the owner of each partition, in partition-ID
    /// order.
    ///
    /// The number of owners must be a nonzero power of two so partitions
    /// divide the hash space evenly.
    pub fn new(owners: Vec<NodeName>) -> Result<Self> {
        let count = owners.len() as u64;
        if count == 0 || !count.is_power_of_two() || count > u64::from(u32::MAX) {
            return Err(Error::InvalidPartitionCount(count));
        }
        let partition_count = count as u32;
        Ok(Self {
            partition_count,
            increment: keyspace::ring_increment(partition_count),
            owners,
        })
    }

    /// Build a snapshot assigning partitions to `nodes` round-robin.
    ///
    /// Handy for tests and tooling; real deployments install ownership
    /// produced by the cluster's claim algorithm via [`Self::new`].
    pub fn uniform(partition_count: u32, nodes: &[NodeName]) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::NoNodes);
        }
        let owners = (0..partition_count as usize)
            .map(|i| nodes[i % nodes.len()].clone())
            .collect();
        Self::new(owners)
    }

    /// Number of partitions `P`.
    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }

    /// Size of one partition in hash-space units, `2^160 / P`.
    pub fn increment(&self) -> U256 {
        self.increment
    }

    /// All `(start_index, owner)` entries, ordered by hash index.
    pub fn entries(&self) -> Vec<(RingIndex, NodeName)> {
        self.owners
            .iter()
            .enumerate()
            .map(|(i, node)| {
                (
                    keyspace::index_of_partition(PartitionId(i as u32), self.partition_count),
                    node.clone(),
                )
            })
            .collect()
    }

    /// Owner of the given partition. The ID is reduced modulo the partition
    /// count, so wrapped values are accepted.
    pub fn owner(&self, pid: PartitionId) -> &NodeName {
        &self.owners[(pid.0 % self.partition_count) as usize]
    }

    /// `(start_index, owner)` of the given partition.
    pub fn entry(&self, pid: PartitionId) -> (RingIndex, NodeName) {
        let pid = PartitionId(pid.0 % self.partition_count);
        (
            keyspace::index_of_partition(pid, self.partition_count),
            self.owner(pid).clone(),
        )
    }

    /// Partition responsible for the given hash.
    pub fn partition_at(&self, hash: RingIndex) -> PartitionId {
        keyspace::partition_at(hash, self.partition_count)
    }

    /// Owner of the partition containing the given index.
    pub fn index_owner(&self, index: RingIndex) -> &NodeName {
        self.owner(self.partition_at(index))
    }

    /// Distinct node names participating in the ring, sorted.
    pub fn nodes(&self) -> Vec<NodeName> {
        let unique: BTreeSet<&NodeName> = self.owners.iter().collect();
        unique.into_iter().cloned().collect()
    }

    /// Partitions owned by the given node, in partition-ID order.
    pub fn owned_by(&self, node: &NodeName) -> Vec<PartitionId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| *owner == node)
            .map(|(i, _)| PartitionId(i as u32))
            .collect()
    }
}
