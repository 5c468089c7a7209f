//! Keyspace arithmetic over the 160-bit hash space.
//!
//! The ring is a circular hash space of `2^160` values divided into a
//! power-of-two number of equally sized partitions. This module maps between
//! hash-space indices and partition identifiers and computes the replica
//! keyspaces used by the coverage solver.
//!
//! # Conventions
//!
//! - Partition `i` starts at hash index `i * (2^160 / P)`; the partition
//!   responsible for hash `h` is `floor(h / (2^160 / P))`.
//! - A partition ID also names a ring position by the predecessor convention:
//!   `(i + 1) * (2^160 / P) mod 2^160` is partition `i`'s upper-bound index.
//! - Vnodes are identified by the partition ID of their primary position.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Width of the hash space in bits.
pub const RING_BITS: u32 = 160;

/// Total size of the hash space, `2^160`.
pub fn ring_space() -> U256 {
    U256::one() << RING_BITS
}

/// Identifier of a partition (and of the vnode primarily responsible for
/// it), in `[0, partition_count)`.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PartitionId(pub u32);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in the 160-bit hash space.
///
/// Values are canonicalized modulo `2^160` when built through
/// [`RingIndex::new`]; ring lookups additionally reduce derived partition
/// IDs modulo the partition count, so out-of-range values cannot escape the
/// ring.
#[derive(
    Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RingIndex(pub U256);

impl RingIndex {
    /// Construct an index, wrapping around the top of the hash space.
    pub fn new(value: U256) -> Self {
        Self(value % ring_space())
    }

    /// The zero position.
    pub fn zero() -> Self {
        Self(U256::zero())
    }
}

impl fmt::Display for RingIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for RingIndex {
    fn from(value: U256) -> Self {
        Self::new(value)
    }
}

/// Size of one partition in hash-space units, `2^160 / P`.
///
/// `partition_count` must be a nonzero power of two.
pub fn ring_increment(partition_count: u32) -> U256 {
    ring_space() / U256::from(partition_count)
}

/// Hash-space index at which partition `pid` starts.
///
/// The partition ID is reduced modulo `partition_count` first, so callers
/// may pass wrapped values such as `(pid + 1)` for upper-bound indices.
pub fn index_of_partition(pid: PartitionId, partition_count: u32) -> RingIndex {
    let pid = pid.0 % partition_count;
    RingIndex::new(U256::from(pid) * ring_increment(partition_count))
}

/// Partition responsible for the given hash.
pub fn partition_at(hash: RingIndex, partition_count: u32) -> PartitionId {
    let slot = hash.0 % ring_space() / ring_increment(partition_count);
    PartitionId(slot.low_u64() as u32)
}

/// The replica keyspace of a vnode: the set of partition IDs for which the
/// vnode at position `vnode` is one of the `nval` successor owners.
///
/// For `vnode = v` this is `{(v - nval + k) mod P : 0 <= k < nval}`. The
/// result is a sorted set, so `nval > P` collapses to the full ring and the
/// cardinality is always `min(nval, P)`.
pub fn n_keyspaces(vnode: PartitionId, nval: u32, partition_count: u32) -> BTreeSet<PartitionId> {
    let p = i64::from(partition_count);
    (0..nval)
        .map(|k| {
            let pid = (i64::from(vnode.0) - i64::from(nval) + i64::from(k)).rem_euclid(p);
            PartitionId(pid as u32)
        })
        .collect()
}

/// Number of hash bits below the subpartition ID when the ring is split into
/// `count` equal ranges: `160 - log2(count)`.
///
/// `count` must be a nonzero power of two.
pub fn data_bits(count: u64) -> u32 {
    RING_BITS - count.trailing_zeros()
}
