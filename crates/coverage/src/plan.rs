//! Public plan shapes.
//!
//! The planner emits one of two shapes: a traditional coverage plan (vnodes
//! plus per-vnode filters) or a subpartitioned plan (one entry per equal
//! bit-range of the ring). Replayed descriptors are rebuilt as one-entry
//! coverage plans.

use primitive_types::U256;
use ringcore::{NodeName, RingIndex};
use serde::{Deserialize, Serialize};

/// One of `2^(160 - bits)` equal bit-ranges of the ring.
///
/// The subpartition with ID `m` is the hash range
/// `[m << bits, (m + 1) << bits)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubpartitionRef {
    /// Subpartition ID.
    pub id: u64,
    /// Number of hash bits below the ID.
    pub bits: u32,
}

impl SubpartitionRef {
    /// First hash in the range.
    pub fn start(&self) -> RingIndex {
        RingIndex::new(U256::from(self.id) << self.bits)
    }

    /// First hash past the range (wraps to zero for the last subpartition).
    pub fn end(&self) -> RingIndex {
        RingIndex::new(U256::from(self.id + 1) << self.bits)
    }

    /// Whether a hash falls inside the range.
    pub fn contains(&self, hash: RingIndex) -> bool {
        (hash.0 >> self.bits) == U256::from(self.id)
    }
}

/// One vnode to visit: its hash-space index and its owning node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnodeEntry {
    pub index: RingIndex,
    pub node: NodeName,
}

/// What a vnode must discard when the plan credits it with less keyspace
/// than it serves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterSpec {
    /// Keep only keys hashing into the partitions with these upper-bound
    /// indices.
    Partitions(Vec<RingIndex>),
    /// Keep only keys hashing into one subpartition.
    Subpartition(SubpartitionRef),
}

/// Filter attached to one plan entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnodeFilter {
    pub index: RingIndex,
    pub spec: FilterSpec,
}

/// Traditional coverage plan.
///
/// `vnodes` lists every vnode to visit; `filters` carries an entry only for
/// vnodes credited with a strict subset of their replica keyspace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveragePlan {
    pub vnodes: Vec<VnodeEntry>,
    pub filters: Vec<VnodeFilter>,
}

impl CoveragePlan {
    /// Filter attached to the vnode at `index`, if any.
    pub fn filter_for(&self, index: RingIndex) -> Option<&FilterSpec> {
        self.filters
            .iter()
            .find(|filter| filter.index == index)
            .map(|filter| &filter.spec)
    }
}

/// One subpartition routed to its resident vnode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubpartitionEntry {
    pub index: RingIndex,
    pub node: NodeName,
    pub subpartition: SubpartitionRef,
}

/// Plan with one entry per subpartition, in subpartition-ID order.
///
/// Entries sharing a vnode are not deduplicated; callers parallelize per
/// subpartition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubpartitionPlan {
    pub entries: Vec<SubpartitionEntry>,
}

/// A computed plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plan {
    Coverage(CoveragePlan),
    Subpartitioned(SubpartitionPlan),
}

impl Plan {
    pub fn as_coverage(&self) -> Option<&CoveragePlan> {
        match self {
            Plan::Coverage(plan) => Some(plan),
            Plan::Subpartitioned(_) => None,
        }
    }

    pub fn as_subpartitioned(&self) -> Option<&SubpartitionPlan> {
        match self {
            Plan::Coverage(_) => None,
            Plan::Subpartitioned(plan) => Some(plan),
        }
    }
}
