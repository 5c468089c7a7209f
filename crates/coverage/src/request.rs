//! Request descriptors.

use crate::plan::SubpartitionRef;
use ringcore::RingIndex;
use serde::{Deserialize, Serialize};

/// Captured descriptor of one vnode's share of a previously issued plan.
///
/// A caller retrying one element of a plan hands the descriptor back; the
/// planner rebuilds a single-vnode plan from it without consulting the ring
/// or the availability oracle. The retry is routed to the planner's local
/// node, which co-locates with the vnode being retried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VnodeCoverage {
    /// Hash-space index of the originally chosen vnode.
    pub index: RingIndex,
    /// Partition filters the original plan attached to this vnode, if any.
    #[serde(default)]
    pub partition_filters: Vec<RingIndex>,
    /// Subpartition slice, when the original plan was subpartitioned.
    #[serde(default)]
    pub subpartition: Option<SubpartitionRef>,
}

impl VnodeCoverage {
    /// Descriptor for a vnode that served its whole keyspace.
    pub fn new(index: RingIndex) -> Self {
        Self {
            index,
            partition_filters: Vec::new(),
            subpartition: None,
        }
    }

    pub fn with_filters(index: RingIndex, partition_filters: Vec<RingIndex>) -> Self {
        Self {
            index,
            partition_filters,
            subpartition: None,
        }
    }

    pub fn with_subpartition(index: RingIndex, subpartition: SubpartitionRef) -> Self {
        Self {
            index,
            partition_filters: Vec::new(),
            subpartition: Some(subpartition),
        }
    }
}

/// What a plan should target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageTarget {
    /// Cover every partition; fail if the available vnodes cannot.
    All,
    /// Cover what the available vnodes allow; never fail on coverage.
    AllUp,
    /// Rebuild the single-vnode plan described by a captured descriptor.
    Replay(VnodeCoverage),
}

impl CoverageTarget {
    /// Whether partial coverage is acceptable.
    pub fn best_effort(&self) -> bool {
        matches!(self, CoverageTarget::AllUp)
    }
}

/// Replication-factor request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NvalSpec {
    /// Plan against the replica sets of size `nval`.
    Plain(u32),
    /// Split the ring into `count` subpartitions for extra parallelism.
    /// `ring_size` records the partition count the request was computed
    /// against.
    Subpartitioned { nval: u32, ring_size: u32, count: u64 },
}
