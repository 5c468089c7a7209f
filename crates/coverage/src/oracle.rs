//! Node-availability seam.
//!
//! Liveness discovery belongs to the cluster's health service; the planner
//! only consumes its answer through this trait, once per plan.

use ringcore::{NodeName, RingIndex, RingSnapshot};
use std::collections::BTreeSet;

/// Reports which vnodes are currently unavailable for a service.
///
/// Implementations must be thread-safe: one oracle is shared by every
/// planner invocation.
pub trait AvailabilityOracle: Send + Sync {
    /// `(start_index, owner)` of every partition whose owner is down for
    /// `service`.
    fn offline_owners(&self, service: &str, ring: &RingSnapshot) -> Vec<(RingIndex, NodeName)>;
}

/// Oracle that reports every node as up.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllOnline;

impl AvailabilityOracle for AllOnline {
    fn offline_owners(&self, _service: &str, _ring: &RingSnapshot) -> Vec<(RingIndex, NodeName)> {
        Vec::new()
    }
}

/// Oracle backed by a fixed set of down nodes.
///
/// Useful in tests and tooling where the outage is known up front.
#[derive(Debug, Clone, Default)]
pub struct StaticOutage {
    down: BTreeSet<NodeName>,
}

impl StaticOutage {
    pub fn new(down: impl IntoIterator<Item = NodeName>) -> Self {
        Self {
            down: down.into_iter().collect(),
        }
    }

    pub fn is_down(&self, node: &NodeName) -> bool {
        self.down.contains(node)
    }
}

impl AvailabilityOracle for StaticOutage {
    fn offline_owners(&self, _service: &str, ring: &RingSnapshot) -> Vec<(RingIndex, NodeName)> {
        ring.entries()
            .into_iter()
            .filter(|(_, node)| self.down.contains(node))
            .collect()
    }
}
