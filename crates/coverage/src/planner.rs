//! Plan construction.
//!
//! [`CoveragePlanner`] is the public entry point. It dispatches among the
//! planning modes (replay of a captured descriptor, subpartitioned,
//! normal), captures the ring and availability snapshots once, runs the
//! solver, and assembles the abstract solution into the public plan
//! shapes.
//!
//! Planning is a pure computation over the captured snapshots: no locks
//! are held across it, and concurrent invocations need no coordination.

use crate::error::{CoverageError, Result};
use crate::oracle::AvailabilityOracle;
use crate::plan::{
    CoveragePlan, FilterSpec, Plan, SubpartitionEntry, SubpartitionPlan, SubpartitionRef,
    VnodeEntry, VnodeFilter,
};
use crate::request::{CoverageTarget, NvalSpec, VnodeCoverage};
use crate::solver::{self, CoverageResults};
use ringcore::keyspace::{self, PartitionId};
use ringcore::{NodeName, RingManager, RingSnapshot};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds coverage plans against the currently installed ring.
///
/// `local_node` is the destination for replayed descriptors: retries are
/// issued by the process that observed the failure, which co-locates with
/// the vnode being retried, so the replay is routed locally instead of to
/// the descriptor's original owner.
pub struct CoveragePlanner {
    ring: Arc<RingManager>,
    oracle: Arc<dyn AvailabilityOracle>,
    local_node: NodeName,
}

impl CoveragePlanner {
    pub fn new(
        ring: Arc<RingManager>,
        oracle: Arc<dyn AvailabilityOracle>,
        local_node: NodeName,
    ) -> Self {
        Self {
            ring,
            oracle,
            local_node,
        }
    }

    /// Compute a plan.
    ///
    /// # Arguments
    /// * `target` - full coverage, best-effort coverage, or a replayed
    ///   descriptor
    /// * `nval` - replication factor, optionally with a subpartition count
    /// * `pvc` - distinct vnodes required per partition (capped at `nval`)
    /// * `req_id` - rotation seed so repeated requests spread across vnodes
    /// * `service` - identifier handed to the availability oracle
    pub fn create_plan(
        &self,
        target: &CoverageTarget,
        nval: &NvalSpec,
        pvc: u32,
        req_id: u64,
        service: &str,
    ) -> Result<Plan> {
        match target {
            CoverageTarget::Replay(descriptor) => Ok(self.replay_plan(descriptor)),
            CoverageTarget::All | CoverageTarget::AllUp => match *nval {
                NvalSpec::Subpartitioned {
                    nval,
                    ring_size,
                    count,
                } => self.subpartition_plan(nval, ring_size, count),
                NvalSpec::Plain(nval) => {
                    self.coverage_plan(target.best_effort(), nval, pvc, req_id, service)
                }
            },
        }
    }

    /// Rebuild the one-vnode plan a captured descriptor stands for.
    fn replay_plan(&self, descriptor: &VnodeCoverage) -> Plan {
        let vnodes = vec![VnodeEntry {
            index: descriptor.index,
            node: self.local_node.clone(),
        }];
        let filters = if let Some(subpartition) = descriptor.subpartition {
            vec![VnodeFilter {
                index: descriptor.index,
                spec: FilterSpec::Subpartition(subpartition),
            }]
        } else if descriptor.partition_filters.is_empty() {
            Vec::new()
        } else {
            vec![VnodeFilter {
                index: descriptor.index,
                spec: FilterSpec::Partitions(descriptor.partition_filters.clone()),
            }]
        };
        Plan::Coverage(CoveragePlan { vnodes, filters })
    }

    fn coverage_plan(
        &self,
        best_effort: bool,
        nval: u32,
        pvc: u32,
        req_id: u64,
        service: &str,
    ) -> Result<Plan> {
        if nval == 0 {
            return Err(CoverageError::ZeroReplicationFactor);
        }
        if pvc == 0 {
            return Err(CoverageError::ZeroCoverageFactor);
        }
        let ring = self.ring.current();
        let partition_count = ring.partition_count();
        let offset = (req_id % u64::from(nval)) as u32;
        let pvc = pvc.min(nval);
        let unavailable = self.unavailable_vnodes(service, &ring);
        debug!(
            partitions = partition_count,
            nval,
            pvc,
            offset,
            down = unavailable.len(),
            "planning coverage"
        );

        match solver::find_coverage(partition_count, nval, offset, pvc, &unavailable) {
            Ok(results) => Ok(Plan::Coverage(assemble(&ring, nval, &results))),
            Err(failure) if best_effort => {
                warn!(
                    uncovered = failure.uncovered.len(),
                    "assembling partial coverage plan"
                );
                Ok(Plan::Coverage(assemble(&ring, nval, &failure.partial)))
            }
            Err(_) => Err(CoverageError::InsufficientVnodes),
        }
    }

    /// Vnodes whose owners the oracle reports as down for `service`.
    fn unavailable_vnodes(&self, service: &str, ring: &RingSnapshot) -> BTreeSet<PartitionId> {
        self.oracle
            .offline_owners(service, ring)
            .into_iter()
            .map(|(index, _)| ring.partition_at(index))
            .collect()
    }

    /// Plan with one entry per subpartition, routed to the vnode resident
    /// at each range's start.
    ///
    /// Availability is not consulted here: every subpartition is routed to
    /// its resident vnode even when that node is offline.
    /// TODO: re-target subpartitions of offline vnodes to a fallback
    /// replica once callers can follow such a redirect.
    fn subpartition_plan(&self, nval: u32, ring_size: u32, count: u64) -> Result<Plan> {
        if nval == 0 {
            return Err(CoverageError::ZeroReplicationFactor);
        }
        let ring = self.ring.current();
        let partition_count = ring.partition_count();
        if ring_size != partition_count {
            return Err(CoverageError::RingSizeMismatch {
                requested: ring_size,
                actual: partition_count,
            });
        }
        if !count.is_power_of_two() || count < u64::from(partition_count) {
            return Err(CoverageError::InvalidSubpartitionCount(count));
        }
        let bits = keyspace::data_bits(count);
        debug!(partitions = partition_count, count, bits, "planning subpartitions");

        let entries = (0..count)
            .map(|id| {
                let subpartition = SubpartitionRef { id, bits };
                let (index, node) = ring.entry(ring.partition_at(subpartition.start()));
                SubpartitionEntry {
                    index,
                    node,
                    subpartition,
                }
            })
            .collect();
        Ok(Plan::Subpartitioned(SubpartitionPlan { entries }))
    }
}

/// Convert solver output into the public plan shape.
///
/// Each credited vnode becomes an entry at index `(vnode mod P) * inc`. A
/// vnode credited with a strict subset of its replica keyspace also gets a
/// filter listing the upper-bound index of each credited partition, which
/// tells that vnode to discard keys outside the credited set.
fn assemble(ring: &RingSnapshot, nval: u32, results: &CoverageResults) -> CoveragePlan {
    let partition_count = ring.partition_count();
    let keyspace_size = nval.min(partition_count);
    let mut vnodes = Vec::with_capacity(results.len());
    let mut filters = Vec::new();
    for (vnode, partitions) in results {
        let (index, node) = ring.entry(*vnode);
        vnodes.push(VnodeEntry { index, node });
        if (partitions.len() as u32) < keyspace_size {
            let bounds = partitions
                .iter()
                .map(|pid| keyspace::index_of_partition(PartitionId(pid.0 + 1), partition_count))
                .collect();
            filters.push(VnodeFilter {
                index,
                spec: FilterSpec::Partitions(bounds),
            });
        }
    }
    CoveragePlan { vnodes, filters }
}
