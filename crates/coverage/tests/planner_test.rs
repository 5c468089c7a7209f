//! End-to-end tests for the coverage planner.
//!
//! # Test Strategy
//!
//! 1. **Known-good plans**: byte-exact expectations on small rings
//! 2. **Degraded clusters**: partial coverage and hard failures
//! 3. **Multiple coverage**: pvc up to the replication factor
//! 4. **Subpartitioned plans**: sizing, routing, validation
//! 5. **Replay**: rebuilding one-vnode plans from captured descriptors

use coverage::{
    AllOnline, AvailabilityOracle, CoverageError, CoveragePlan, CoveragePlanner, CoverageTarget,
    FilterSpec, NvalSpec, Plan, StaticOutage, SubpartitionRef, VnodeCoverage,
};
use primitive_types::U256;
use ringcore::keyspace::{self, PartitionId};
use ringcore::{NodeName, RingIndex, RingManager, RingSnapshot};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

fn planner_for(
    ring: RingSnapshot,
    oracle: impl AvailabilityOracle + 'static,
    local: &str,
) -> CoveragePlanner {
    CoveragePlanner::new(
        Arc::new(RingManager::new(ring)),
        Arc::new(oracle),
        NodeName::new(local),
    )
}

fn single_node_ring(partitions: u32) -> RingSnapshot {
    RingSnapshot::uniform(partitions, &[NodeName::new("node1")]).unwrap()
}

fn index_at(pid: u32, partitions: u32) -> RingIndex {
    keyspace::index_of_partition(PartitionId(pid), partitions)
}

fn dec(value: &str) -> RingIndex {
    RingIndex(U256::from_dec_str(value).unwrap())
}

/// Reconstruct which partitions each plan entry is credited with: entries
/// without a filter serve their whole replica keyspace, filtered entries
/// serve exactly the partitions behind the filter hashes.
fn credited(plan: &CoveragePlan, partitions: u32, nval: u32) -> BTreeMap<u32, BTreeSet<u32>> {
    let inc = keyspace::ring_increment(partitions);
    let mut result = BTreeMap::new();
    for entry in &plan.vnodes {
        let vnode = (entry.index.0 / inc).low_u64() as u32;
        let parts: BTreeSet<u32> = match plan.filter_for(entry.index) {
            Some(FilterSpec::Partitions(bounds)) => bounds
                .iter()
                .map(|bound| {
                    let upper = (bound.0 / inc).low_u64() as u32;
                    (upper + partitions - 1) % partitions
                })
                .collect(),
            Some(FilterSpec::Subpartition(_)) => panic!("unexpected subpartition filter"),
            None => keyspace::n_keyspaces(PartitionId(vnode), nval, partitions)
                .into_iter()
                .map(|p| p.0)
                .collect(),
        };
        result.entry(vnode).or_insert_with(BTreeSet::new).extend(parts);
    }
    result
}

fn coverage_counts(plan: &CoveragePlan, partitions: u32, nval: u32) -> Vec<u32> {
    let mut counts = vec![0u32; partitions as usize];
    for (_, parts) in credited(plan, partitions, nval) {
        for p in parts {
            counts[p as usize] += 1;
        }
    }
    counts
}

// ============================================================================
// Known-Good Plans
// ============================================================================

#[test]
fn test_basic_plan_single_node_ring() {
    // 8 partitions, nval 3, pvc 1, req_id 1234: the planner needs three
    // vnodes and must filter the one credited with less than a full
    // replica keyspace.
    let planner = planner_for(single_node_ring(8), AllOnline, "node1");
    let plan = planner
        .create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 1, 1234, "kv")
        .unwrap();

    let plan = plan.as_coverage().expect("traditional plan");
    let indices: Vec<RingIndex> = plan.vnodes.iter().map(|v| v.index).collect();
    assert_eq!(
        indices,
        vec![
            dec("1278813932664540053428224228626747642198940975104"),
            dec("730750818665451459101842416358141509827966271488"),
            dec("365375409332725729550921208179070754913983135744"),
        ]
    );
    assert!(plan.vnodes.iter().all(|v| v.node == NodeName::new("node1")));

    assert_eq!(plan.filters.len(), 1);
    assert_eq!(plan.filters[0].index, indices[1]);
    assert_eq!(
        plan.filters[0].spec,
        FilterSpec::Partitions(vec![
            dec("548063113999088594326381812268606132370974703616"),
            dec("730750818665451459101842416358141509827966271488"),
        ])
    );
}

#[test]
fn test_plan_covers_every_partition() {
    for partitions in [8u32, 16, 64] {
        for nval in [1u32, 2, 3, 5] {
            let nodes: Vec<NodeName> = (1..=4).map(|i| NodeName::new(format!("n{i}"))).collect();
            let ring = RingSnapshot::uniform(partitions, &nodes).unwrap();
            let planner = planner_for(ring, AllOnline, "n1");
            let plan = planner
                .create_plan(&CoverageTarget::All, &NvalSpec::Plain(nval), 1, 7, "kv")
                .unwrap();
            let plan = plan.as_coverage().unwrap();

            let counts = coverage_counts(plan, partitions, nval);
            assert!(
                counts.iter().all(|&c| c == 1),
                "partitions={partitions} nval={nval}: counts {counts:?}"
            );

            // Size bound: between ceil(P/N) and P vnodes.
            let minimum = (partitions + nval - 1) / nval;
            assert!(plan.vnodes.len() as u32 >= minimum);
            assert!(plan.vnodes.len() as u32 <= partitions);
        }
    }
}

#[test]
fn test_filters_mark_strict_subsets_only() {
    let planner = planner_for(single_node_ring(16), AllOnline, "node1");
    let plan = planner
        .create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 1, 99, "kv")
        .unwrap();
    let plan = plan.as_coverage().unwrap();
    let inc = keyspace::ring_increment(16);

    for entry in &plan.vnodes {
        match plan.filter_for(entry.index) {
            Some(FilterSpec::Partitions(bounds)) => {
                // A filtered vnode is credited with fewer partitions than
                // its replica keyspace holds, and every bound sits on a
                // partition boundary.
                assert!(bounds.len() < 3);
                assert!(!bounds.is_empty());
                assert!(bounds.iter().all(|b| (b.0 % inc).is_zero()));
            }
            Some(FilterSpec::Subpartition(_)) => panic!("unexpected subpartition filter"),
            None => {}
        }
    }
}

// ============================================================================
// Determinism and Rotation
// ============================================================================

#[test]
fn test_same_request_same_plan() {
    let make = || {
        let nodes: Vec<NodeName> = (1..=3).map(|i| NodeName::new(format!("n{i}"))).collect();
        let ring = RingSnapshot::uniform(64, &nodes).unwrap();
        planner_for(ring, AllOnline, "n1")
            .create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 2, 4242, "kv")
            .unwrap()
    };
    assert_eq!(make(), make());
}

#[test]
fn test_req_id_rotates_vnode_selection() {
    // nval divides the ring evenly, so rotating the request ID shifts the
    // whole selected set.
    let plan_for = |req_id: u64| {
        let planner = planner_for(single_node_ring(8), AllOnline, "node1");
        let plan = planner
            .create_plan(&CoverageTarget::All, &NvalSpec::Plain(4), 1, req_id, "kv")
            .unwrap();
        plan.as_coverage().unwrap().clone()
    };

    // Congruent request IDs produce identical plans.
    assert_eq!(plan_for(1), plan_for(5));
    // Incongruent ones select different vnode sets.
    let vnodes = |plan: &CoveragePlan| -> BTreeSet<RingIndex> {
        plan.vnodes.iter().map(|v| v.index).collect()
    };
    assert_ne!(vnodes(&plan_for(0)), vnodes(&plan_for(1)));
}

// ============================================================================
// Degraded Clusters
// ============================================================================

/// Ring whose partitions 0..=5 belong to a down node and 6..=7 to a live
/// one.
fn degraded_ring() -> (RingSnapshot, StaticOutage) {
    let owners: Vec<NodeName> = (0..8)
        .map(|p| {
            if p < 6 {
                NodeName::new("down")
            } else {
                NodeName::new("up")
            }
        })
        .collect();
    let ring = RingSnapshot::new(owners).unwrap();
    let outage = StaticOutage::new([NodeName::new("down")]);
    (ring, outage)
}

#[test]
fn test_insufficient_vnodes_with_all() {
    let (ring, outage) = degraded_ring();
    let planner = planner_for(ring, outage, "up");
    let result = planner.create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 1, 0, "kv");
    assert_eq!(result, Err(CoverageError::InsufficientVnodes));
}

#[test]
fn test_partial_plan_with_allup() {
    let (ring, outage) = degraded_ring();
    let planner = planner_for(ring, outage, "up");
    let plan = planner
        .create_plan(&CoverageTarget::AllUp, &NvalSpec::Plain(3), 1, 0, "kv")
        .unwrap();
    let plan = plan.as_coverage().unwrap();

    // Only the two live vnodes are listed, and only the partitions they
    // can reach (3..=6) are covered.
    let indices: Vec<RingIndex> = plan.vnodes.iter().map(|v| v.index).collect();
    assert_eq!(indices, vec![index_at(7, 8), index_at(6, 8)]);
    assert!(plan.vnodes.iter().all(|v| v.node == NodeName::new("up")));

    let covered: BTreeSet<u32> = credited(plan, 8, 3)
        .into_values()
        .flatten()
        .collect();
    assert_eq!(covered, BTreeSet::from([3, 4, 5, 6]));

    // Vnode 7 reaches only partition 6, so it carries a filter; vnode 6
    // serves its whole keyspace.
    assert_eq!(plan.filters.len(), 1);
    assert_eq!(plan.filters[0].index, index_at(7, 8));
    assert_eq!(
        plan.filters[0].spec,
        FilterSpec::Partitions(vec![index_at(7, 8)])
    );
}

// ============================================================================
// Multiple Coverage (pvc)
// ============================================================================

#[test]
fn test_pvc_equal_to_nval_uses_every_vnode() {
    let planner = planner_for(single_node_ring(8), AllOnline, "node1");
    let plan = planner
        .create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 3, 11, "kv")
        .unwrap();
    let plan = plan.as_coverage().unwrap();

    // Demand equals capacity: all 8 vnodes participate and every
    // partition is covered exactly three times.
    assert_eq!(plan.vnodes.len(), 8);
    let counts = coverage_counts(plan, 8, 3);
    assert!(counts.iter().all(|&c| c == 3));
}

#[test]
fn test_pvc_capped_at_nval() {
    let planner = planner_for(single_node_ring(8), AllOnline, "node1");
    let capped = planner
        .create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 9, 11, "kv")
        .unwrap();
    let exact = planner
        .create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 3, 11, "kv")
        .unwrap();
    assert_eq!(capped, exact);
}

// ============================================================================
// Subpartitioned Plans
// ============================================================================

#[test]
fn test_subpartition_plan_shape() {
    let nodes: Vec<NodeName> = (1..=2).map(|i| NodeName::new(format!("n{i}"))).collect();
    let ring = RingSnapshot::uniform(8, &nodes).unwrap();
    let expected_ring = ring.clone();
    let planner = planner_for(ring, AllOnline, "n1");
    let plan = planner
        .create_plan(
            &CoverageTarget::All,
            &NvalSpec::Subpartitioned {
                nval: 3,
                ring_size: 8,
                count: 32,
            },
            1,
            0,
            "kv",
        )
        .unwrap();
    let plan = plan.as_subpartitioned().expect("subpartitioned plan");

    assert_eq!(plan.entries.len(), 32);
    for (m, entry) in plan.entries.iter().enumerate() {
        let m = m as u64;
        assert_eq!(entry.subpartition, SubpartitionRef { id: m, bits: 155 });
        // Four subpartitions per partition: subpartition m lives in
        // partition m / 4 and is routed to that partition's vnode.
        let pid = PartitionId((m / 4) as u32);
        assert_eq!(entry.index, index_at(pid.0, 8));
        assert_eq!(entry.node, *expected_ring.owner(pid));
    }
}

#[test]
fn test_subpartition_plan_ignores_availability() {
    let (ring, outage) = degraded_ring();
    let planner = planner_for(ring, outage, "up");
    let plan = planner
        .create_plan(
            &CoverageTarget::All,
            &NvalSpec::Subpartitioned {
                nval: 3,
                ring_size: 8,
                count: 16,
            },
            1,
            0,
            "kv",
        )
        .unwrap();
    let plan = plan.as_subpartitioned().unwrap();
    // Down owners are still routed to.
    assert!(plan
        .entries
        .iter()
        .any(|entry| entry.node == NodeName::new("down")));
}

#[test]
fn test_subpartition_count_validation() {
    let planner = planner_for(single_node_ring(8), AllOnline, "node1");
    let subpartitioned = |count: u64| NvalSpec::Subpartitioned {
        nval: 3,
        ring_size: 8,
        count,
    };

    assert_eq!(
        planner.create_plan(&CoverageTarget::All, &subpartitioned(12), 1, 0, "kv"),
        Err(CoverageError::InvalidSubpartitionCount(12))
    );
    assert_eq!(
        planner.create_plan(&CoverageTarget::All, &subpartitioned(4), 1, 0, "kv"),
        Err(CoverageError::InvalidSubpartitionCount(4))
    );
    // count == partition_count is the degenerate but valid floor.
    assert!(planner
        .create_plan(&CoverageTarget::All, &subpartitioned(8), 1, 0, "kv")
        .is_ok());
}

#[test]
fn test_subpartition_ring_size_mismatch() {
    let planner = planner_for(single_node_ring(16), AllOnline, "node1");
    let result = planner.create_plan(
        &CoverageTarget::All,
        &NvalSpec::Subpartitioned {
            nval: 3,
            ring_size: 8,
            count: 32,
        },
        1,
        0,
        "kv",
    );
    assert_eq!(
        result,
        Err(CoverageError::RingSizeMismatch {
            requested: 8,
            actual: 16
        })
    );
}

// ============================================================================
// Replay
// ============================================================================

#[test]
fn test_replay_plain_descriptor() {
    let planner = planner_for(single_node_ring(8), AllOnline, "local");
    let descriptor = VnodeCoverage::new(index_at(5, 8));
    let plan = planner
        .create_plan(
            &CoverageTarget::Replay(descriptor),
            &NvalSpec::Plain(3),
            1,
            0,
            "kv",
        )
        .unwrap();
    let plan = plan.as_coverage().unwrap();

    assert_eq!(plan.vnodes.len(), 1);
    assert_eq!(plan.vnodes[0].index, index_at(5, 8));
    // Replays are routed to the local node, not the original owner.
    assert_eq!(plan.vnodes[0].node, NodeName::new("local"));
    assert!(plan.filters.is_empty());
}

#[test]
fn test_replay_carries_partition_filters() {
    let planner = planner_for(single_node_ring(8), AllOnline, "local");
    let filters = vec![index_at(3, 8), index_at(4, 8)];
    let descriptor = VnodeCoverage::with_filters(index_at(4, 8), filters.clone());
    let plan = planner
        .create_plan(
            &CoverageTarget::Replay(descriptor),
            &NvalSpec::Plain(3),
            1,
            0,
            "kv",
        )
        .unwrap();
    let plan = plan.as_coverage().unwrap();

    assert_eq!(plan.vnodes.len(), 1);
    assert_eq!(plan.filters.len(), 1);
    assert_eq!(plan.filters[0].index, index_at(4, 8));
    assert_eq!(plan.filters[0].spec, FilterSpec::Partitions(filters));
}

#[test]
fn test_replay_carries_subpartition() {
    let planner = planner_for(single_node_ring(8), AllOnline, "local");
    let slice = SubpartitionRef { id: 9, bits: 155 };
    let descriptor = VnodeCoverage::with_subpartition(index_at(2, 8), slice);
    let plan = planner
        .create_plan(
            &CoverageTarget::Replay(descriptor),
            &NvalSpec::Plain(3),
            1,
            0,
            "kv",
        )
        .unwrap();
    let plan = plan.as_coverage().unwrap();

    assert_eq!(plan.vnodes.len(), 1);
    assert_eq!(plan.filters.len(), 1);
    assert_eq!(plan.filters[0].spec, FilterSpec::Subpartition(slice));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_rejects_zero_arguments() {
    let planner = planner_for(single_node_ring(8), AllOnline, "node1");
    assert_eq!(
        planner.create_plan(&CoverageTarget::All, &NvalSpec::Plain(0), 1, 0, "kv"),
        Err(CoverageError::ZeroReplicationFactor)
    );
    assert_eq!(
        planner.create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 0, 0, "kv"),
        Err(CoverageError::ZeroCoverageFactor)
    );
}

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_plan_round_trips_through_json() {
    let planner = planner_for(single_node_ring(8), AllOnline, "node1");
    let plan = planner
        .create_plan(&CoverageTarget::All, &NvalSpec::Plain(3), 1, 1234, "kv")
        .unwrap();

    let encoded = serde_json::to_string(&plan).unwrap();
    let decoded: Plan = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, plan);
}
