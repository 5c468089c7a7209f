//! Greedy set-cover solver over the cyclic keyspace.
//!
//! Set cover is NP-hard in general, but the instances here are special:
//! every vnode's keyspace has size `nval`, every partition belongs to
//! exactly `nval` keyspaces, and the keyspaces form a cyclic band around
//! the ring. Greedy selection produces optimal or near-optimal covers for
//! such instances.
//!
//! # Selection order
//!
//! Candidates are ranked by how many still-uncovered partitions they would
//! contribute; ties go to the smaller tiebreaker, where
//! `tiebreaker = (vnode + offset) mod P` and `offset = req_id mod nval`.
//! Rotating the tie key rather than the candidate order keeps each request
//! deterministic while letting successive requests land on different vnode
//! sets, so repeated folds spread load across the cluster.
//!
//! # Multiple coverage
//!
//! For `pvc > 1` the pass is iterated. Each pass sees every vnode's
//! keyspace minus the partitions already credited to that vnode, so a
//! vnode may appear in several passes but never gets credit for the same
//! partition twice.
//!
//! All working sets are ordered containers of partition IDs; iteration
//! order is part of the contract, since plans must be byte-identical across
//! runs for the same inputs.

use ringcore::keyspace::{self, PartitionId};
use std::cmp::Reverse;
use std::collections::BTreeSet;
use tracing::trace;

/// `(vnode, partitions credited to it)`, in plan order.
pub type CoverageResults = Vec<(PartitionId, BTreeSet<PartitionId>)>;

/// A failed solve: what remained uncovered and what was covered anyway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientCoverage {
    pub uncovered: BTreeSet<PartitionId>,
    pub partial: CoverageResults,
}

/// One selectable vnode within a pass.
struct Candidate {
    tiebreaker: u32,
    vnode: PartitionId,
    keyspace: BTreeSet<PartitionId>,
}

/// Number of partitions the two sets share.
pub fn covers(keyspace: &BTreeSet<PartitionId>, uncovered: &BTreeSet<PartitionId>) -> usize {
    keyspace.intersection(uncovered).count()
}

/// Cover every partition `pvc` times using vnodes outside `unavailable`.
///
/// # Arguments
/// * `partition_count` - number of partitions `P` (nonzero power of two)
/// * `nval` - replication factor (positive)
/// * `offset` - rotation of the tie key, `req_id mod nval`
/// * `pvc` - how many distinct vnodes must cover each partition
/// * `unavailable` - vnodes that must not be selected
///
/// # Returns
/// The accumulated `(vnode, partitions)` list, or the uncovered remainder
/// plus the partial coverage when some pass cannot finish. The partial
/// already includes the contributions of earlier successful passes.
pub fn find_coverage(
    partition_count: u32,
    nval: u32,
    offset: u32,
    pvc: u32,
    unavailable: &BTreeSet<PartitionId>,
) -> Result<CoverageResults, InsufficientCoverage> {
    let all: BTreeSet<PartitionId> = (0..partition_count).map(PartitionId).collect();
    let mut results: CoverageResults = Vec::new();
    for pass in 0..pvc {
        let available = candidates(&all, unavailable, nval, offset, partition_count, &results);
        match cover_pass(&all, available) {
            Ok(pass_results) => {
                trace!(pass, vnodes = pass_results.len(), "coverage pass complete");
                merge_results(&mut results, pass_results);
            }
            Err(failure) => {
                let mut partial = results;
                merge_results(&mut partial, failure.partial);
                return Err(InsufficientCoverage {
                    uncovered: failure.uncovered,
                    partial,
                });
            }
        }
    }
    Ok(results)
}

/// Build the candidate list for one pass: every available vnode with the
/// keyspace it could still be credited with.
fn candidates(
    all: &BTreeSet<PartitionId>,
    unavailable: &BTreeSet<PartitionId>,
    nval: u32,
    offset: u32,
    partition_count: u32,
    credited: &CoverageResults,
) -> Vec<Candidate> {
    all.difference(unavailable)
        .map(|&vnode| {
            let mut keyspace = keyspace::n_keyspaces(vnode, nval, partition_count);
            if let Some((_, already)) = credited.iter().find(|(v, _)| *v == vnode) {
                keyspace = keyspace.difference(already).copied().collect();
            }
            let tiebreaker =
                ((u64::from(vnode.0) + u64::from(offset)) % u64::from(partition_count)) as u32;
            Candidate {
                tiebreaker,
                vnode,
                keyspace,
            }
        })
        .collect()
}

/// One greedy pass: select vnodes until every partition is covered or no
/// candidate contributes anything new.
///
/// Successful passes return their coverage sorted by vnode ID; failures
/// report the partial coverage the same way.
fn cover_pass(
    all: &BTreeSet<PartitionId>,
    mut available: Vec<Candidate>,
) -> Result<CoverageResults, InsufficientCoverage> {
    let mut uncovered = all.clone();
    let mut coverage: CoverageResults = Vec::new();
    while !uncovered.is_empty() {
        let chosen = match next_vnode(&available, &uncovered) {
            Some((position, score)) if score > 0 => available.remove(position),
            _ => {
                coverage.sort_by_key(|(vnode, _)| *vnode);
                return Err(InsufficientCoverage {
                    uncovered,
                    partial: coverage,
                });
            }
        };
        let contribution: BTreeSet<PartitionId> =
            uncovered.intersection(&chosen.keyspace).copied().collect();
        uncovered = uncovered.difference(&chosen.keyspace).copied().collect();
        coverage.push((chosen.vnode, contribution));
    }
    coverage.sort_by_key(|(vnode, _)| *vnode);
    Ok(coverage)
}

/// Pick the best candidate: largest contribution to the uncovered set,
/// ties broken by the smaller tiebreaker. Returns its position and score.
fn next_vnode(available: &[Candidate], uncovered: &BTreeSet<PartitionId>) -> Option<(usize, usize)> {
    available
        .iter()
        .enumerate()
        .map(|(position, candidate)| (position, covers(&candidate.keyspace, uncovered)))
        .min_by_key(|&(position, score)| (Reverse(score), available[position].tiebreaker))
}

/// Fold one pass's results into the accumulator: vnodes seen before get
/// their partition sets unioned, new vnodes are prepended in pass order.
fn merge_results(acc: &mut CoverageResults, pass: CoverageResults) {
    for (vnode, partitions) in pass {
        match acc.iter_mut().find(|(v, _)| *v == vnode) {
            Some((_, existing)) => existing.extend(partitions),
            None => acc.insert(0, (vnode, partitions)),
        }
    }
}
