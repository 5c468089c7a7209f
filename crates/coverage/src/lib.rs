//! Coverage planning for the partitioned consistent-hash ring.
//!
//! Given a ring of `P` partitions, each replicated to `N` successive owner
//! vnodes, the planner computes a near-minimal set of vnodes whose
//! aggregate responsibility covers every partition at least once, so a
//! fold or query can visit every key exactly once while touching as few
//! nodes as possible.
//!
//! - [`CoveragePlanner`] is the public entry point
//! - [`solver`] implements the greedy set-cover pass with the rotating
//!   tie-breaker
//! - [`AvailabilityOracle`] is the seam to the cluster's node-health
//!   service
//! - [`plan`] holds the shapes handed to callers

pub mod error;
pub mod oracle;
pub mod plan;
pub mod planner;
pub mod request;
pub mod solver;

pub use error::{CoverageError, Result};
pub use oracle::{AllOnline, AvailabilityOracle, StaticOutage};
pub use plan::{
    CoveragePlan, FilterSpec, Plan, SubpartitionEntry, SubpartitionPlan, SubpartitionRef,
    VnodeEntry, VnodeFilter,
};
pub use planner::CoveragePlanner;
pub use request::{CoverageTarget, NvalSpec, VnodeCoverage};
