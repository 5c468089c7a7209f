//! Subcommands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use coverage::{
    AllOnline, AvailabilityOracle, CoveragePlanner, CoverageTarget, FilterSpec, NvalSpec, Plan,
    StaticOutage,
};
use ringcore::{hash, NodeName, RingManager, RingSnapshot};
use std::sync::Arc;

/// Shared description of the ring to plan against.
#[derive(Debug, Args)]
pub struct RingArgs {
    /// Number of partitions (power of two).
    #[arg(short, long, default_value_t = 64)]
    pub partitions: u32,

    /// Node names, assigned to partitions round-robin.
    #[arg(short, long, value_delimiter = ',', default_value = "node1")]
    pub nodes: Vec<String>,
}

impl RingArgs {
    fn snapshot(&self) -> Result<RingSnapshot> {
        let nodes: Vec<NodeName> = self.nodes.iter().map(|n| NodeName::new(n.as_str())).collect();
        RingSnapshot::uniform(self.partitions, &nodes).context("invalid ring description")
    }

    fn planner(&self, down: &[String]) -> Result<CoveragePlanner> {
        let ring = self.snapshot()?;
        let oracle: Arc<dyn AvailabilityOracle> = if down.is_empty() {
            Arc::new(AllOnline)
        } else {
            Arc::new(StaticOutage::new(
                down.iter().map(|n| NodeName::new(n.as_str())),
            ))
        };
        let local = NodeName::new(self.nodes[0].as_str());
        Ok(CoveragePlanner::new(
            Arc::new(RingManager::new(ring)),
            oracle,
            local,
        ))
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute a coverage plan.
    Plan(PlanArgs),
    /// Compute a subpartitioned plan.
    Subpartitions(SubpartitionsArgs),
    /// Show where a key lands on the ring.
    Locate(LocateArgs),
    /// Summarize ring ownership.
    Describe(DescribeArgs),
}

impl Command {
    pub fn run(self) -> Result<()> {
        match self {
            Command::Plan(args) => args.run(),
            Command::Subpartitions(args) => args.run(),
            Command::Locate(args) => args.run(),
            Command::Describe(args) => args.run(),
        }
    }
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub ring: RingArgs,

    /// Replication factor.
    #[arg(long, default_value_t = 3)]
    pub nval: u32,

    /// Distinct vnodes required per partition.
    #[arg(long, default_value_t = 1)]
    pub pvc: u32,

    /// Request identifier; rotates vnode selection across requests.
    #[arg(long, default_value_t = 0)]
    pub req_id: u64,

    /// Service name handed to the availability oracle.
    #[arg(long, default_value = "kv")]
    pub service: String,

    /// Nodes to treat as down.
    #[arg(long, value_delimiter = ',')]
    pub down: Vec<String>,

    /// Accept partial coverage instead of failing.
    #[arg(long)]
    pub best_effort: bool,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    fn run(self) -> Result<()> {
        let planner = self.ring.planner(&self.down)?;
        let target = if self.best_effort {
            CoverageTarget::AllUp
        } else {
            CoverageTarget::All
        };
        let plan = planner.create_plan(
            &target,
            &NvalSpec::Plain(self.nval),
            self.pvc,
            self.req_id,
            &self.service,
        )?;
        print_plan(&plan, self.json)
    }
}

#[derive(Debug, Args)]
pub struct SubpartitionsArgs {
    #[command(flatten)]
    pub ring: RingArgs,

    /// Replication factor.
    #[arg(long, default_value_t = 3)]
    pub nval: u32,

    /// Number of subpartitions (power of two, at least the partition
    /// count).
    #[arg(long)]
    pub count: u64,

    /// Service name handed to the availability oracle.
    #[arg(long, default_value = "kv")]
    pub service: String,

    /// Print the plan as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SubpartitionsArgs {
    fn run(self) -> Result<()> {
        let planner = self.ring.planner(&[])?;
        let spec = NvalSpec::Subpartitioned {
            nval: self.nval,
            ring_size: self.ring.partitions,
            count: self.count,
        };
        let plan = planner.create_plan(&CoverageTarget::All, &spec, 1, 0, &self.service)?;
        print_plan(&plan, self.json)
    }
}

#[derive(Debug, Args)]
pub struct LocateArgs {
    #[command(flatten)]
    pub ring: RingArgs,

    /// Key to place on the ring.
    #[arg(long)]
    pub key: String,
}

impl LocateArgs {
    fn run(self) -> Result<()> {
        let ring = self.ring.snapshot()?;
        let position = hash::ring_position(self.key.as_bytes());
        let pid = ring.partition_at(position);
        let (index, node) = ring.entry(pid);
        println!("key hashes to {position}");
        println!("partition {pid} (index {index}) owned by {node}");
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub ring: RingArgs,
}

impl DescribeArgs {
    fn run(self) -> Result<()> {
        let ring = self.ring.snapshot()?;
        println!("Ring Description:");
        println!("  Partitions: {}", ring.partition_count());
        println!("  Nodes: {}", ring.nodes().len());
        println!();
        println!("Node Ownership:");
        for node in ring.nodes() {
            let owned = ring.owned_by(&node).len();
            let percentage = owned as f64 / f64::from(ring.partition_count()) * 100.0;
            println!("  {node}: {owned} partitions ({percentage:.2}%)");
        }
        Ok(())
    }
}

fn print_plan(plan: &Plan, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }
    match plan {
        Plan::Coverage(plan) => {
            println!(
                "Coverage plan: {} vnodes, {} filtered",
                plan.vnodes.len(),
                plan.filters.len()
            );
            for entry in &plan.vnodes {
                match plan.filter_for(entry.index) {
                    Some(FilterSpec::Partitions(bounds)) => println!(
                        "  {} @ {} (filtered to {} partitions)",
                        entry.index,
                        entry.node,
                        bounds.len()
                    ),
                    Some(FilterSpec::Subpartition(sub)) => println!(
                        "  {} @ {} (subpartition {} at {} bits)",
                        entry.index, entry.node, sub.id, sub.bits
                    ),
                    None => println!("  {} @ {}", entry.index, entry.node),
                }
            }
        }
        Plan::Subpartitioned(plan) => {
            println!("Subpartitioned plan: {} entries", plan.entries.len());
            for entry in &plan.entries {
                println!(
                    "  #{} -> {} @ {}",
                    entry.subpartition.id, entry.index, entry.node
                );
            }
        }
    }
    Ok(())
}
